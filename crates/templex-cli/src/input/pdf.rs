//! PDF text extraction backend.

use std::path::Path;

use tracing::debug;

/// Extract embedded text from a PDF file.
pub fn to_text(path: &Path) -> anyhow::Result<String> {
    let text = pdf_extract::extract_text(path)
        .map_err(|err| anyhow::anyhow!("failed to extract text from {}: {err}", path.display()))?;
    debug!("extracted {} characters from {}", text.len(), path.display());
    Ok(text)
}
