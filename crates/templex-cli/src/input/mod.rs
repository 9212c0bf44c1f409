//! Text acquisition backends, selected by file extension.

mod ocr;
mod pdf;

use std::fs;
use std::path::Path;

use anyhow::{Context, bail};

/// Extract raw text from a document file.
///
/// Dispatch is by extension: PDFs go through the embedded-text
/// extractor, raster images through the tesseract backend, and `.txt`
/// files are read as-is.
pub fn to_text(path: &Path) -> anyhow::Result<String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => pdf::to_text(path),
        "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" => ocr::to_text(path),
        "txt" => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => bail!("unsupported file format: {extension:?}"),
    }
}

/// Whether a file extension is one of the supported input formats.
pub fn is_supported(path: &Path) -> bool {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();
    matches!(
        extension.as_str(),
        "pdf" | "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" | "txt"
    )
}
