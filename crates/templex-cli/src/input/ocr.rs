//! Image OCR backend wrapping the tesseract executable.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, bail};
use tracing::debug;

/// Extract text from a raster image by running `tesseract <file> stdout`.
pub fn to_text(path: &Path) -> anyhow::Result<String> {
    let output = match Command::new("tesseract").arg(path).arg("stdout").output() {
        Ok(output) => output,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            bail!("tesseract not installed")
        }
        Err(err) => return Err(err).context("failed to run tesseract"),
    };

    if !output.status.success() {
        bail!(
            "tesseract failed on {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let text = String::from_utf8(output.stdout).context("tesseract produced invalid UTF-8")?;
    debug!("OCR produced {} characters from {}", text.len(), path.display());
    Ok(text)
}
