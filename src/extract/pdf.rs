//! PDF text extraction

use anyhow::{anyhow, Result};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

/// Extract the text layer of a PDF file
///
/// `pdf-extract` panics on some malformed documents; those panics are turned
/// into errors like any other extraction failure.
pub fn extract_text(path: &Path) -> Result<String> {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text(path)));

    match outcome {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(anyhow!("Failed to extract text from {:?}: {}", path, e)),
        Err(_) => Err(anyhow!("PDF parser crashed while reading {:?}", path)),
    }
}
