//! Document text extraction
//!
//! Turns a source document into normalized plain text:
//! - PDF files via `pdf-extract`
//! - Markdown files via `pulldown-cmark`, one paragraph per block element
//! - Anything else is read as UTF-8 text
//!
//! Paragraph boundaries survive extraction as a single blank line, which is
//! what card generation splits on.

pub mod markdown;
pub mod pdf;

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

/// Kind of source document, decided by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Markdown,
    PlainText,
}

impl DocumentKind {
    /// Detect the document kind from a path
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "pdf" => DocumentKind::Pdf,
            "md" | "markdown" | "mdx" => DocumentKind::Markdown,
            _ => DocumentKind::PlainText,
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Pdf => write!(f, "pdf"),
            DocumentKind::Markdown => write!(f, "markdown"),
            DocumentKind::PlainText => write!(f, "text"),
        }
    }
}

/// Extract normalized text from a document
pub fn extract<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();
    let kind = DocumentKind::from_path(path);

    let raw = match kind {
        DocumentKind::Pdf => pdf::extract_text(path)?,
        DocumentKind::Markdown => {
            let content = read_text(path)?;
            markdown::to_plain_text(&content)
        }
        DocumentKind::PlainText => read_text(path)?,
    };

    let text = normalize(&raw);
    debug!(
        ?path,
        %kind,
        chars = text.chars().count(),
        "Extracted document text"
    );
    Ok(text)
}

fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))
}

/// Trim every line and collapse runs of blank lines into one
pub fn normalize(text: &str) -> String {
    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }

    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}
