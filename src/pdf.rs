//! PDF text extraction.
//!
//! Text is pulled out with `pdf-extract`, which separates pages with a form
//! feed. Pages without extractable text (scanned images, blank pages) simply
//! contribute nothing; only a document that cannot be parsed at all is an
//! error.

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::RingkasError;
use crate::model::ExtractedText;

/// Page separator emitted by `pdf-extract`
const PAGE_BREAK: char = '\x0c';

/// Extract the text of a PDF held in memory.
pub fn extract_text(bytes: &[u8]) -> Result<ExtractedText, RingkasError> {
    let pages = extract_pages(bytes)?;
    let extracted = ExtractedText::from_pages(&pages);

    debug!(
        pages = extracted.page_count,
        blank_pages = extracted.blank_pages,
        chars = extracted.char_len(),
        "extracted PDF text"
    );

    Ok(extracted)
}

/// Extract the text of a PDF file.
pub fn extract_file(path: impl AsRef<Path>) -> Result<ExtractedText, RingkasError> {
    let bytes = fs::read(path.as_ref())?;
    extract_text(&bytes)
}

fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, RingkasError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| RingkasError::Extraction(e.to_string()))?;

    let mut pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();

    // Text after the final separator is not a page of its own.
    if pages.len() > 1 && pages.last().is_some_and(|p| p.trim().is_empty()) {
        pages.pop();
    }

    Ok(pages)
}
