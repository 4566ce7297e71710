//! PDF text extraction.
//!
//! Pages are read one at a time through [`lopdf`], so a huge document only
//! costs as much as the first [`PDF_MAX_PAGES`] pages.

use lopdf::Document;

use crate::config::PDF_MAX_PAGES;
use crate::models::PdfExtraction;
use crate::services::error::ExtractError;
use crate::utils::text::normalize;

/// Pages with more words than this are treated as body content.
const SUGGESTED_START_MIN_WORDS: usize = 100;

/// Extract cleaned per-page text from PDF bytes.
pub fn extract_pdf(data: &[u8]) -> Result<PdfExtraction, ExtractError> {
    let document =
        Document::load_mem(data).map_err(|e| ExtractError::CorruptedPdf(e.to_string()))?;

    let page_numbers: Vec<u32> = document.get_pages().keys().copied().collect();
    let total_pages = page_numbers.len();

    let pages: Vec<String> = page_numbers
        .iter()
        .take(PDF_MAX_PAGES)
        .map(|&number| normalize(&page_text(&document, number)))
        .collect();

    let suggested_start_page = suggest_start_page(&pages);
    tracing::info!(
        total_pages,
        extracted_pages = pages.len(),
        suggested_start_page,
        "Extracted PDF"
    );

    Ok(PdfExtraction {
        total_pages,
        extracted_pages: pages.len(),
        truncated: total_pages > PDF_MAX_PAGES,
        pages,
        suggested_start_page,
    })
}

// Fonts lopdf cannot decode should not sink the whole upload; such pages
// come back empty just like image-only pages do.
fn page_text(document: &Document, number: u32) -> String {
    match document.extract_text(&[number]) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(page = number, error = %e, "Could not extract page text");
            String::new()
        }
    }
}

/// 1-based index of the first page that looks like body text, or 1.
pub fn suggest_start_page(pages: &[String]) -> usize {
    pages
        .iter()
        .position(|page| page.split_whitespace().count() > SUGGESTED_START_MIN_WORDS)
        .map_or(1, |idx| idx + 1)
}
