//! PDF rendering into pages of text fragments.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;
use crate::models::activity::Page;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Extract text from a specific page (1-indexed).
    fn extract_page_text(&self, page: u32) -> Result<String>;

    /// Render every page as trimmed, non-empty fragments.
    fn pages(&self) -> Result<Vec<Page>> {
        let count = self.page_count();
        if count == 0 {
            return Err(PdfError::NoPages);
        }

        (1..=count)
            .map(|page| self.extract_page_text(page).map(|text| text_to_page(&text)))
            .collect()
    }
}

/// Split extracted text into trimmed lines, dropping blank ones.
pub fn text_to_page(text: &str) -> Page {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Load PDF bytes and render all pages.
pub fn render_pages(data: &[u8]) -> Result<Vec<Page>> {
    let mut extractor = PdfExtractor::new();
    extractor.load(data)?;
    extractor.pages()
}
