//! PDF processing module.

mod extractor;
mod lines;

pub use extractor::{PdfExtractor, PdfLines};
pub use lines::{collapse_whitespace, reconstruct, reconstruct_page, Lines};

use serde::{Deserialize, Serialize};

use crate::error::PdfError;

/// A positioned piece of text from a page's content stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// Horizontal origin in page space.
    pub x: f32,
    /// Vertical origin in page space (grows upwards).
    pub y: f32,
    /// Decoded text.
    pub text: String,
}

impl TextRun {
    pub fn new(x: f32, y: f32, text: impl Into<String>) -> Self {
        Self {
            x,
            y,
            text: text.into(),
        }
    }
}

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;

/// Trait for PDF processing implementations.
pub trait PdfProcessor {
    /// Load a PDF from bytes.
    fn load(&mut self, data: &[u8]) -> Result<()>;

    /// Get the number of pages in the PDF.
    fn page_count(&self) -> u32;

    /// Positioned text runs of a page (1-indexed).
    fn extract_runs(&self, page: u32) -> Result<Vec<TextRun>>;

    /// Flat text of the whole document, without positions.
    fn extract_text(&self) -> Result<String>;
}
