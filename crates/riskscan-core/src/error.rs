//! Error types for the riskscan-core library.

use thiserror::Error;

/// Main error type for the riskscan library.
///
/// Only decode-level problems are errors. A field that cannot be found is
/// recorded as [`FieldValue::NotFound`](crate::FieldValue::NotFound) plus a
/// warning and never surfaces here.
#[derive(Error, Debug)]
pub enum RiskscanError {
    /// PDF decoding error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// Malformed CSV input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The file is neither a CSV export nor a PDF.
    #[error("unsupported input type: {0}")]
    UnsupportedInput(String),

    /// Extraction of a single batch member exceeded its time budget.
    #[error("{filename}: extraction timed out after {secs}s")]
    Timeout { filename: String, secs: u64 },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF decoding.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Result type for the riskscan library.
pub type Result<T> = std::result::Result<T, RiskscanError>;
