//! Core library for merchant statement field extraction.
//!
//! This crate provides:
//! - PDF line reconstruction from positioned content-stream text
//! - Statement layout detection and per-layout section parsing
//! - Generic keyword extraction for unrecognized layouts
//! - CSV export mapping and a fill-in template
//! - Batch processing with chronological ordering
//!
//! Every numeric field is tri-state ([`FieldValue`]): a value that was not
//! found is never silently read as zero.

pub mod error;
pub mod models;
pub mod pdf;
pub mod statement;

pub use error::{PdfError, Result, RiskscanError};
pub use models::{
    BatchEntry, CanonicalFields, DetectedFormat, Dialect, ExtractionOutcome, FieldName, FieldValue,
    RiskscanConfig, StatementPeriod,
};
pub use pdf::{Lines, PdfExtractor, PdfProcessor, TextRun};
pub use statement::{
    csv_template, BatchAggregator, CsvColumnMapper, FormatDetector, GenericExtractor, StatementEngine,
    StatementFile,
};

/// Extract fields from PDF bytes with the default configuration.
pub fn extract_pdf(bytes: &[u8]) -> Result<ExtractionOutcome> {
    StatementEngine::default().extract_pdf(bytes)
}

/// Extract fields from CSV bytes with the default configuration.
pub fn extract_csv(bytes: &[u8]) -> Result<ExtractionOutcome> {
    StatementEngine::default().extract_csv(bytes)
}

/// Extract a batch of files with the default configuration. Never fails as
/// a whole; per-file problems are reported on the entries.
pub fn extract_batch(files: Vec<StatementFile>) -> Vec<BatchEntry> {
    BatchAggregator::default().run(files)
}
