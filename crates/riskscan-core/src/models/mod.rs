//! Data models for statement extraction.

pub mod config;
pub mod fields;
pub mod outcome;

pub use fields::{CanonicalFields, FieldName, FieldValue, Quantity, StatementPeriod};
pub use outcome::{BatchEntry, DetectedFormat, Dialect, ExtractionOutcome};
pub use config::{BatchConfig, ExtractionConfig, PdfConfig, RiskscanConfig};
