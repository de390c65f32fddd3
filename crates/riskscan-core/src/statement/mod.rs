//! Statement field extraction.

pub mod batch;
pub mod csv_mapper;
pub mod detect;
pub mod dialects;
pub mod engine;
pub mod generic;
pub mod rows;
pub mod rules;

pub use batch::{sort_chronologically, BatchAggregator, ProgressHook, StatementFile};
pub use csv_mapper::{csv_template, normalize_header, parse_csv, CsvColumnMapper, CsvMapping};
pub use detect::FormatDetector;
pub use dialects::{extractor_for, DialectExtractor, DialectOutcome};
pub use engine::{InputKind, StatementEngine};
pub use generic::GenericExtractor;
pub use rules::{extract_period, period_from_filename};
