//! Extraction outcomes, detected formats, and batch entries.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::fields::{CanonicalFields, StatementPeriod};

/// A recognizable statement-issuer layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dialect {
    /// "Summary by card type" layout with a chargebacks/reversals section.
    CardTypeSummary,
    /// Plan-code summary layout with activity, chargeback and fraud sections.
    PlanSummary,
}

impl Dialect {
    /// All known dialects.
    pub const ALL: [Dialect; 2] = [Dialect::CardTypeSummary, Dialect::PlanSummary];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Dialect::CardTypeSummary => "card-type summary",
            Dialect::PlanSummary => "plan summary",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which layout produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectedFormat {
    /// Header markers matched a known dialect.
    Known { dialect: Dialect },
    /// No markers matched. `inferred` names the dialect extractor that won the
    /// best-effort race, if any resolved anything.
    Unknown { inferred: Option<Dialect> },
    /// Tabular CSV export.
    Csv,
}

impl DetectedFormat {
    /// The dialect whose rules produced the fields, matched or inferred.
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            DetectedFormat::Known { dialect } => Some(*dialect),
            DetectedFormat::Unknown { inferred } => *inferred,
            DetectedFormat::Csv => None,
        }
    }
}

impl fmt::Display for DetectedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectedFormat::Known { dialect } => write!(f, "{}", dialect),
            DetectedFormat::Unknown { inferred: Some(d) } => write!(f, "unknown (inferred {})", d),
            DetectedFormat::Unknown { inferred: None } => write!(f, "unknown"),
            DetectedFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionOutcome {
    /// Extracted fields.
    pub fields: CanonicalFields,
    /// Ordered notices about unresolved fields and applied fallbacks.
    pub warnings: Vec<String>,
    /// Layout classification.
    pub detected_format: DetectedFormat,
    /// True only when nothing at all could be resolved from the document.
    pub requires_manual_entry: bool,
}

/// One uploaded file's result inside a batch.
///
/// Built once by the batch aggregator; consumers get read-only accessors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchEntry {
    filename: String,
    period: Option<StatementPeriod>,
    #[serde(rename = "canonicalFields")]
    fields: Option<CanonicalFields>,
    detected_format: Option<DetectedFormat>,
    requires_manual_entry: bool,
    warnings: Vec<String>,
    parse_error: Option<String>,
}

impl BatchEntry {
    /// Entry for a file that extracted successfully.
    pub fn success(
        filename: impl Into<String>,
        outcome: ExtractionOutcome,
        period: Option<StatementPeriod>,
    ) -> Self {
        Self {
            filename: filename.into(),
            period,
            fields: Some(outcome.fields),
            detected_format: Some(outcome.detected_format),
            requires_manual_entry: outcome.requires_manual_entry,
            warnings: outcome.warnings,
            parse_error: None,
        }
    }

    /// Entry for a file that could not be decoded.
    pub fn failure(
        filename: impl Into<String>,
        error: impl Into<String>,
        period: Option<StatementPeriod>,
    ) -> Self {
        Self {
            filename: filename.into(),
            period,
            fields: None,
            detected_format: None,
            requires_manual_entry: false,
            warnings: Vec::new(),
            parse_error: Some(error.into()),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn period(&self) -> Option<&StatementPeriod> {
        self.period.as_ref()
    }

    pub fn fields(&self) -> Option<&CanonicalFields> {
        self.fields.as_ref()
    }

    pub fn detected_format(&self) -> Option<DetectedFormat> {
        self.detected_format
    }

    pub fn requires_manual_entry(&self) -> bool {
        self.requires_manual_entry
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.parse_error.is_none()
    }
}
