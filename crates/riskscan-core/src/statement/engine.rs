//! The extraction pipeline for single documents.

use std::path::Path;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::csv_mapper::{parse_csv, CsvColumnMapper};
use super::detect::FormatDetector;
use super::dialects::{extractor_for, race};
use super::generic::GenericExtractor;
use super::rules::capitalize;
use crate::error::{Result, RiskscanError};
use crate::models::{CanonicalFields, DetectedFormat, ExtractionOutcome, FieldName, RiskscanConfig};
use crate::pdf::{PdfExtractor, PdfLines, PdfProcessor};

/// Kind of an uploaded file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Pdf,
    Csv,
}

impl InputKind {
    /// Decide from the file extension, then from the `%PDF-` signature.
    pub fn detect(filename: &str, bytes: &[u8]) -> Result<Self> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("pdf") => Ok(InputKind::Pdf),
            Some("csv") => Ok(InputKind::Csv),
            _ if bytes.starts_with(b"%PDF-") => Ok(InputKind::Pdf),
            _ => Err(RiskscanError::UnsupportedInput(filename.to_string())),
        }
    }
}

/// Statement field-extraction engine.
///
/// Stateless between calls: every method reads only its arguments and the
/// configuration it was built with.
#[derive(Debug, Clone)]
pub struct StatementEngine {
    config: RiskscanConfig,
    detector: FormatDetector,
    generic: GenericExtractor,
}

impl StatementEngine {
    /// Create an engine with the given configuration.
    pub fn new(config: RiskscanConfig) -> Self {
        let detector = FormatDetector::new(config.dialect_priority());
        let generic = GenericExtractor::new(config.extraction.adjacent_window);
        Self {
            config,
            detector,
            generic,
        }
    }

    pub fn config(&self) -> &RiskscanConfig {
        &self.config
    }

    pub fn detector(&self) -> &FormatDetector {
        &self.detector
    }

    /// Extract a file of either kind.
    pub fn extract_file(&self, filename: &str, bytes: &[u8]) -> Result<ExtractionOutcome> {
        match InputKind::detect(filename, bytes)? {
            InputKind::Pdf => self.extract_pdf(bytes),
            InputKind::Csv => self.extract_csv(bytes),
        }
    }

    /// Decode a PDF into reading-order lines.
    pub fn read_pdf_lines(&self, bytes: &[u8]) -> Result<PdfLines> {
        let mut extractor = PdfExtractor::new();
        extractor.load(bytes)?;
        Ok(extractor.extract_lines(&self.config.pdf)?)
    }

    /// Extract fields from PDF bytes.
    ///
    /// Only an unreadable document is an error. A PDF without extractable
    /// text yields an outcome flagged for manual entry.
    pub fn extract_pdf(&self, bytes: &[u8]) -> Result<ExtractionOutcome> {
        let start = Instant::now();
        let pdf = self.read_pdf_lines(bytes)?;

        if pdf.lines.is_empty() {
            warn!("No text found in {} page(s); manual entry required", pdf.pages);
            let mut warnings = vec![
                "No extractable text found; the PDF appears to be scanned or image-only. \
                 Enter the statement values manually"
                    .to_string(),
            ];
            let mut fields = CanonicalFields::empty();
            fields.settle(&mut warnings);
            return Ok(ExtractionOutcome {
                fields,
                warnings,
                detected_format: DetectedFormat::Unknown { inferred: None },
                requires_manual_entry: true,
            });
        }

        let mut outcome = self.extract_lines(&pdf.lines);
        if pdf.approximated {
            note_approximated(&mut outcome);
        }

        info!(
            "Extracted {}/{} fields ({}) in {} ms",
            outcome.fields.resolved_count(),
            FieldName::ALL.len(),
            outcome.detected_format,
            start.elapsed().as_millis()
        );
        Ok(outcome)
    }

    /// Extract fields from reconstructed lines.
    pub fn extract_lines(&self, lines: &[String]) -> ExtractionOutcome {
        let header = &lines[..lines.len().min(self.config.pdf.header_window)];
        let detected = self.detector.detect(header);
        debug!("Detected format: {}", detected);

        let mut warnings = Vec::new();
        let (mut fields, mut evidence, detected_format, dialect_ran) = match detected {
            DetectedFormat::Known { dialect } => {
                let outcome = extractor_for(dialect).extract(lines);
                warnings.extend(outcome.warnings);
                (outcome.fields, outcome.evidence, detected, true)
            }
            _ => match race(lines, self.detector.priority()) {
                Some((dialect, outcome)) => {
                    warnings.push(format!(
                        "Statement layout not recognized; fields were read with the {} rules, \
                         the closest match",
                        dialect
                    ));
                    warnings.extend(outcome.warnings);
                    let inferred = DetectedFormat::Unknown { inferred: Some(dialect) };
                    (outcome.fields, outcome.evidence, inferred, true)
                }
                None => {
                    warnings.push(
                        "Statement layout not recognized; fields were read by generic keyword matching"
                            .to_string(),
                    );
                    let unknown = DetectedFormat::Unknown { inferred: None };
                    (CanonicalFields::empty(), 0, unknown, false)
                }
            },
        };

        if !dialect_ran || self.config.extraction.generic_fallback {
            let generic = self.generic.extract(&lines.join("\n"));
            let filled = fields.fill_missing_from(&generic);
            if dialect_ran {
                for field in &filled {
                    warnings.push(format!(
                        "{}: taken from a generic keyword match - verify",
                        capitalize(field.label())
                    ));
                }
            }
            evidence += filled.len();
        }

        finish(fields, warnings, detected_format, evidence, |field| {
            format!("{} not found on the statement", capitalize(field.label()))
        })
    }

    /// Extract fields from CSV bytes.
    pub fn extract_csv(&self, bytes: &[u8]) -> Result<ExtractionOutcome> {
        let (headers, rows) = parse_csv(bytes)?;
        let text = String::from_utf8_lossy(bytes);
        Ok(self.extract_table(&headers, &rows, Some(&text)))
    }

    /// Extract fields from an already-parsed table. `raw_text`, when given,
    /// feeds the generic keyword extractor for fields without a column.
    pub fn extract_table(
        &self,
        headers: &[String],
        rows: &[Vec<String>],
        raw_text: Option<&str>,
    ) -> ExtractionOutcome {
        let mapping = CsvColumnMapper::map(headers, rows);
        let mut evidence = mapping.evidence();
        let mut fields = mapping.fields;
        let mut warnings = mapping.warnings;

        if let Some(text) = raw_text.filter(|_| self.config.extraction.generic_fallback) {
            let generic = self.generic.extract(text);
            let filled = fields.fill_missing_from(&generic);
            for field in &filled {
                warnings.push(format!(
                    "{}: no matching column, taken from a generic keyword match - verify",
                    capitalize(field.label())
                ));
            }
            evidence += filled.len();
        }

        finish(fields, warnings, DetectedFormat::Csv, evidence, |field| {
            format!(
                "No column found for {} (expected a header such as '{}')",
                field.label(),
                field.csv_header()
            )
        })
    }
}

impl Default for StatementEngine {
    fn default() -> Self {
        Self::new(RiskscanConfig::default())
    }
}

/// Flag flat-text reading order. The layout notice of an unrecognized
/// statement stays first.
fn note_approximated(outcome: &mut ExtractionOutcome) {
    let at = match outcome.detected_format {
        DetectedFormat::Unknown { .. } => 1.min(outcome.warnings.len()),
        _ => 0,
    };
    outcome.warnings.insert(
        at,
        "Text positions were unavailable; reading order is approximated".to_string(),
    );
}

/// Apply the shared cross-field rules and report what is still missing.
fn finish(
    mut fields: CanonicalFields,
    mut warnings: Vec<String>,
    detected_format: DetectedFormat,
    evidence: usize,
    describe_missing: impl Fn(FieldName) -> String,
) -> ExtractionOutcome {
    let requires_manual_entry = evidence == 0;
    if requires_manual_entry {
        warn!("Nothing could be read from the document");
    }

    fields.settle(&mut warnings);
    for field in fields.missing() {
        warnings.push(describe_missing(field));
    }

    ExtractionOutcome {
        fields,
        warnings,
        detected_format,
        requires_manual_entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Dialect, FieldValue};
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn test_input_kind() {
        assert_eq!(InputKind::detect("a.PDF", b"").unwrap(), InputKind::Pdf);
        assert_eq!(InputKind::detect("a.csv", b"x,y").unwrap(), InputKind::Csv);
        assert_eq!(InputKind::detect("upload", b"%PDF-1.5").unwrap(), InputKind::Pdf);
        assert!(matches!(
            InputKind::detect("notes.txt", b"hello"),
            Err(RiskscanError::UnsupportedInput(_))
        ));
    }

    #[test]
    fn test_known_dialect_with_generic_fill() {
        let doc = lines(
            "
            SUMMARY BY CARD TYPE
            Visa 120 $12,000.00
            Mastercard 80 $8,000.00
            Total 200 $20,000.00
            Card Not Present Transactions: 35
            Fraud Amount: $40.00
            ",
        );
        let outcome = StatementEngine::default().extract_lines(&doc);
        let f = &outcome.fields;

        assert_eq!(outcome.detected_format, DetectedFormat::Known { dialect: Dialect::CardTypeSummary });
        assert_eq!(f.total_sales_count, FieldValue::Value(200));
        assert_eq!(f.cnp_txn_count, FieldValue::Value(35));
        assert_eq!(f.fraud_amount_usd, FieldValue::Value(rust_decimal::Decimal::new(4000, 2)));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w == "Fraud amount (USD): taken from a generic keyword match - verify"));
        assert!(!outcome.requires_manual_entry);
    }

    #[test]
    fn test_unknown_layout_uses_race_winner() {
        let doc = lines(
            "
            MONTHLY ACTIVITY
            ACTIVITY SUMMARY
            Total Sales 310 $25,000.00
            Keyed Transactions 40
            CHARGEBACK ACTIVITY
            Total Chargebacks 2 $150.00
            ",
        );
        let outcome = StatementEngine::default().extract_lines(&doc);

        assert_eq!(
            outcome.detected_format,
            DetectedFormat::Unknown { inferred: Some(Dialect::PlanSummary) }
        );
        assert!(outcome.warnings[0].starts_with("Statement layout not recognized"));
        assert_eq!(outcome.fields.tc15_count, FieldValue::Value(2));
    }

    #[test]
    fn test_approximation_notice_follows_layout_notice() {
        let engine = StatementEngine::default();

        let mut unknown = engine.extract_lines(&lines("ACTIVITY SUMMARY\nTotal Sales 310 $25,000.00"));
        note_approximated(&mut unknown);
        assert!(unknown.warnings[0].starts_with("Statement layout not recognized"));
        assert!(unknown.warnings[1].starts_with("Text positions were unavailable"));

        let mut known = engine.extract_lines(&lines("PLAN SUMMARY\nVS 10 $100.00"));
        note_approximated(&mut known);
        assert!(known.warnings[0].starts_with("Text positions were unavailable"));
    }

    #[test]
    fn test_nothing_readable_requires_manual_entry() {
        let outcome = StatementEngine::default().extract_lines(&lines("Thank you for your business"));

        assert!(outcome.requires_manual_entry);
        assert_eq!(outcome.fields.tc15_count, FieldValue::Zero);
        assert_eq!(outcome.fields.total_sales_count, FieldValue::NotFound);
    }

    #[test]
    fn test_csv_cnp_proxy() {
        let outcome = StatementEngine::default()
            .extract_csv(b"total_sales_count,visa_txn_count\n500,300\n")
            .unwrap();

        assert_eq!(outcome.detected_format, DetectedFormat::Csv);
        assert_eq!(outcome.fields.cnp_txn_count, FieldValue::Value(500));
        assert!(outcome.warnings.iter().any(|w| w.contains("proxy")));
        assert!(outcome
            .warnings
            .iter()
            .any(|w| w.starts_with("No column found for fraud report count")));
    }
}
