//! Generic keyword extraction for statements of unknown layout.
//!
//! Two passes over the text: an inline pass matching `label <sep> number`
//! on one line, then an adjacent-line pass for labels printed above their
//! value. Inline matches always win.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::debug;

use super::rules::{decimal_to_count, first_number, parse_count, parse_currency, scan_period};
use crate::models::{CanonicalFields, FieldName, FieldValue};

/// Label alternations per field, most specific first.
fn labels(field: FieldName) -> &'static [&'static str] {
    match field {
        FieldName::TotalSalesCount => &[
            r"total\s+sales\s+count",
            r"sales\s+count",
            r"total\s+transactions",
            r"transaction\s+count",
            r"number\s+of\s+(?:sales|transactions)",
            r"total\s+(?:sales\s+)?items",
        ],
        FieldName::TotalSalesVolume => &[
            r"total\s+sales\s+volume",
            r"sales\s+volume",
            r"total\s+gross\s+sales",
            r"gross\s+sales",
            r"total\s+sales\s+amount",
            r"amounts?\s+submitted",
            r"processing\s+volume",
            r"total\s+volume",
        ],
        FieldName::CnpTxnCount => &[
            r"card[\s\-]*not[\s\-]*present(?:\s+(?:transactions|txns?|count))?",
            r"cnp(?:\s+(?:transactions|txns?|txn\s+count|count))?",
            r"e-?commerce\s+transactions",
            r"keyed\s+transactions",
        ],
        FieldName::MastercardTxnCount => &[
            r"mastercard(?:\s+(?:transactions|txns?|txn\s+count|sales\s+count|count))?",
            r"mc\s+transactions",
        ],
        FieldName::VisaTxnCount => &[
            r"visa(?:\s+(?:transactions|txns?|txn\s+count|sales\s+count|count))?",
        ],
        FieldName::Tc15Count => &[
            r"chargeback\s+count",
            r"number\s+of\s+chargebacks",
            r"total\s+chargebacks",
            r"chargebacks",
            r"dispute\s+count",
            r"disputes",
            r"tc\s?15(?:\s+count)?",
        ],
        FieldName::Tc40Count => &[
            r"fraud\s+count",
            r"number\s+of\s+fraud\s+reports",
            r"fraud\s+reports?",
            r"tc\s?40(?:\s+(?:count|reports?))?",
        ],
        FieldName::FraudAmountUsd => &[
            r"fraud\s+amount(?:\s+\(?usd\)?)?",
            r"fraud\s+(?:dollars|volume|losses)",
            r"tc\s?40\s+amount",
        ],
        FieldName::StatementPeriod => &[],
    }
}

const NUMBER: &str = r"(\(?-?\$?[ \t]?\d[\d,]*(?:\.\d+)?\)?-?)";

const PERIOD_LABELS: &[&str] = &["statement period", "reporting period", "period covered", "processing month", "period"];

struct FieldPatterns {
    field: FieldName,
    inline: Vec<Regex>,
    adjacent: Vec<Regex>,
}

lazy_static! {
    static ref PATTERNS: Vec<FieldPatterns> = FieldName::ALL
        .iter()
        .filter(|field| **field != FieldName::StatementPeriod)
        .map(|field| FieldPatterns {
            field: *field,
            inline: labels(*field)
                .iter()
                .map(|label| {
                    Regex::new(&format!(r"(?im)\b(?:{label})(?:\b|[^\w\s])[ \t]*[:=,\-]?[ \t]*{NUMBER}"))
                        .unwrap()
                })
                .collect(),
            adjacent: labels(*field)
                .iter()
                .map(|label| Regex::new(&format!(r"(?i)^(?:{label})\s*:?$")).unwrap())
                .collect(),
        })
        .collect();
}

fn patterns(field: FieldName) -> Option<&'static FieldPatterns> {
    PATTERNS.iter().find(|p| p.field == field)
}

/// A field value read from text, before it is placed in a record.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Reading {
    Count(u64),
    Amount(Decimal),
}

fn is_amount_field(field: FieldName) -> bool {
    matches!(field, FieldName::TotalSalesVolume | FieldName::FraudAmountUsd)
}

fn read_token(field: FieldName, token: &str) -> Option<Reading> {
    let token = token.trim();
    if is_amount_field(field) {
        parse_currency(token).map(Reading::Amount)
    } else {
        parse_count(token).map(Reading::Count)
    }
}

fn read_decimal(field: FieldName, value: Decimal) -> Option<Reading> {
    if is_amount_field(field) {
        Some(Reading::Amount(value))
    } else {
        decimal_to_count(value).map(Reading::Count)
    }
}

fn place(fields: &mut CanonicalFields, field: FieldName, reading: Reading) {
    match (field, reading) {
        (FieldName::TotalSalesCount, Reading::Count(n)) => fields.total_sales_count = FieldValue::found(n),
        (FieldName::CnpTxnCount, Reading::Count(n)) => fields.cnp_txn_count = FieldValue::found(n),
        (FieldName::MastercardTxnCount, Reading::Count(n)) => fields.mastercard_txn_count = FieldValue::found(n),
        (FieldName::VisaTxnCount, Reading::Count(n)) => fields.visa_txn_count = FieldValue::found(n),
        (FieldName::Tc15Count, Reading::Count(n)) => fields.tc15_count = FieldValue::found(n),
        (FieldName::Tc40Count, Reading::Count(n)) => fields.tc40_count = FieldValue::found(n),
        (FieldName::TotalSalesVolume, Reading::Amount(v)) => fields.total_sales_volume = FieldValue::found(v),
        (FieldName::FraudAmountUsd, Reading::Amount(v)) => fields.fraud_amount_usd = FieldValue::found(v),
        _ => {}
    }
}

/// Keyword extractor that needs no layout knowledge.
#[derive(Debug, Clone)]
pub struct GenericExtractor {
    adjacent_window: usize,
}

impl GenericExtractor {
    /// Create an extractor scanning `adjacent_window` lines after a
    /// standalone label.
    pub fn new(adjacent_window: usize) -> Self {
        Self { adjacent_window }
    }

    /// Inline pass: the first `label <sep> number` match per field.
    pub fn inline_pass(&self, text: &str) -> CanonicalFields {
        let mut fields = CanonicalFields::empty();

        for field in FieldName::ALL {
            let Some(patterns) = patterns(field) else {
                continue;
            };
            let reading = patterns.inline.iter().find_map(|re| {
                re.captures_iter(text)
                    .find_map(|caps| read_token(field, caps.get(1)?.as_str()))
            });
            if let Some(reading) = reading {
                debug!("inline pass: {} = {:?}", field, reading);
                place(&mut fields, field, reading);
            }
        }

        fields
    }

    /// Adjacent-line pass: a line holding only a label, with the value on
    /// one of the following lines.
    pub fn adjacent_pass(&self, lines: &[&str]) -> CanonicalFields {
        let lines: Vec<&str> = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
        let mut fields = CanonicalFields::empty();

        for field in FieldName::ALL {
            let Some(patterns) = patterns(field) else {
                continue;
            };
            let reading = lines.iter().enumerate().find_map(|(i, line)| {
                if !patterns.adjacent.iter().any(|re| re.is_match(line)) {
                    return None;
                }
                lines
                    .iter()
                    .skip(i + 1)
                    .take(self.adjacent_window)
                    .find_map(|next| first_number(next))
                    .and_then(|value| read_decimal(field, value))
            });
            if let Some(reading) = reading {
                debug!("adjacent pass: {} = {:?}", field, reading);
                place(&mut fields, field, reading);
            }
        }

        fields
    }

    /// Both passes merged, inline first. The statement period comes from a
    /// labeled period line.
    pub fn extract(&self, text: &str) -> CanonicalFields {
        let mut fields = self.inline_pass(text);
        let lines: Vec<&str> = text.lines().collect();
        fields.fill_missing_from(&self.adjacent_pass(&lines));

        let owned: Vec<String> = lines.iter().map(|l| l.trim().to_string()).collect();
        fields.statement_period = scan_period(&owned, PERIOD_LABELS);
        fields
    }
}

impl Default for GenericExtractor {
    fn default() -> Self {
        Self::new(3)
    }
}
