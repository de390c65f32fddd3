//! CSV export mapping.
//!
//! Headers are normalized and matched exactly against per-field alias
//! lists. The first alias of each list is the canonical header name, which
//! is what [`csv_template`] emits.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::rules::{extract_period, parse_count, parse_currency};
use crate::error::Result;
use crate::models::{CanonicalFields, FieldName, FieldValue};

/// Header aliases per field, canonical name first.
pub fn aliases(field: FieldName) -> &'static [&'static str] {
    match field {
        FieldName::TotalSalesCount => &[
            "total_sales_count",
            "sales_count",
            "transaction_count",
            "total_transactions",
            "txn_count",
            "transactions",
            "number_of_sales",
        ],
        FieldName::TotalSalesVolume => &[
            "total_sales_volume",
            "sales_volume",
            "gross_sales",
            "total_sales",
            "sales_amount",
            "gross_volume",
            "volume",
        ],
        FieldName::CnpTxnCount => &[
            "cnp_txn_count",
            "cnp_count",
            "cnp_transactions",
            "card_not_present",
            "card_not_present_count",
            "ecommerce_transactions",
            "keyed_transactions",
        ],
        FieldName::MastercardTxnCount => &[
            "mastercard_txn_count",
            "mastercard_count",
            "mastercard_transactions",
            "mc_count",
            "mastercard",
        ],
        FieldName::VisaTxnCount => &["visa_txn_count", "visa_count", "visa_transactions", "visa"],
        FieldName::Tc15Count => &[
            "tc15_count",
            "chargeback_count",
            "chargebacks",
            "dispute_count",
            "disputes",
            "tc15",
        ],
        FieldName::Tc40Count => &["tc40_count", "fraud_count", "fraud_reports", "tc40"],
        FieldName::FraudAmountUsd => &[
            "fraud_amount_usd",
            "fraud_amount",
            "fraud_usd",
            "fraud_dollars",
            "tc40_amount",
        ],
        FieldName::StatementPeriod => &["statement_period", "period", "statement_month", "month"],
    }
}

/// Normalize a header cell: trim, drop a byte-order mark and quotes,
/// lowercase, and turn whitespace runs into underscores. Punctuation such as
/// the parentheses in "Fraud Amount (USD)" is dropped.
pub fn normalize_header(header: &str) -> String {
    let cleaned = header
        .trim()
        .trim_start_matches('\u{feff}')
        .trim_matches(|c| c == '"' || c == '\'')
        .to_lowercase();

    let mut out = String::with_capacity(cleaned.len());
    for word in cleaned.split_whitespace() {
        if !out.is_empty() {
            out.push('_');
        }
        out.extend(word.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_'));
    }

    while out.contains("__") {
        out = out.replace("__", "_");
    }
    out.trim_matches('_').to_string()
}

/// Fields mapped from a CSV export.
#[derive(Debug, Clone, Default)]
pub struct CsvMapping {
    pub fields: CanonicalFields,
    /// Notices about columns that were present but partly or wholly unreadable.
    pub warnings: Vec<String>,
    /// Fields with no matching column.
    pub missing_columns: Vec<FieldName>,
}

impl CsvMapping {
    /// Fields resolved from cells.
    pub fn evidence(&self) -> usize {
        self.fields.resolved_count()
    }
}

/// Maps header/row tables onto canonical fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvColumnMapper;

impl CsvColumnMapper {
    /// The column matching a field. Aliases are tried in order, so a
    /// canonical header beats a looser one elsewhere in the row.
    pub fn find_column(headers: &[String], field: FieldName) -> Option<usize> {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        find_normalized(&normalized, field)
    }

    /// Map rows onto canonical fields. Numeric columns are summed over rows;
    /// the period column contributes its first readable cell.
    pub fn map(headers: &[String], rows: &[Vec<String>]) -> CsvMapping {
        let normalized: Vec<String> = headers.iter().map(|h| normalize_header(h)).collect();
        let mut mapping = CsvMapping::default();

        for field in FieldName::ALL {
            let Some(index) = find_normalized(&normalized, field) else {
                debug!("no column for {}", field);
                mapping.missing_columns.push(field);
                continue;
            };
            let header = headers[index].trim();
            debug!("{} <- column {} ({:?})", field, index, header);

            let cells: Vec<&str> = rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.trim())
                .filter(|cell| !cell.is_empty())
                .collect();

            if field == FieldName::StatementPeriod {
                mapping.fields.statement_period = cells.iter().find_map(|cell| extract_period(cell));
                if mapping.fields.statement_period.is_none() {
                    mapping
                        .warnings
                        .push(format!("Column '{}' has no readable statement period", header));
                }
                continue;
            }

            let found = if is_amount(field) {
                let (values, skipped) = read_column(&cells, parse_currency);
                note_skipped(&mut mapping.warnings, header, skipped);
                FieldValue::<Decimal>::sum_of(values).map(|value| {
                    set_amount(&mut mapping.fields, field, value);
                    value.is_found()
                })
            } else {
                let (values, skipped) = read_column(&cells, parse_count);
                note_skipped(&mut mapping.warnings, header, skipped);
                FieldValue::<u64>::sum_of(values).map(|value| {
                    set_count(&mut mapping.fields, field, value);
                    value.is_found()
                })
            };

            match found {
                Some(true) => {}
                Some(false) => mapping.warnings.push(format!(
                    "Column '{}' has no readable values; {} left unresolved",
                    header,
                    field.label()
                )),
                None => {
                    warn!("{}: column total overflows", header);
                    mapping.warnings.push(format!(
                        "Column '{}' adds up to more than can be represented; {} left unresolved",
                        header,
                        field.label()
                    ));
                }
            }
        }

        mapping
    }
}

fn find_normalized(normalized: &[String], field: FieldName) -> Option<usize> {
    aliases(field)
        .iter()
        .find_map(|alias| normalized.iter().position(|h| h == alias))
}

fn is_amount(field: FieldName) -> bool {
    matches!(field, FieldName::TotalSalesVolume | FieldName::FraudAmountUsd)
}

fn read_column<T>(cells: &[&str], parse: fn(&str) -> Option<T>) -> (Vec<T>, usize) {
    let mut values = Vec::with_capacity(cells.len());
    let mut skipped = 0;
    for cell in cells {
        match parse(cell) {
            Some(value) => values.push(value),
            None => skipped += 1,
        }
    }
    (values, skipped)
}

fn note_skipped(warnings: &mut Vec<String>, header: &str, skipped: usize) {
    if skipped > 0 {
        warnings.push(format!(
            "{} cell(s) in column '{}' could not be read and were skipped",
            skipped, header
        ));
    }
}

fn set_count(fields: &mut CanonicalFields, field: FieldName, value: FieldValue<u64>) {
    match field {
        FieldName::TotalSalesCount => fields.total_sales_count = value,
        FieldName::CnpTxnCount => fields.cnp_txn_count = value,
        FieldName::MastercardTxnCount => fields.mastercard_txn_count = value,
        FieldName::VisaTxnCount => fields.visa_txn_count = value,
        FieldName::Tc15Count => fields.tc15_count = value,
        FieldName::Tc40Count => fields.tc40_count = value,
        _ => {}
    }
}

fn set_amount(fields: &mut CanonicalFields, field: FieldName, value: FieldValue<Decimal>) {
    match field {
        FieldName::TotalSalesVolume => fields.total_sales_volume = value,
        FieldName::FraudAmountUsd => fields.fraud_amount_usd = value,
        _ => {}
    }
}

/// Parse CSV bytes into a header row and data rows. Invalid UTF-8 is
/// replaced, ragged rows are accepted, and blank rows are dropped.
pub fn parse_csv(bytes: &[u8]) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let text = String::from_utf8_lossy(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Vec<String> = record.iter().map(|cell| cell.to_string()).collect();
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        records.push(row);
    }

    let mut records = records.into_iter();
    let headers = records.next().unwrap_or_default();
    Ok((headers, records.collect()))
}

const TEMPLATE_EXAMPLE: [&str; 9] = ["1200", "84500.00", "310", "420", "610", "3", "1", "250.00", "2024-03"];

/// A CSV template: the canonical header row and one example row.
pub fn csv_template() -> String {
    let header: Vec<&str> = FieldName::ALL.iter().map(|f| f.csv_header()).collect();
    format!("{}\n{}\n", header.join(","), TEMPLATE_EXAMPLE.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("\u{feff}\"Chargeback  Count\""), "chargeback_count");
        assert_eq!(normalize_header(" Fraud Amount (USD) "), "fraud_amount_usd");
        assert_eq!(normalize_header("TC15_Count"), "tc15_count");
    }

    #[test]
    fn test_zero_column_is_zero_and_missing_column_is_not_found() {
        let headers = row(&["Chargeback Count", "Visa Count"]);
        let rows = vec![row(&["0", "10"]), row(&["0", "15"])];

        let mapping = CsvColumnMapper::map(&headers, &rows);

        assert_eq!(mapping.fields.tc15_count, FieldValue::Zero);
        assert_eq!(mapping.fields.visa_txn_count, FieldValue::Value(25));
        assert_eq!(mapping.fields.tc40_count, FieldValue::NotFound);
        assert!(mapping.missing_columns.contains(&FieldName::Tc40Count));
    }

    #[test]
    fn test_blank_and_unreadable_cells_are_skipped() {
        let headers = row(&["total_sales_volume", "tc40_count"]);
        let rows = vec![row(&["$1,000.00", "n/a"]), row(&["", ""]), row(&["500.50", "x"])];

        let mapping = CsvColumnMapper::map(&headers, &rows);

        assert_eq!(mapping.fields.total_sales_volume, FieldValue::Value(Decimal::new(150050, 2)));
        assert_eq!(mapping.fields.tc40_count, FieldValue::NotFound);
        assert!(mapping.warnings.iter().any(|w| w.contains("no readable values")));
        assert!(mapping.warnings.iter().any(|w| w.starts_with("2 cell(s)")));
    }

    #[test]
    fn test_overflowing_column_is_left_unresolved() {
        let headers = row(&["total_sales_count", "fraud_amount_usd", "visa_txn_count"]);
        let rows = vec![
            row(&["18446744073709551615", "79228162514264337593543950335", "4"]),
            row(&["1", "1", "6"]),
        ];

        let mapping = CsvColumnMapper::map(&headers, &rows);

        assert_eq!(mapping.fields.total_sales_count, FieldValue::NotFound);
        assert_eq!(mapping.fields.fraud_amount_usd, FieldValue::NotFound);
        assert_eq!(mapping.fields.visa_txn_count, FieldValue::Value(10));
        let overflowed: Vec<&String> = mapping
            .warnings
            .iter()
            .filter(|w| w.contains("more than can be represented"))
            .collect();
        assert_eq!(overflowed.len(), 2);
        assert!(!mapping.warnings.iter().any(|w| w.contains("no readable values")));
    }

    #[test]
    fn test_canonical_alias_wins() {
        let headers = row(&["visa", "visa_txn_count"]);
        assert_eq!(CsvColumnMapper::find_column(&headers, FieldName::VisaTxnCount), Some(1));
    }

    #[test]
    fn test_template_round_trip() {
        let (headers, rows) = parse_csv(csv_template().as_bytes()).unwrap();
        let mapping = CsvColumnMapper::map(&headers, &rows);
        let f = &mapping.fields;

        assert!(mapping.missing_columns.is_empty());
        assert!(mapping.warnings.is_empty());
        for value in [
            f.total_sales_count,
            f.cnp_txn_count,
            f.mastercard_txn_count,
            f.visa_txn_count,
            f.tc15_count,
            f.tc40_count,
        ] {
            assert!(matches!(value, FieldValue::Value(_)));
        }
        assert!(matches!(f.total_sales_volume, FieldValue::Value(_)));
        assert!(matches!(f.fraud_amount_usd, FieldValue::Value(_)));
        assert_eq!(f.statement_period.as_ref().map(|p| p.sort_key()), Some((2024, 3)));
    }

    #[test]
    fn test_parse_csv_skips_blank_rows() {
        let (headers, rows) = parse_csv(b"a,b\n\n1,2\n,\n3\n").unwrap();
        assert_eq!(headers, row(&["a", "b"]));
        assert_eq!(rows, vec![row(&["1", "2"]), row(&["3"])]);
    }
}
