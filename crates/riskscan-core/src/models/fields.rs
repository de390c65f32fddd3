//! Canonical statement fields and the tri-state value type.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A numeric quantity that can live inside a [`FieldValue`].
pub trait Quantity: Copy + PartialEq + fmt::Debug {
    /// The additive identity.
    fn zero() -> Self;

    /// Addition that reports overflow as `None`.
    fn checked_sum(self, other: Self) -> Option<Self>;

    /// Whether the value is exactly zero.
    fn is_zero_value(&self) -> bool;

    /// Absolute value. Statements print debits with a minus sign or in
    /// parentheses; only magnitudes are stored.
    fn magnitude(self) -> Self;
}

impl Quantity for u64 {
    fn zero() -> Self {
        0
    }

    fn checked_sum(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }

    fn is_zero_value(&self) -> bool {
        *self == 0
    }

    fn magnitude(self) -> Self {
        self
    }
}

impl Quantity for Decimal {
    fn zero() -> Self {
        Decimal::ZERO
    }

    fn checked_sum(self, other: Self) -> Option<Self> {
        self.checked_add(other)
    }

    fn is_zero_value(&self) -> bool {
        self.is_zero()
    }

    fn magnitude(self) -> Self {
        self.abs()
    }
}

/// A tri-state extracted value.
///
/// `NotFound` means the document carried no evidence for the field. `Zero`
/// means evidence was found and the value is legitimately zero. The two must
/// stay distinct all the way to the risk calculators, so there is no
/// conversion from `NotFound` to a number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum FieldValue<T> {
    /// No evidence.
    NotFound,
    /// Evidence found, value is zero.
    Zero,
    /// Evidence found, value is positive.
    Value(T),
}

impl<T: Quantity> FieldValue<T> {
    /// Record a value backed by document evidence.
    pub fn found(value: T) -> Self {
        if value.is_zero_value() {
            FieldValue::Zero
        } else {
            FieldValue::Value(value.magnitude())
        }
    }

    /// `None` becomes `NotFound`, `Some` goes through [`FieldValue::found`].
    pub fn from_option(value: Option<T>) -> Self {
        value.map_or(FieldValue::NotFound, Self::found)
    }

    /// Sum evidence values. An empty iterator has no evidence.
    ///
    /// Returns `None` when the sum does not fit in `T`.
    pub fn sum_of<I: IntoIterator<Item = T>>(values: I) -> Option<Self> {
        let mut total: Option<T> = None;
        for value in values {
            total = Some(match total {
                Some(acc) => acc.checked_sum(value.magnitude())?,
                None => value.magnitude(),
            });
        }
        Some(Self::from_option(total))
    }

    /// Whether the field was resolved (`Zero` or `Value`).
    pub fn is_found(&self) -> bool {
        !matches!(self, FieldValue::NotFound)
    }

    /// The numeric reading of a resolved field; `None` for `NotFound`.
    pub fn as_number(&self) -> Option<T> {
        match self {
            FieldValue::NotFound => None,
            FieldValue::Zero => Some(T::zero()),
            FieldValue::Value(v) => Some(*v),
        }
    }

    /// The positive value, if any.
    pub fn value(&self) -> Option<T> {
        match self {
            FieldValue::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl<T: fmt::Display> fmt::Display for FieldValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::NotFound => write!(f, "not found"),
            FieldValue::Zero => write!(f, "0"),
            FieldValue::Value(v) => write!(f, "{}", v),
        }
    }
}

/// The canonical fields the engine extracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldName {
    TotalSalesCount,
    TotalSalesVolume,
    CnpTxnCount,
    MastercardTxnCount,
    VisaTxnCount,
    Tc15Count,
    Tc40Count,
    FraudAmountUsd,
    StatementPeriod,
}

impl FieldName {
    /// All fields in canonical order.
    pub const ALL: [FieldName; 9] = [
        FieldName::TotalSalesCount,
        FieldName::TotalSalesVolume,
        FieldName::CnpTxnCount,
        FieldName::MastercardTxnCount,
        FieldName::VisaTxnCount,
        FieldName::Tc15Count,
        FieldName::Tc40Count,
        FieldName::FraudAmountUsd,
        FieldName::StatementPeriod,
    ];

    /// Canonical CSV header name (first alias the column mapper recognizes).
    pub fn csv_header(&self) -> &'static str {
        match self {
            FieldName::TotalSalesCount => "total_sales_count",
            FieldName::TotalSalesVolume => "total_sales_volume",
            FieldName::CnpTxnCount => "cnp_txn_count",
            FieldName::MastercardTxnCount => "mastercard_txn_count",
            FieldName::VisaTxnCount => "visa_txn_count",
            FieldName::Tc15Count => "tc15_count",
            FieldName::Tc40Count => "tc40_count",
            FieldName::FraudAmountUsd => "fraud_amount_usd",
            FieldName::StatementPeriod => "statement_period",
        }
    }

    /// Human-readable label used in warnings.
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::TotalSalesCount => "total sales count",
            FieldName::TotalSalesVolume => "total sales volume",
            FieldName::CnpTxnCount => "card-not-present transaction count",
            FieldName::MastercardTxnCount => "Mastercard transaction count",
            FieldName::VisaTxnCount => "Visa transaction count",
            FieldName::Tc15Count => "chargeback count (TC15)",
            FieldName::Tc40Count => "fraud report count (TC40)",
            FieldName::FraudAmountUsd => "fraud amount (USD)",
            FieldName::StatementPeriod => "statement period",
        }
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The month a statement covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementPeriod {
    /// Calendar year.
    pub year: i32,

    /// Month index (1-12).
    pub month: u32,

    /// First day covered, when the statement prints a range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,

    /// Last day covered, when the statement prints a range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,

    /// Display label, e.g. "Mar 2024".
    pub label: String,
}

impl StatementPeriod {
    /// A whole-month period.
    pub fn from_month(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        Some(Self {
            year,
            month,
            start: None,
            end: None,
            label: first.format("%b %Y").to_string(),
        })
    }

    /// A period printed as a date range. The statement month is the month
    /// the range closes in.
    pub fn from_range(start: NaiveDate, end: NaiveDate) -> Self {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        Self {
            year: end.year(),
            month: end.month(),
            start: Some(start),
            end: Some(end),
            label: end.format("%b %Y").to_string(),
        }
    }

    /// Chronological sort key.
    pub fn sort_key(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

impl fmt::Display for StatementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(start), Some(end)) => write!(f, "{} ({} - {})", self.label, start, end),
            _ => f.write_str(&self.label),
        }
    }
}

/// The engine's output payload for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalFields {
    pub total_sales_count: FieldValue<u64>,
    pub total_sales_volume: FieldValue<Decimal>,
    pub cnp_txn_count: FieldValue<u64>,
    pub mastercard_txn_count: FieldValue<u64>,
    pub visa_txn_count: FieldValue<u64>,
    /// Dispute/chargeback count.
    pub tc15_count: FieldValue<u64>,
    /// Fraud report count.
    pub tc40_count: FieldValue<u64>,
    #[serde(rename = "fraudAmountUSD")]
    pub fraud_amount_usd: FieldValue<Decimal>,
    pub statement_period: Option<StatementPeriod>,
}

impl CanonicalFields {
    /// A record with nothing resolved.
    pub fn empty() -> Self {
        Self {
            total_sales_count: FieldValue::NotFound,
            total_sales_volume: FieldValue::NotFound,
            cnp_txn_count: FieldValue::NotFound,
            mastercard_txn_count: FieldValue::NotFound,
            visa_txn_count: FieldValue::NotFound,
            tc15_count: FieldValue::NotFound,
            tc40_count: FieldValue::NotFound,
            fraud_amount_usd: FieldValue::NotFound,
            statement_period: None,
        }
    }

    /// Whether a field carries a resolved value.
    pub fn is_resolved(&self, name: FieldName) -> bool {
        match name {
            FieldName::TotalSalesCount => self.total_sales_count.is_found(),
            FieldName::TotalSalesVolume => self.total_sales_volume.is_found(),
            FieldName::CnpTxnCount => self.cnp_txn_count.is_found(),
            FieldName::MastercardTxnCount => self.mastercard_txn_count.is_found(),
            FieldName::VisaTxnCount => self.visa_txn_count.is_found(),
            FieldName::Tc15Count => self.tc15_count.is_found(),
            FieldName::Tc40Count => self.tc40_count.is_found(),
            FieldName::FraudAmountUsd => self.fraud_amount_usd.is_found(),
            FieldName::StatementPeriod => self.statement_period.is_some(),
        }
    }

    /// Number of resolved fields.
    pub fn resolved_count(&self) -> usize {
        FieldName::ALL.iter().filter(|n| self.is_resolved(**n)).count()
    }

    /// Fields still unresolved, in canonical order.
    pub fn missing(&self) -> Vec<FieldName> {
        FieldName::ALL
            .iter()
            .copied()
            .filter(|n| !self.is_resolved(*n))
            .collect()
    }

    /// Copy every field that is unresolved here but resolved in `other`.
    /// Returns the names that were filled.
    pub fn fill_missing_from(&mut self, other: &CanonicalFields) -> Vec<FieldName> {
        let mut filled = Vec::new();
        fill(&mut self.total_sales_count, other.total_sales_count, FieldName::TotalSalesCount, &mut filled);
        fill(&mut self.total_sales_volume, other.total_sales_volume, FieldName::TotalSalesVolume, &mut filled);
        fill(&mut self.cnp_txn_count, other.cnp_txn_count, FieldName::CnpTxnCount, &mut filled);
        fill(&mut self.mastercard_txn_count, other.mastercard_txn_count, FieldName::MastercardTxnCount, &mut filled);
        fill(&mut self.visa_txn_count, other.visa_txn_count, FieldName::VisaTxnCount, &mut filled);
        fill(&mut self.tc15_count, other.tc15_count, FieldName::Tc15Count, &mut filled);
        fill(&mut self.tc40_count, other.tc40_count, FieldName::Tc40Count, &mut filled);
        fill(&mut self.fraud_amount_usd, other.fraud_amount_usd, FieldName::FraudAmountUsd, &mut filled);
        if self.statement_period.is_none() && other.statement_period.is_some() {
            self.statement_period = other.statement_period.clone();
            filled.push(FieldName::StatementPeriod);
        }
        filled
    }

    /// Apply the cross-field rules every source shares:
    /// the CNP proxy and the conservative chargeback default.
    pub(crate) fn settle(&mut self, warnings: &mut Vec<String>) {
        if !self.cnp_txn_count.is_found() && self.total_sales_count.is_found() {
            self.cnp_txn_count = self.total_sales_count;
            warnings.push(
                "No card-not-present count found; total sales count used as a CNP proxy. \
                 CNP ratios may be overstated"
                    .to_string(),
            );
        }

        if !self.tc15_count.is_found() {
            self.tc15_count = FieldValue::Zero;
            warnings.push(
                "No chargeback evidence found; chargeback count recorded as 0 - verify against the statement"
                    .to_string(),
            );
        }
    }
}

impl Default for CanonicalFields {
    fn default() -> Self {
        Self::empty()
    }
}

fn fill<T: Quantity>(
    slot: &mut FieldValue<T>,
    source: FieldValue<T>,
    name: FieldName,
    filled: &mut Vec<FieldName>,
) {
    if !slot.is_found() && source.is_found() {
        *slot = source;
        filled.push(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_found_distinguishes_zero() {
        assert_eq!(FieldValue::found(0u64), FieldValue::Zero);
        assert_eq!(FieldValue::found(7u64), FieldValue::Value(7));
        assert_eq!(FieldValue::<u64>::from_option(None), FieldValue::NotFound);
    }

    #[test]
    fn test_found_stores_magnitude() {
        let v = FieldValue::found(Decimal::new(-4500, 2));
        assert_eq!(v, FieldValue::Value(Decimal::new(4500, 2)));
    }

    #[test]
    fn test_sum_of_empty_is_not_found() {
        assert_eq!(FieldValue::<u64>::sum_of(Vec::new()), Some(FieldValue::NotFound));
        assert_eq!(FieldValue::sum_of(vec![0u64, 0]), Some(FieldValue::Zero));
        assert_eq!(FieldValue::sum_of(vec![120u64, 80]), Some(FieldValue::Value(200)));
    }

    #[test]
    fn test_sum_of_overflow() {
        assert_eq!(FieldValue::sum_of(vec![u64::MAX, 1]), None);
        assert_eq!(FieldValue::sum_of(vec![Decimal::MAX, Decimal::ONE]), None);
        assert_eq!(FieldValue::sum_of(vec![u64::MAX]), Some(FieldValue::Value(u64::MAX)));
    }

    #[test]
    fn test_as_number() {
        assert_eq!(FieldValue::<u64>::NotFound.as_number(), None);
        assert_eq!(FieldValue::<u64>::Zero.as_number(), Some(0));
        assert_eq!(FieldValue::Value(3u64).value(), Some(3));
        assert_eq!(FieldValue::<u64>::Zero.value(), None);
    }

    #[test]
    fn test_cnp_proxy() {
        let mut fields = CanonicalFields::empty();
        fields.total_sales_count = FieldValue::Value(500);
        let mut warnings = Vec::new();
        fields.settle(&mut warnings);

        assert_eq!(fields.cnp_txn_count, FieldValue::Value(500));
        assert!(warnings.iter().any(|w| w.contains("proxy") && w.contains("overstated")));
    }

    #[test]
    fn test_chargeback_default() {
        let mut fields = CanonicalFields::empty();
        let mut warnings = Vec::new();
        fields.settle(&mut warnings);

        assert_eq!(fields.tc15_count, FieldValue::Zero);
        assert_eq!(fields.cnp_txn_count, FieldValue::NotFound);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_fill_missing_keeps_existing() {
        let mut primary = CanonicalFields::empty();
        primary.visa_txn_count = FieldValue::Value(10);
        let mut secondary = CanonicalFields::empty();
        secondary.visa_txn_count = FieldValue::Value(99);
        secondary.tc40_count = FieldValue::Zero;

        let filled = primary.fill_missing_from(&secondary);

        assert_eq!(primary.visa_txn_count, FieldValue::Value(10));
        assert_eq!(primary.tc40_count, FieldValue::Zero);
        assert_eq!(filled, vec![FieldName::Tc40Count]);
    }

    #[test]
    fn test_serialized_shape() {
        let mut fields = CanonicalFields::empty();
        fields.tc15_count = FieldValue::Value(45);
        let json = serde_json::to_value(&fields).unwrap();

        assert_eq!(json["tc15Count"]["status"], "value");
        assert_eq!(json["tc15Count"]["value"], 45);
        assert_eq!(json["totalSalesCount"]["status"], "not_found");
        assert!(json.get("fraudAmountUSD").is_some());
    }

    #[test]
    fn test_period_from_range_uses_closing_month() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 26).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 3, 25).unwrap();
        let period = StatementPeriod::from_range(start, end);

        assert_eq!(period.sort_key(), (2024, 3));
        assert_eq!(period.label, "Mar 2024");
    }
}
