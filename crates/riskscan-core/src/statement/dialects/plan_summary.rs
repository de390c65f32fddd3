//! Plan summary layout.
//!
//! A plan-code table (VS, MC, DS, AX, DB) with a Total row, an activity
//! summary, interchange/program fees, and separate chargeback and fraud
//! activity sections.

use rust_decimal::Decimal;
use tracing::debug;

use super::tally::{InterchangeTally, ItemizedTally, OVERFLOW_WARNING};
use super::{DialectExtractor, DialectOutcome};
use crate::models::{CanonicalFields, Dialect, FieldName, FieldValue};
use crate::statement::rows::{
    brand_prefix, is_adjustment_row, is_cnp_label, is_column_header, is_total_row, match_heading,
    BrandCounts, CardBrand,
};
use crate::statement::rules::patterns::{NO_CHARGEBACKS, NO_FRAUD, TC40_LINE};
use crate::statement::rules::{resolve, row_count, scan_labeled_amount, scan_period, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Neutral,
    PlanSummary,
    ActivitySummary,
    InterchangeDetail,
    Chargebacks,
    Fraud,
    Adjustments,
    Other,
}

const HEADINGS: &[(&str, Section)] = &[
    ("plan summary", Section::PlanSummary),
    ("activity summary", Section::ActivitySummary),
    ("summary of activity", Section::ActivitySummary),
    ("interchange/program fees", Section::InterchangeDetail),
    ("interchange / program fees", Section::InterchangeDetail),
    ("interchange detail", Section::InterchangeDetail),
    ("chargeback activity", Section::Chargebacks),
    ("chargebacks", Section::Chargebacks),
    ("disputes", Section::Chargebacks),
    ("fraud activity", Section::Fraud),
    ("fraud reports", Section::Fraud),
    ("risk activity", Section::Fraud),
    ("adjustments", Section::Adjustments),
    ("fees", Section::Other),
    ("deposits", Section::Other),
    ("account summary", Section::Neutral),
];

const VOLUME_LABELS: &[&str] = &["total gross sales", "gross sales volume", "gross sales", "total sales"];
const PERIOD_LABELS: &[&str] = &["reporting period", "statement period", "processing month"];

#[derive(Debug, Default)]
struct Ledger {
    plan_total: Option<u64>,
    plan_brands: BrandCounts,
    activity_sales: Option<u64>,
    activity_cnp: Option<u64>,
    interchange: InterchangeTally,
    chargebacks: ItemizedTally,
    fraud: ItemizedTally,
    tc40_line: Option<u64>,
    no_chargebacks: bool,
    no_fraud: bool,
}

impl Ledger {
    fn walk(lines: &[String]) -> Self {
        let mut ledger = Ledger::default();
        let mut section = Section::Neutral;

        for line in lines {
            if NO_CHARGEBACKS.is_match(line) {
                ledger.no_chargebacks = true;
                continue;
            }
            if NO_FRAUD.is_match(line) {
                ledger.no_fraud = true;
                continue;
            }
            if let Some(next) = match_heading(line, HEADINGS) {
                if next != section {
                    debug!("{:?} -> {:?} at {:?}", section, next, line);
                    ledger.interchange.leave();
                    section = next;
                }
                continue;
            }
            if ledger.tc40_line.is_none() && TC40_LINE.is_match(line) {
                ledger.tc40_line = row_count(line);
            }

            match section {
                Section::PlanSummary => ledger.plan_row(line),
                Section::ActivitySummary => ledger.activity_row(line),
                Section::InterchangeDetail => ledger.interchange.row(line, true),
                Section::Chargebacks => ledger.chargebacks.row(line),
                Section::Fraud => ledger.fraud.row(line),
                Section::Neutral | Section::Adjustments | Section::Other => {}
            }
        }

        ledger
    }

    fn plan_row(&mut self, line: &str) {
        if is_column_header(line) || is_adjustment_row(line) {
            return;
        }
        if is_total_row(line) {
            if self.plan_total.is_none() {
                self.plan_total = row_count(line);
            }
            return;
        }
        if let Some(brand) = brand_prefix(line, true) {
            if let Some(count) = row_count(line) {
                self.plan_brands.add(brand, count);
            }
        }
    }

    fn overflowed(&self) -> bool {
        self.plan_brands.overflowed()
            || self.interchange.overflowed()
            || self.chargebacks.overflowed()
            || self.fraud.overflowed()
    }

    fn activity_row(&mut self, line: &str) {
        if is_column_header(line) || is_adjustment_row(line) {
            return;
        }
        if is_cnp_label(line) {
            if self.activity_cnp.is_none() {
                self.activity_cnp = row_count(line);
            }
            return;
        }
        let lower = line.to_lowercase();
        let is_sales = ["total sales", "total gross sales", "gross sales", "sales"]
            .iter()
            .any(|label| lower.starts_with(label));
        if is_sales && self.activity_sales.is_none() {
            self.activity_sales = row_count(line);
        }
    }
}

struct BrandQuery<'a> {
    ledger: &'a Ledger,
    brand: CardBrand,
}

fn plan_total_row(l: &Ledger) -> Option<u64> {
    l.plan_total
}

fn activity_total_sales(l: &Ledger) -> Option<u64> {
    l.activity_sales
}

fn plan_rows_sum(l: &Ledger) -> Option<u64> {
    l.plan_brands.total()
}

fn plan_brand_row(q: &BrandQuery<'_>) -> Option<u64> {
    q.ledger.plan_brands.get(q.brand)
}

fn interchange_brand_total(q: &BrandQuery<'_>) -> Option<u64> {
    q.ledger.interchange.brand_totals.get(q.brand)
}

fn interchange_brand_categories(q: &BrandQuery<'_>) -> Option<u64> {
    q.ledger.interchange.brand_categories.get(q.brand)
}

fn activity_cnp_line(l: &Ledger) -> Option<u64> {
    l.activity_cnp
}

fn cnp_interchange_categories(l: &Ledger) -> Option<u64> {
    l.interchange.cnp_categories.get()
}

fn no_chargebacks_phrase(l: &Ledger) -> Option<u64> {
    l.no_chargebacks.then_some(0)
}

fn chargeback_total_row(l: &Ledger) -> Option<u64> {
    l.chargebacks.total_count
}

fn itemized_chargebacks(l: &Ledger) -> Option<u64> {
    l.chargebacks.counted_items()
}

fn no_fraud_phrase(l: &Ledger) -> Option<u64> {
    l.no_fraud.then_some(0)
}

fn fraud_total_row(l: &Ledger) -> Option<u64> {
    l.fraud.total_count
}

fn tc40_labeled_line(l: &Ledger) -> Option<u64> {
    l.tc40_line
}

fn itemized_fraud(l: &Ledger) -> Option<u64> {
    l.fraud.counted_items()
}

fn fraud_total_amount(l: &Ledger) -> Option<Decimal> {
    l.fraud.total_amount
}

fn no_fraud_amount(l: &Ledger) -> Option<Decimal> {
    l.no_fraud.then_some(Decimal::ZERO)
}

fn itemized_fraud_amount(l: &Ledger) -> Option<Decimal> {
    l.fraud.item_amount()
}

fn brand_strategies<'a>() -> [Strategy<BrandQuery<'a>, u64>; 3] {
    [
        Strategy::new("plan brand row", plan_brand_row),
        Strategy::new("interchange brand total", interchange_brand_total)
            .with_caveat("taken from the interchange brand total"),
        Strategy::new("interchange brand categories", interchange_brand_categories)
            .with_caveat("summed from interchange category lines"),
    ]
}

/// Extractor for the plan summary layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanSummaryExtractor;

impl DialectExtractor for PlanSummaryExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::PlanSummary
    }

    fn extract(&self, lines: &[String]) -> DialectOutcome {
        let ledger = Ledger::walk(lines);
        let mut warnings = Vec::new();
        let mut fields = CanonicalFields::empty();

        fields.total_sales_count = resolve(
            FieldName::TotalSalesCount,
            &ledger,
            &[
                Strategy::new("plan total row", plan_total_row),
                Strategy::new("activity total sales", activity_total_sales),
                Strategy::new("plan rows", plan_rows_sum)
                    .with_caveat("summed from plan rows, no Total row printed"),
            ],
            &mut warnings,
        );

        fields.visa_txn_count = resolve(
            FieldName::VisaTxnCount,
            &BrandQuery { ledger: &ledger, brand: CardBrand::Visa },
            &brand_strategies(),
            &mut warnings,
        );
        fields.mastercard_txn_count = resolve(
            FieldName::MastercardTxnCount,
            &BrandQuery { ledger: &ledger, brand: CardBrand::Mastercard },
            &brand_strategies(),
            &mut warnings,
        );

        fields.cnp_txn_count = resolve(
            FieldName::CnpTxnCount,
            &ledger,
            &[
                Strategy::new("activity card-not-present line", activity_cnp_line),
                Strategy::new("card-not-present interchange categories", cnp_interchange_categories)
                    .with_caveat("summed from card-not-present interchange categories"),
            ],
            &mut warnings,
        );

        fields.tc15_count = resolve(
            FieldName::Tc15Count,
            &ledger,
            &[
                Strategy::new("no-chargebacks statement", no_chargebacks_phrase),
                Strategy::new("chargeback activity total", chargeback_total_row),
                Strategy::new("itemized chargebacks", itemized_chargebacks)
                    .with_caveat("counted from itemized chargeback rows"),
            ],
            &mut warnings,
        );

        fields.tc40_count = resolve(
            FieldName::Tc40Count,
            &ledger,
            &[
                Strategy::new("no-fraud statement", no_fraud_phrase),
                Strategy::new("fraud activity total", fraud_total_row),
                Strategy::new("TC40 line", tc40_labeled_line),
                Strategy::new("itemized fraud", itemized_fraud)
                    .with_caveat("counted from itemized fraud rows"),
            ],
            &mut warnings,
        );

        fields.fraud_amount_usd = resolve(
            FieldName::FraudAmountUsd,
            &ledger,
            &[
                Strategy::new("no-fraud statement", no_fraud_amount),
                Strategy::new("fraud activity total amount", fraud_total_amount),
                Strategy::new("itemized fraud amounts", itemized_fraud_amount)
                    .with_caveat("summed from itemized fraud rows"),
            ],
            &mut warnings,
        );

        if ledger.overflowed() {
            warnings.push(OVERFLOW_WARNING.to_string());
        }

        fields.total_sales_volume = FieldValue::from_option(scan_labeled_amount(lines, VOLUME_LABELS));
        fields.statement_period = scan_period(lines, PERIOD_LABELS);

        DialectOutcome {
            evidence: fields.resolved_count(),
            fields,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect()
    }

    const STATEMENT: &str = "
        MONTHLY MERCHANT REPORT
        Reporting Period: April 1, 2024 - April 30, 2024
        PLAN SUMMARY
        Plan Code Items Amount
        VS 310 $31,000.00
        MC 150 $15,000.00
        DS 40 $4,000.00
        Total 500 $50,000.00
        ACTIVITY SUMMARY
        Total Gross Sales 500 $50,000.00
        Keyed Transactions 45
        CHARGEBACK ACTIVITY
        04/03 556677 ($120.00) Item not received
        04/21 556901 ($80.00) Fraud
        Total Chargebacks 2 ($200.00)
        FRAUD ACTIVITY
        04/11 TC40 advice $300.00
        Total Fraud 1 $300.00
    ";

    #[test]
    fn test_plan_summary_layout() {
        let outcome = PlanSummaryExtractor.extract(&lines(STATEMENT));
        let f = &outcome.fields;

        assert_eq!(f.total_sales_count, FieldValue::Value(500));
        assert_eq!(f.visa_txn_count, FieldValue::Value(310));
        assert_eq!(f.mastercard_txn_count, FieldValue::Value(150));
        assert_eq!(f.cnp_txn_count, FieldValue::Value(45));
        assert_eq!(f.tc15_count, FieldValue::Value(2));
        assert_eq!(f.tc40_count, FieldValue::Value(1));
        assert_eq!(f.fraud_amount_usd, FieldValue::Value(Decimal::new(30000, 2)));
        assert_eq!(f.total_sales_volume, FieldValue::Value(Decimal::new(5000000, 2)));
        assert_eq!(f.statement_period.as_ref().map(|p| p.sort_key()), Some((2024, 4)));
        assert_eq!(outcome.evidence, 9);
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    }

    #[test]
    fn test_no_fraud_phrase() {
        let doc = lines(
            "
            PLAN SUMMARY
            VS 10 $100.00
            FRAUD ACTIVITY
            No fraud activity reported for this period
            ",
        );
        let outcome = PlanSummaryExtractor.extract(&doc);

        assert_eq!(outcome.fields.tc40_count, FieldValue::Zero);
        assert_eq!(outcome.fields.fraud_amount_usd, FieldValue::Zero);
        assert_eq!(outcome.fields.tc15_count, FieldValue::NotFound);
        assert_eq!(outcome.fields.total_sales_count, FieldValue::Value(10));
    }

    #[test]
    fn test_brand_falls_back_to_interchange() {
        let doc = lines(
            "
            INTERCHANGE/PROGRAM FEES
            VS CPS RETAIL 60 $6,000.00 1.51%
            VS CNP 15 $1,500.00 1.80%
            MC MERIT III 25 $2,500.00 1.58%
            ",
        );
        let outcome = PlanSummaryExtractor.extract(&doc);

        assert_eq!(outcome.fields.visa_txn_count, FieldValue::Value(75));
        assert_eq!(outcome.fields.mastercard_txn_count, FieldValue::Value(25));
        assert_eq!(outcome.fields.cnp_txn_count, FieldValue::Value(15));
        assert_eq!(outcome.fields.total_sales_count, FieldValue::NotFound);
        assert!(outcome.warnings.iter().any(|w| w.starts_with("Visa transaction count")));
    }
}
