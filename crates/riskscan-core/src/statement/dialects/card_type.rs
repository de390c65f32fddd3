//! Card-type summary layout.
//!
//! A summary-by-card-type table with one row per network and a Total row,
//! an interchange detail section, and a chargebacks/reversals section. This
//! layout never reports fraud advices.

use tracing::debug;

use super::tally::{InterchangeTally, ItemizedTally, OVERFLOW_WARNING};
use super::{DialectExtractor, DialectOutcome};
use crate::models::{CanonicalFields, Dialect, FieldName, FieldValue};
use crate::statement::rows::{
    brand_prefix, is_adjustment_row, is_cnp_label, is_column_header, is_total_row, match_heading,
    BrandCounts, CardBrand,
};
use crate::statement::rules::patterns::NO_CHARGEBACKS;
use crate::statement::rules::{resolve, row_count, scan_labeled_amount, scan_period, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Neutral,
    CardTypeBreakdown,
    InterchangeDetail,
    Chargebacks,
    Adjustments,
    Fees,
    Other,
}

const HEADINGS: &[(&str, Section)] = &[
    ("summary by card type", Section::CardTypeBreakdown),
    ("card type summary", Section::CardTypeBreakdown),
    ("interchange charges", Section::InterchangeDetail),
    ("interchange detail", Section::InterchangeDetail),
    ("chargebacks/reversals", Section::Chargebacks),
    ("chargebacks / reversals", Section::Chargebacks),
    ("adjustments", Section::Adjustments),
    ("fees", Section::Fees),
    ("deposits", Section::Other),
    ("batch detail", Section::Other),
    ("account summary", Section::Neutral),
];

const VOLUME_LABELS: &[&str] = &["amounts submitted", "gross sales", "total sales"];
const PERIOD_LABELS: &[&str] = &["statement period", "period covered", "processing month"];

#[derive(Debug, Default)]
struct Ledger {
    card_total: Option<u64>,
    card_brands: BrandCounts,
    cnp_summary: Option<u64>,
    interchange: InterchangeTally,
    chargebacks: ItemizedTally,
    no_chargebacks: bool,
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
            if let Some(next) = match_heading(line, HEADINGS) {
                if next != section {
                    debug!("{:?} -> {:?} at {:?}", section, next, line);
                    ledger.interchange.leave();
                    section = next;
                }
                continue;
            }

            match section {
                Section::CardTypeBreakdown => ledger.card_type_row(line),
                Section::InterchangeDetail => ledger.interchange.row(line, false),
                Section::Chargebacks => ledger.chargebacks.row(line),
                Section::Neutral => ledger.summary_row(line),
                Section::Adjustments | Section::Fees | Section::Other => {}
            }
        }

        ledger
    }

    fn card_type_row(&mut self, line: &str) {
        if is_column_header(line) || is_adjustment_row(line) {
            return;
        }
        if is_total_row(line) {
            if self.card_total.is_none() {
                self.card_total = row_count(line);
            }
            return;
        }
        if let Some(brand) = brand_prefix(line, false) {
            if let Some(count) = row_count(line) {
                self.card_brands.add(brand, count);
            }
            return;
        }
        self.summary_row(line);
    }

    fn overflowed(&self) -> bool {
        self.card_brands.overflowed() || self.interchange.overflowed()
    }

    fn summary_row(&mut self, line: &str) {
        if self.cnp_summary.is_none() && is_cnp_label(line) {
            self.cnp_summary = row_count(line);
        }
    }
}

struct BrandQuery<'a> {
    ledger: &'a Ledger,
    brand: CardBrand,
}

fn card_total_row(l: &Ledger) -> Option<u64> {
    l.card_total
}

fn interchange_total_row(l: &Ledger) -> Option<u64> {
    l.interchange.total
}

fn card_rows_sum(l: &Ledger) -> Option<u64> {
    l.card_brands.total()
}

fn interchange_category_sum(l: &Ledger) -> Option<u64> {
    l.interchange.category_sum.get()
}

fn card_brand_row(q: &BrandQuery<'_>) -> Option<u64> {
    q.ledger.card_brands.get(q.brand)
}

fn interchange_brand_total(q: &BrandQuery<'_>) -> Option<u64> {
    q.ledger.interchange.brand_totals.get(q.brand)
}

fn interchange_brand_categories(q: &BrandQuery<'_>) -> Option<u64> {
    q.ledger.interchange.brand_categories.get(q.brand)
}

fn cnp_summary_line(l: &Ledger) -> Option<u64> {
    l.cnp_summary
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

fn brand_strategies<'a>() -> [Strategy<BrandQuery<'a>, u64>; 3] {
    [
        Strategy::new("card-type brand row", card_brand_row),
        Strategy::new("interchange brand total", interchange_brand_total)
            .with_caveat("taken from the interchange brand total"),
        Strategy::new("interchange brand categories", interchange_brand_categories)
            .with_caveat("summed from interchange category lines"),
    ]
}

/// Extractor for the card-type summary layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct CardTypeSummaryExtractor;

impl DialectExtractor for CardTypeSummaryExtractor {
    fn dialect(&self) -> Dialect {
        Dialect::CardTypeSummary
    }

    fn extract(&self, lines: &[String]) -> DialectOutcome {
        let ledger = Ledger::walk(lines);
        let mut warnings = Vec::new();
        let mut fields = CanonicalFields::empty();

        fields.total_sales_count = resolve(
            FieldName::TotalSalesCount,
            &ledger,
            &[
                Strategy::new("card-type total row", card_total_row),
                Strategy::new("interchange total row", interchange_total_row)
                    .with_caveat("taken from the interchange section total"),
                Strategy::new("card-type rows", card_rows_sum)
                    .with_caveat("summed from card-type rows, no Total row printed"),
                Strategy::new("interchange categories", interchange_category_sum)
                    .with_caveat("summed from interchange category lines"),
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
                Strategy::new("card-not-present summary line", cnp_summary_line),
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
                Strategy::new("chargeback total row", chargeback_total_row),
                Strategy::new("itemized chargebacks", itemized_chargebacks)
                    .with_caveat("counted from itemized chargeback rows"),
            ],
            &mut warnings,
        );

        if ledger.overflowed() {
            warnings.push(OVERFLOW_WARNING.to_string());
        }

        fields.total_sales_volume = FieldValue::from_option(scan_labeled_amount(lines, VOLUME_LABELS));
        fields.statement_period = scan_period(lines, PERIOD_LABELS);

        let evidence = fields.resolved_count();

        fields.tc40_count = FieldValue::Zero;
        warnings.push(
            "Fraud report count (TC40) is not printed on this statement layout; recorded as 0".to_string(),
        );

        DialectOutcome {
            fields,
            warnings,
            evidence,
        }
    }
}
