//! Row tallies for sections both dialects print the same way.

use rust_decimal::Decimal;

use crate::statement::rows::{
    brand_heading, brand_prefix, brand_total, is_adjustment_row, is_cnp_category, is_column_header,
    is_dated_row, is_total_row, BrandCounts, CardBrand, RunningCount,
};
use crate::statement::rules::{row_amount, row_count};

/// Notice for a document whose row sums overflowed.
pub const OVERFLOW_WARNING: &str =
    "Some rows add up to more than can be represented; those sums were left unresolved";

/// Interchange detail: category lines grouped under brand sub-headings,
/// with per-brand and grand totals.
#[derive(Debug, Default)]
pub struct InterchangeTally {
    pub total: Option<u64>,
    pub brand_totals: BrandCounts,
    pub brand_categories: BrandCounts,
    pub category_sum: RunningCount,
    pub cnp_categories: RunningCount,
    current_brand: Option<CardBrand>,
}

impl InterchangeTally {
    pub fn row(&mut self, line: &str, codes: bool) {
        if is_column_header(line) || is_adjustment_row(line) {
            return;
        }
        if let Some(brand) = brand_total(line) {
            if let Some(count) = row_count(line) {
                self.brand_totals.add(brand, count);
            }
            return;
        }
        if is_total_row(line) {
            if self.total.is_none() {
                self.total = row_count(line);
            }
            return;
        }
        if let Some(brand) = brand_heading(line) {
            self.current_brand = Some(brand);
            return;
        }

        let Some(count) = row_count(line) else {
            return;
        };
        if let Some(brand) = brand_prefix(line, codes).or(self.current_brand) {
            self.brand_categories.add(brand, count);
        }
        self.category_sum.add(count);
        if is_cnp_category(line) {
            self.cnp_categories.add(count);
        }
    }

    /// Whether any running sum overflowed.
    pub fn overflowed(&self) -> bool {
        self.category_sum.overflowed()
            || self.cnp_categories.overflowed()
            || self.brand_totals.overflowed()
            || self.brand_categories.overflowed()
    }

    /// Close a sub-heading scope when the section ends.
    pub fn leave(&mut self) {
        self.current_brand = None;
    }
}

/// A section of itemized, dated rows closed by a total row. Chargeback and
/// fraud activity both print this way.
#[derive(Debug, Default)]
pub struct ItemizedTally {
    pub total_count: Option<u64>,
    pub total_amount: Option<Decimal>,
    pub items: u64,
    item_amount: Option<Decimal>,
    amount_overflowed: bool,
    total_seen: bool,
}

impl ItemizedTally {
    pub fn row(&mut self, line: &str) {
        if is_column_header(line) || is_adjustment_row(line) {
            return;
        }
        if is_total_row(line) {
            if !self.total_seen {
                self.total_seen = true;
                self.total_count = row_count(line);
                self.total_amount = row_amount(line);
            }
            return;
        }
        if is_dated_row(line) {
            self.items = self.items.saturating_add(1);
            if let Some(amount) = row_amount(line) {
                self.add_amount(amount.abs());
            }
        }
    }

    fn add_amount(&mut self, amount: Decimal) {
        if self.amount_overflowed {
            return;
        }
        match self.item_amount.unwrap_or(Decimal::ZERO).checked_add(amount) {
            Some(sum) => self.item_amount = Some(sum),
            None => {
                self.item_amount = None;
                self.amount_overflowed = true;
            }
        }
    }

    /// Sum of itemized amounts, `None` when no row carried an amount or the
    /// sum overflowed.
    pub fn item_amount(&self) -> Option<Decimal> {
        self.item_amount
    }

    pub fn overflowed(&self) -> bool {
        self.amount_overflowed
    }

    /// Item count, `None` when no dated rows were seen.
    pub fn counted_items(&self) -> Option<u64> {
        (self.items > 0).then_some(self.items)
    }
}
