//! Row classification shared by the dialect state machines.

use super::rules::numbers::counts_in_line;
use super::rules::patterns::{ADJUSTMENT_ROW, CNP_CATEGORY, DATED_ROW};

/// Card networks that appear as row labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardBrand {
    Visa,
    Mastercard,
    Discover,
    Amex,
    Debit,
}

impl CardBrand {
    /// Match a row label token. Two-letter plan codes are only honored when
    /// `codes` is set, since "MC" or "DB" mean other things in running text.
    fn from_token(token: &str, codes: bool) -> Option<Self> {
        let token = token.trim_end_matches([':', ',']).to_lowercase();
        let brand = match token.as_str() {
            "visa" => CardBrand::Visa,
            "mastercard" | "master" | "mastercard®" => CardBrand::Mastercard,
            "discover" => CardBrand::Discover,
            "amex" | "american" => CardBrand::Amex,
            "debit" | "pin" => CardBrand::Debit,
            "vs" | "vi" if codes => CardBrand::Visa,
            "mc" if codes => CardBrand::Mastercard,
            "ds" | "di" if codes => CardBrand::Discover,
            "ax" | "am" if codes => CardBrand::Amex,
            "db" if codes => CardBrand::Debit,
            _ => return None,
        };
        Some(brand)
    }
}

/// The brand a row is labeled with, looking only at its first token.
pub fn brand_prefix(line: &str, codes: bool) -> Option<CardBrand> {
    line.split_whitespace()
        .next()
        .and_then(|token| CardBrand::from_token(token, codes))
}

/// A line that is just a brand name, used as a sub-heading.
pub fn brand_heading(line: &str) -> Option<CardBrand> {
    let mut tokens = line.split_whitespace();
    let brand = CardBrand::from_token(tokens.next()?, false)?;
    let rest: Vec<&str> = tokens.collect();
    let plain = rest.iter().all(|t| !t.chars().any(|c| c.is_ascii_digit() || c == '$'));
    (plain && rest.len() <= 2).then_some(brand)
}

/// The brand of a "Total Visa" or "Visa Total" row.
pub fn brand_total(line: &str) -> Option<CardBrand> {
    let lower = line.to_lowercase();
    let mut tokens = lower.split_whitespace();
    let first = tokens.next()?;
    let second = tokens.next()?;
    if first == "total" {
        CardBrand::from_token(second, false)
    } else if second == "total" || second == "totals" {
        CardBrand::from_token(first, false)
    } else {
        None
    }
}

/// Rows that sum their section.
pub fn is_total_row(line: &str) -> bool {
    let lower = line.trim_start().to_lowercase();
    lower.starts_with("total") || lower.starts_with("grand total") || lower.starts_with("totals")
}

/// Manual corrections. They never count toward a field.
pub fn is_adjustment_row(line: &str) -> bool {
    ADJUSTMENT_ROW.is_match(line)
}

/// Column header rows carry column names and no counts.
pub fn is_column_header(line: &str) -> bool {
    const COLUMN_WORDS: [&str; 10] = [
        "count", "items", "amount", "volume", "rate", "fee", "fees", "sales", "card type", "description",
    ];
    let lower = line.to_lowercase();
    let words = COLUMN_WORDS.iter().filter(|w| lower.contains(*w)).count();
    words >= 2 && counts_in_line(line).is_empty() && !lower.chars().any(|c| c == '$')
}

/// Itemized rows start with a transaction date.
pub fn is_dated_row(line: &str) -> bool {
    DATED_ROW.is_match(line.trim_start())
}

/// Category labels for keyed, e-commerce and mail/phone transactions.
pub fn is_cnp_category(line: &str) -> bool {
    CNP_CATEGORY.is_match(line)
}

/// Summary lines labeled as card-not-present, e.g. "Keyed Transactions 40".
pub fn is_cnp_label(line: &str) -> bool {
    CNP_CATEGORY
        .find(line.trim_start())
        .is_some_and(|m| m.start() == 0)
}

/// Match a section heading: the line starts with one of the phrases and
/// carries no digits.
pub fn match_heading<S: Copy>(line: &str, headings: &[(&str, S)]) -> Option<S> {
    if line.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    let lower = line.trim().trim_end_matches(':').to_lowercase();
    headings
        .iter()
        .find(|(phrase, _)| lower.starts_with(phrase))
        .map(|(_, section)| *section)
}

/// A running row count. Once a sum overflows it stays unresolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RunningCount {
    #[default]
    Empty,
    Counted(u64),
    Overflowed,
}

impl RunningCount {
    pub fn add(&mut self, count: u64) {
        *self = match *self {
            RunningCount::Empty => RunningCount::Counted(count),
            RunningCount::Counted(total) => total
                .checked_add(count)
                .map_or(RunningCount::Overflowed, RunningCount::Counted),
            RunningCount::Overflowed => RunningCount::Overflowed,
        };
    }

    pub fn get(&self) -> Option<u64> {
        match self {
            RunningCount::Counted(total) => Some(*total),
            _ => None,
        }
    }

    pub fn overflowed(&self) -> bool {
        matches!(self, RunningCount::Overflowed)
    }
}

/// Running counts per brand, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct BrandCounts(Vec<(CardBrand, RunningCount)>);

impl BrandCounts {
    pub fn add(&mut self, brand: CardBrand, count: u64) {
        match self.0.iter_mut().find(|(b, _)| *b == brand) {
            Some((_, total)) => total.add(count),
            None => {
                let mut total = RunningCount::Empty;
                total.add(count);
                self.0.push((brand, total));
            }
        }
    }

    pub fn get(&self, brand: CardBrand) -> Option<u64> {
        self.0.iter().find(|(b, _)| *b == brand).and_then(|(_, c)| c.get())
    }

    /// Sum of every brand, `None` when nothing was recorded or the sum
    /// overflowed.
    pub fn total(&self) -> Option<u64> {
        let mut sum = RunningCount::Empty;
        for (_, count) in &self.0 {
            sum.add(count.get()?);
        }
        sum.get()
    }

    pub fn overflowed(&self) -> bool {
        !self.0.is_empty() && self.total().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Section {
        Fees,
        Chargebacks,
    }

    #[test]
    fn test_brand_prefix() {
        assert_eq!(brand_prefix("Visa 120 $12,000.00", false), Some(CardBrand::Visa));
        assert_eq!(brand_prefix("MC 80 $8,000.00", false), None);
        assert_eq!(brand_prefix("MC 80 $8,000.00", true), Some(CardBrand::Mastercard));
        assert_eq!(brand_prefix("Total 200", true), None);
    }

    #[test]
    fn test_brand_total() {
        assert_eq!(brand_total("Total Visa 120 $12,000.00"), Some(CardBrand::Visa));
        assert_eq!(brand_total("Mastercard Total 80"), Some(CardBrand::Mastercard));
        assert_eq!(brand_total("Total 200"), None);
    }

    #[test]
    fn test_headings() {
        let headings = [("fees", Section::Fees), ("chargebacks/reversals", Section::Chargebacks)];
        assert_eq!(match_heading("FEES", &headings), Some(Section::Fees));
        assert_eq!(match_heading("Chargebacks/Reversals:", &headings), Some(Section::Chargebacks));
        assert_eq!(match_heading("Fees 12 $3.00", &headings), None);
        assert_eq!(match_heading("Total Fees", &headings), None);
    }

    #[test]
    fn test_row_kinds() {
        assert!(is_total_row("TOTAL 200 $20,000.00"));
        assert!(is_adjustment_row("Visa Adjustment 3 $10.00"));
        assert!(is_column_header("Card Type Items Amount"));
        assert!(!is_column_header("Visa 120 $12,000.00"));
        assert!(is_dated_row("03/14 Chargeback 1234 $50.00"));
        assert!(is_cnp_category("VISA CNP/E-COMMERCE 15 $900.00"));
        assert_eq!(brand_heading("VISA"), Some(CardBrand::Visa));
        assert_eq!(brand_heading("Visa 12"), None);
    }

    #[test]
    fn test_brand_counts() {
        let mut counts = BrandCounts::default();
        assert_eq!(counts.total(), None);
        counts.add(CardBrand::Visa, 100);
        counts.add(CardBrand::Mastercard, 80);
        counts.add(CardBrand::Visa, 20);
        assert_eq!(counts.get(CardBrand::Visa), Some(120));
        assert_eq!(counts.total(), Some(200));
        assert!(!counts.overflowed());
    }

    #[test]
    fn test_brand_counts_overflow_is_unresolved() {
        let mut counts = BrandCounts::default();
        counts.add(CardBrand::Visa, u64::MAX);
        counts.add(CardBrand::Visa, 1);
        counts.add(CardBrand::Visa, 5);
        counts.add(CardBrand::Mastercard, 80);

        assert_eq!(counts.get(CardBrand::Visa), None);
        assert_eq!(counts.get(CardBrand::Mastercard), Some(80));
        assert_eq!(counts.total(), None);
        assert!(counts.overflowed());

        let mut across = BrandCounts::default();
        across.add(CardBrand::Visa, u64::MAX);
        across.add(CardBrand::Mastercard, 1);
        assert_eq!(across.get(CardBrand::Visa), Some(u64::MAX));
        assert_eq!(across.total(), None);
        assert!(across.overflowed());
    }
}
