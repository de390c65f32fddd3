//! Extraction rules shared by the dialect extractors.
//!
//! A field is resolved by an ordered list of [`Strategy`] values. The first
//! strategy that yields a value wins and later ones never run.

pub mod numbers;
pub mod patterns;
pub mod period;

use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{FieldName, FieldValue, Quantity};

pub use numbers::{
    amounts_in_line, counts_in_line, decimal_to_count, first_number, parse_count, parse_currency,
    row_amount, row_count,
};
pub use period::{extract_period, period_from_filename, scan_period};

/// One way of reading a field from an input.
pub struct Strategy<I: ?Sized, T> {
    /// Name used in debug logs.
    pub name: &'static str,
    /// The reading. `None` means this strategy found no evidence.
    pub run: fn(&I) -> Option<T>,
    /// Warning attached when this strategy is the one that resolves the
    /// field, for readings that need a human to double-check them.
    pub caveat: Option<&'static str>,
}

impl<I: ?Sized, T> Strategy<I, T> {
    pub fn new(name: &'static str, run: fn(&I) -> Option<T>) -> Self {
        Self {
            name,
            run,
            caveat: None,
        }
    }

    pub fn with_caveat(mut self, caveat: &'static str) -> Self {
        self.caveat = Some(caveat);
        self
    }
}

/// The value a strategy list produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub strategy: &'static str,
    pub caveat: Option<&'static str>,
}

/// Try strategies in order and stop at the first that yields a value.
pub fn first_match<I: ?Sized, T>(input: &I, strategies: &[Strategy<I, T>]) -> Option<Resolved<T>> {
    strategies.iter().find_map(|strategy| {
        (strategy.run)(input).map(|value| Resolved {
            value,
            strategy: strategy.name,
            caveat: strategy.caveat,
        })
    })
}

/// Resolve a field, recording the caveat of the winning strategy.
pub fn resolve<I: ?Sized, T: Quantity>(
    field: FieldName,
    input: &I,
    strategies: &[Strategy<I, T>],
    warnings: &mut Vec<String>,
) -> FieldValue<T> {
    match first_match(input, strategies) {
        Some(resolved) => {
            debug!("{} resolved by {}: {:?}", field, resolved.strategy, resolved.value);
            if let Some(caveat) = resolved.caveat {
                warnings.push(format!("{}: {} - verify", capitalize(field.label()), caveat));
            }
            FieldValue::found(resolved.value)
        }
        None => {
            debug!("{} not resolved", field);
            FieldValue::NotFound
        }
    }
}

pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// First money value on a line whose lowercase text contains one of the
/// labels, or the leading number of the line after it.
pub fn scan_labeled_amount(lines: &[String], labels: &[&str]) -> Option<Decimal> {
    for label in labels {
        for (i, line) in lines.iter().enumerate() {
            if !line.to_lowercase().contains(label) {
                continue;
            }
            if let Some(amount) = row_amount(line) {
                return Some(amount);
            }
            if let Some(amount) = lines.get(i + 1).and_then(|next| first_number(next)) {
                return Some(amount);
            }
        }
    }
    None
}
