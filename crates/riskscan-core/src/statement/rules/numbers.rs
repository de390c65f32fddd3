//! Number extraction from statement text.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::patterns::{COUNT_TOKEN, COUNT_TOKEN_LENIENT, CURRENCY_DIGITS, LEADING_NUMBER};

/// Punctuation that trails tokens in running text.
fn strip_token(token: &str) -> &str {
    token.trim().trim_end_matches([',', ';', ':'])
}

/// Parse a transaction count such as `1,234`. A zero fraction (`45.00`) is
/// accepted, as spreadsheets export counts that way; anything else with a
/// decimal point, currency sign or percent is not a count.
pub fn parse_count(token: &str) -> Option<u64> {
    let token = strip_token(token);
    if !COUNT_TOKEN_LENIENT.is_match(token) {
        return None;
    }
    let integer = token.split('.').next()?.replace(',', "");
    integer.parse().ok()
}

/// Strict row-level count: digits with optional thousands separators only.
pub fn is_count_token(token: &str) -> bool {
    COUNT_TOKEN.is_match(strip_token(token))
}

/// Parse a currency amount. Accepts `$`, `USD`, thousands separators and
/// decimals; `-1.00`, `1.00-` and `(1.00)` are negative.
pub fn parse_currency(token: &str) -> Option<Decimal> {
    let mut s = strip_token(token).trim().to_string();
    let mut negative = false;

    if s.starts_with('(') && s.ends_with(')') && s.len() > 2 {
        negative = true;
        s = s[1..s.len() - 1].trim().to_string();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim().to_string();
    }
    if let Some(rest) = s.strip_suffix('-') {
        negative = true;
        s = rest.trim().to_string();
    }
    for affix in ["USD", "usd"] {
        if let Some(rest) = s.strip_prefix(affix) {
            s = rest.trim().to_string();
        }
        if let Some(rest) = s.strip_suffix(affix) {
            s = rest.trim().to_string();
        }
    }
    if let Some(rest) = s.strip_prefix('$') {
        s = rest.trim().to_string();
    }
    if let Some(rest) = s.strip_prefix('-') {
        negative = true;
        s = rest.trim().to_string();
    }

    if !CURRENCY_DIGITS.is_match(&s) {
        return None;
    }

    let value = Decimal::from_str(&s.replace(',', "")).ok()?;
    Some(if negative { -value } else { value })
}

/// Whether a token reads as money rather than a count: it carries a
/// currency sign, parentheses, or a decimal fraction.
pub fn is_amount_token(token: &str) -> bool {
    let t = strip_token(token);
    let looks_monetary = t.contains('$') || t.contains('.') || (t.starts_with('(') && t.ends_with(')'));
    looks_monetary && !t.ends_with('%') && parse_currency(t).is_some()
}

/// All count tokens of a line, in order.
pub fn counts_in_line(line: &str) -> Vec<u64> {
    line.split_whitespace()
        .filter(|t| is_count_token(t))
        .filter_map(parse_count)
        .collect()
}

/// All money tokens of a line, in order.
pub fn amounts_in_line(line: &str) -> Vec<Decimal> {
    let mut amounts = Vec::new();
    let mut tokens = line.split_whitespace().peekable();

    while let Some(token) = tokens.next() {
        // "$ 1,234.00" splits into two tokens
        if token == "$" || token == "-$" {
            if let Some(next) = tokens.peek() {
                if let Some(v) = parse_currency(next) {
                    amounts.push(if token == "-$" { -v } else { v });
                    tokens.next();
                }
            }
            continue;
        }
        if is_amount_token(token) {
            if let Some(v) = parse_currency(token) {
                amounts.push(v);
            }
        }
    }

    amounts
}

/// The count column of a table row: the last count token before the first
/// money token, or the last count token when the row has no money.
///
/// Statement rows read "description, count, amount, rate, fee", and
/// descriptions often contain small numbers of their own
/// ("CPS/RETAIL 2 45 $1,234.56" has count 45).
pub fn row_count(line: &str) -> Option<u64> {
    let mut last_count = None;
    for token in line.split_whitespace() {
        if is_amount_token(token) || token == "$" {
            break;
        }
        if is_count_token(token) {
            last_count = parse_count(token);
        }
    }
    last_count
}

/// The first money value on a row.
pub fn row_amount(line: &str) -> Option<Decimal> {
    amounts_in_line(line).into_iter().next()
}

/// A number at the very start of a line.
pub fn first_number(line: &str) -> Option<Decimal> {
    let caps = LEADING_NUMBER.captures(line.trim())?;
    parse_currency(&caps[1])
}

/// A non-negative integral decimal as a count.
pub fn decimal_to_count(value: Decimal) -> Option<u64> {
    let value = value.abs();
    if value.fract().is_zero() {
        value.to_u64()
    } else {
        None
    }
}
