//! Statement period recognition.

use std::path::Path;

use chrono::{Datelike, NaiveDate};
use regex::Captures;

use super::patterns::{
    DATE_RANGE_ISO, DATE_RANGE_LONG, DATE_RANGE_US, DATE_US, MONTH_YEAR, MONTH_YEAR_NUMERIC,
    NO_CHARGEBACKS, NO_FRAUD, YEAR_MONTH_COMPACT, YEAR_MONTH_NUMERIC,
};
use crate::models::StatementPeriod;

/// Month index from an English month name or abbreviation.
pub fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.trim_end_matches('.').to_lowercase();
    let month = match lower.get(..3)? {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Two-digit years are read as 20xx.
fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.parse().ok()?;
    if s.len() == 2 {
        Some(2000 + year)
    } else {
        Some(year)
    }
}

fn number<T: std::str::FromStr>(caps: &Captures<'_>, i: usize) -> Option<T> {
    caps.get(i)?.as_str().parse().ok()
}

fn us_date(caps: &Captures<'_>, first: usize) -> Option<NaiveDate> {
    let month = number(caps, first)?;
    let day = number(caps, first + 1)?;
    let year = parse_year(caps.get(first + 2)?.as_str())?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn iso_date(caps: &Captures<'_>, first: usize) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(number(caps, first)?, number(caps, first + 1)?, number(caps, first + 2)?)
}

fn long_date(caps: &Captures<'_>, first: usize) -> Option<NaiveDate> {
    let month = month_from_name(caps.get(first)?.as_str())?;
    NaiveDate::from_ymd_opt(number(caps, first + 2)?, month, number(caps, first + 1)?)
}

fn range_period(
    caps: Option<Captures<'_>>,
    date: fn(&Captures<'_>, usize) -> Option<NaiveDate>,
) -> Option<StatementPeriod> {
    let caps = caps?;
    let start = date(&caps, 1)?;
    let end = date(&caps, 4)?;
    Some(StatementPeriod::from_range(start, end))
}

/// Find a statement period in a line of text.
///
/// Date ranges (`03/01/24 - 03/31/24`, `2024-03-01 to 2024-03-31`,
/// `March 1, 2024 - March 31, 2024`) resolve to the month they close in;
/// otherwise a single date or a month-and-year is used.
pub fn extract_period(text: &str) -> Option<StatementPeriod> {
    range_period(DATE_RANGE_US.captures(text), us_date)
        .or_else(|| range_period(DATE_RANGE_ISO.captures(text), iso_date))
        .or_else(|| range_period(DATE_RANGE_LONG.captures(text), long_date))
        .or_else(|| {
            let caps = MONTH_YEAR.captures(text)?;
            StatementPeriod::from_month(number(&caps, 2)?, month_from_name(&caps[1])?)
        })
        .or_else(|| {
            let caps = DATE_US.captures(text)?;
            let date = us_date(&caps, 1)?;
            StatementPeriod::from_month(date.year(), date.month())
        })
        .or_else(|| numeric_month(text))
}

fn numeric_month(text: &str) -> Option<StatementPeriod> {
    if let Some(caps) = YEAR_MONTH_NUMERIC.captures(text) {
        if let Some(period) = StatementPeriod::from_month(number(&caps, 1)?, number(&caps, 2)?) {
            return Some(period);
        }
    }
    if let Some(caps) = MONTH_YEAR_NUMERIC.captures(text) {
        if let Some(period) = StatementPeriod::from_month(number(&caps, 2)?, number(&caps, 1)?) {
            return Some(period);
        }
    }
    let caps = YEAR_MONTH_COMPACT.captures(text)?;
    StatementPeriod::from_month(number(&caps, 1)?, number(&caps, 2)?)
}

/// Guess the statement month from an upload's file name, e.g.
/// `statement_2024-03.pdf`, `03-2024.csv`, `Mar_2024.pdf` or `202403.pdf`.
pub fn period_from_filename(filename: &str) -> Option<StatementPeriod> {
    let stem = Path::new(filename).file_stem()?.to_str()?;
    // underscores are word characters and would defeat the month-name boundary
    let stem = stem.replace('_', " ");

    if let Some(caps) = MONTH_YEAR.captures(&stem) {
        if let Some(period) = StatementPeriod::from_month(number(&caps, 2)?, month_from_name(&caps[1])?) {
            return Some(period);
        }
    }
    numeric_month(&stem)
}

/// Scan for a labeled period line. The period is read from the label's
/// line or, failing that, the line after it. "No chargebacks for this
/// statement period" style sentences are not labels.
pub fn scan_period(lines: &[String], labels: &[&str]) -> Option<StatementPeriod> {
    for (i, line) in lines.iter().enumerate() {
        let lower = line.to_lowercase();
        if !labels.iter().any(|label| lower.contains(label)) {
            continue;
        }
        if NO_CHARGEBACKS.is_match(line) || NO_FRAUD.is_match(line) {
            continue;
        }
        if let Some(period) = extract_period(line) {
            return Some(period);
        }
        if let Some(period) = lines.get(i + 1).and_then(|next| extract_period(next)) {
            return Some(period);
        }
    }
    None
}
