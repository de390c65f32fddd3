//! Common regex patterns for statement extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// Month name alternation shared by the date patterns.
pub const MONTH_NAMES: &str =
    r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

lazy_static! {
    // Number tokens
    pub static ref COUNT_TOKEN: Regex = Regex::new(
        r"^(?:\d{1,3}(?:,\d{3})+|\d+)$"
    ).unwrap();

    pub static ref COUNT_TOKEN_LENIENT: Regex = Regex::new(
        r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.0+)?$"
    ).unwrap();

    pub static ref CURRENCY_DIGITS: Regex = Regex::new(
        r"^(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?$|^\.\d+$"
    ).unwrap();

    /// A number at the very start of a line, e.g. "12", "$1,234.56", "(45.00)".
    pub static ref LEADING_NUMBER: Regex = Regex::new(
        r"^(\(?-?\$?\s?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?\)?-?)(?:\s|$)"
    ).unwrap();

    // Dates and periods
    pub static ref DATE_RANGE_US: Regex = Regex::new(
        r"(?i)\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\s*(?:-|–|to|thru|through)\s*(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_RANGE_ISO: Regex = Regex::new(
        r"(?i)\b(\d{4})-(\d{2})-(\d{2})\s*(?:-|–|to|thru|through)\s*(\d{4})-(\d{2})-(\d{2})\b"
    ).unwrap();

    pub static ref DATE_RANGE_LONG: Regex = Regex::new(&format!(
        r"(?i)\b({m})\.?\s+(\d{{1,2}}),?\s+(\d{{4}})\s*(?:-|–|to|thru|through)\s*({m})\.?\s+(\d{{1,2}}),?\s+(\d{{4}})\b",
        m = MONTH_NAMES
    )).unwrap();

    pub static ref DATE_US: Regex = Regex::new(
        r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref MONTH_YEAR: Regex = Regex::new(&format!(
        r"(?i)\b({m})\.?[\s,_\-]*(\d{{4}})\b",
        m = MONTH_NAMES
    )).unwrap();

    pub static ref YEAR_MONTH_NUMERIC: Regex = Regex::new(
        r"(?:^|\D)(\d{4})[-_./ ](\d{1,2})(?:\D|$)"
    ).unwrap();

    pub static ref MONTH_YEAR_NUMERIC: Regex = Regex::new(
        r"(?:^|\D)(\d{1,2})[-_./ ](\d{4})(?:\D|$)"
    ).unwrap();

    pub static ref YEAR_MONTH_COMPACT: Regex = Regex::new(
        r"(?:^|\D)(20\d{2})(0[1-9]|1[0-2])(?:\D|$)"
    ).unwrap();

    /// Rows of itemized sections start with a transaction date.
    pub static ref DATED_ROW: Regex = Regex::new(
        r"^\d{1,2}/\d{1,2}(?:/\d{2,4})?\b"
    ).unwrap();

    // Statement phrases
    pub static ref NO_CHARGEBACKS: Regex = Regex::new(
        r"(?i)\bno\s+(?:chargebacks?|disputes?)(?:\s*/\s*reversals?)?\s+(?:for|during|in|this|were|have|reported)"
    ).unwrap();

    pub static ref NO_FRAUD: Regex = Regex::new(
        r"(?i)\bno\s+(?:fraud|tc\s?40)(?:\s+(?:activity|reports?|advices?))?\s+(?:for|during|in|this|were|have|reported)"
    ).unwrap();

    pub static ref CNP_CATEGORY: Regex = Regex::new(
        r"(?i)card[\s\-]*not[\s\-]*present|\bcnp\b|\be-?comm(?:erce)?\b|\bkeyed\b|mail\s*/\s*phone|\bmoto\b"
    ).unwrap();

    pub static ref ADJUSTMENT_ROW: Regex = Regex::new(
        r"(?i)\badj(?:ustment)?s?\b|\bcorrection\b"
    ).unwrap();

    pub static ref TC40_LINE: Regex = Regex::new(
        r"(?i)\btc\s?40\b"
    ).unwrap();
}
