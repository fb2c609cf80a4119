//! Common regex patterns for receipt extraction.
//!
//! Digit classes are ASCII-only so every match parses as a decimal.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Line boundaries, including the form feed tesseract ends pages with
    pub static ref LINE_BREAK: Regex = Regex::new(
        r"\r\n|[\n\r\x0B\x0C\x1C\x1D\x1E\x{85}\x{2028}\x{2029}]"
    ).unwrap();

    // Total lines ("Total", "TOTAL AMOUNT", "Sub total" ...)
    pub static ref TOTAL_LINE: Regex = Regex::new(
        r"(?i)total(?:\s+amount)?"
    ).unwrap();

    // Amount on a total line, applied after thousands separators are removed
    pub static ref TOTAL_AMOUNT: Regex = Regex::new(
        r"[0-9]+(?:\.[0-9]{1,2})?"
    ).unwrap();

    // Any short number in the document (fallback when no total line matches)
    pub static ref LOOSE_AMOUNT: Regex = Regex::new(
        r"[0-9]{1,5}(?:\.[0-9]{1,2})?"
    ).unwrap();

    // DD/MM/YYYY or DD-MM-YYYY
    pub static ref DATE_DAY_FIRST: Regex = Regex::new(
        r"[0-9]{2}[/-][0-9]{2}[/-][0-9]{4}"
    ).unwrap();

    // YYYY-MM-DD or YYYY/MM/DD
    pub static ref DATE_YEAR_FIRST: Regex = Regex::new(
        r"[0-9]{4}[/-][0-9]{2}[/-][0-9]{2}"
    ).unwrap();
}
