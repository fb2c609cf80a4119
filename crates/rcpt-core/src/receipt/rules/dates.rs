//! Transaction date extraction.

use chrono::{Datelike, NaiveDate};
use tracing::debug;

use super::patterns::{DATE_DAY_FIRST, DATE_YEAR_FIRST};
use super::{ExtractionMatch, FieldExtractor};

/// How a matched date token is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLayout {
    /// `YYYY-MM-DD`
    YearFirstDash,
    /// `DD-MM-YYYY`
    DayFirstDash,
    /// `DD/MM/YYYY`
    DayFirstSlash,
}

impl DateLayout {
    /// Pick the layout for a token: dashed tokens starting with "20" are
    /// year-first, every other dashed token is day-first, and slashed tokens
    /// are always day-first.
    pub fn for_token(token: &str) -> Self {
        if token.contains('-') {
            if token.starts_with("20") {
                Self::YearFirstDash
            } else {
                Self::DayFirstDash
            }
        } else {
            Self::DayFirstSlash
        }
    }

    fn format(&self) -> &'static str {
        match self {
            Self::YearFirstDash => "%Y-%m-%d",
            Self::DayFirstDash => "%d-%m-%Y",
            Self::DayFirstSlash => "%d/%m/%Y",
        }
    }
}

/// Date field extractor.
pub struct DateExtractor;

impl DateExtractor {
    pub fn new() -> Self {
        Self
    }

    /// The winning date token, if any: the first day-first match anywhere,
    /// otherwise the first year-first match.
    pub fn find_token<'t>(&self, text: &'t str) -> Option<regex::Match<'t>> {
        DATE_DAY_FIRST
            .find(text)
            .or_else(|| DATE_YEAR_FIRST.find(text))
    }
}

impl Default for DateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for DateExtractor {
    type Output = ExtractionMatch<Option<NaiveDate>>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.find_token(text).map(|m| {
            ExtractionMatch::new(parse_date_token(m.as_str()), m.as_str())
                .with_position(m.start(), m.end())
        })
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        DATE_DAY_FIRST
            .find_iter(text)
            .chain(DATE_YEAR_FIRST.find_iter(text))
            .map(|m| {
                ExtractionMatch::new(parse_date_token(m.as_str()), m.as_str())
                    .with_position(m.start(), m.end())
            })
            .collect()
    }
}

/// Parse a matched date token. Impossible dates, year 0 and tokens that do
/// not fit their layout yield `None`.
pub fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let layout = DateLayout::for_token(token);
    match NaiveDate::parse_from_str(token, layout.format()) {
        Ok(date) if date.year() >= 1 => Some(date),
        Ok(date) => {
            debug!("Date token {:?} has year {}", token, date.year());
            None
        }
        Err(e) => {
            debug!("Date token {:?} rejected as {:?}: {}", token, layout, e);
            None
        }
    }
}

/// Extract the transaction date from raw receipt text.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    DateExtractor::new().extract(text).and_then(|m| m.value)
}
