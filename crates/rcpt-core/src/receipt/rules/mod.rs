//! Rule-based field extractors for receipts.
//!
//! Each heuristic chain here is an ordered list evaluated first-match-wins;
//! list order is part of the behavior.

pub mod amounts;
pub mod currency;
pub mod dates;
pub mod patterns;
pub mod vendor;

pub use amounts::{resolve_amount, try_resolve_amount, AmountExtractor, AmountSource, ResolvedAmount};
pub use currency::{detect_currency, CurrencyDetector, CURRENCY_SIGNALS};
pub use dates::{extract_date, parse_date_token, DateExtractor, DateLayout};
pub use vendor::{categorize, match_vendor, VendorMatcher, GROCERY_KEYWORDS, VENDOR_LEXICON};
pub use patterns::*;

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the winning value from text.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract every candidate, in the order the rule would consider them.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}

/// A value together with the text it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionMatch<T> {
    /// Extracted value.
    pub value: T,
    /// Byte range in the searched text.
    pub position: Option<(usize, usize)>,
    /// Source text that was matched.
    pub source: String,
}

impl<T> ExtractionMatch<T> {
    pub fn new(value: T, source: impl Into<String>) -> Self {
        Self {
            value,
            position: None,
            source: source.into(),
        }
    }

    pub fn with_position(mut self, start: usize, end: usize) -> Self {
        self.position = Some((start, end));
        self
    }
}
