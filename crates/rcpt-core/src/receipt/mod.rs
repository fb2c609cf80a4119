//! Receipt field extraction module.

mod extractor;
pub mod rules;

pub use extractor::{extract, ExtractionOutcome, ReceiptExtractor};

use crate::error::ExtractionError;
use crate::models::record::ExtractedRecord;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Trait for receipt parsers.
pub trait ReceiptParser {
    /// Parse a record from raw text, surfacing internal failures.
    fn parse(&self, text: &str) -> Result<ExtractedRecord>;
}
