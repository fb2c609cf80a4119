//! Receipt field extractor combining the individual rules.

use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::error::ExtractionError;
use crate::models::config::ExtractionConfig;
use crate::models::record::{Currency, ExtractedRecord};

use super::rules::{categorize, AmountExtractor, CurrencyDetector, DateExtractor, FieldExtractor, VendorMatcher};
use super::{ReceiptParser, Result};

/// Result of an extraction, including why the fallback record was used.
#[derive(Debug, Clone)]
pub struct ExtractionOutcome {
    /// Extracted record (the fallback record on failure).
    pub record: ExtractedRecord,
    /// Internal failure that forced the fallback record, if any.
    pub fallback_reason: Option<ExtractionError>,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionOutcome {
    pub fn used_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Extracts vendor, date, amount, category and currency from receipt text.
///
/// Stateless: every call depends only on its input text and the configured
/// fallback currency.
pub struct ReceiptExtractor {
    currency: CurrencyDetector,
    amounts: AmountExtractor,
    dates: DateExtractor,
    vendors: VendorMatcher,
    default_currency: Currency,
}

impl ReceiptExtractor {
    /// Create an extractor with INR as the fallback currency.
    pub fn new() -> Self {
        Self {
            currency: CurrencyDetector::new(),
            amounts: AmountExtractor::new(),
            dates: DateExtractor::new(),
            vendors: VendorMatcher::new(),
            default_currency: Currency::default(),
        }
    }

    /// Create an extractor from configuration.
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new().with_default_currency(config.default_currency)
    }

    /// Set the currency used when no currency signal is present.
    pub fn with_default_currency(mut self, currency: Currency) -> Self {
        self.currency = CurrencyDetector::new().with_default(currency);
        self.default_currency = currency;
        self
    }

    /// Run every rule, surfacing internal failures instead of recovering.
    pub fn try_extract(&self, text: &str) -> Result<ExtractedRecord> {
        let vendor = self.vendors.vendor_name(text);
        let date = self.dates.extract(text).and_then(|m| m.value);
        let amount = self.amounts.resolve(text)?;
        let currency = self.currency.detect(text);
        let category = categorize(&vendor);

        debug!(
            "Resolved vendor={} date={:?} amount={} ({:?}) currency={}",
            vendor, date, amount.value, amount.source, currency
        );

        Ok(ExtractedRecord {
            vendor,
            date,
            amount: amount.value,
            category,
            currency,
        })
    }

    /// Extract a record, recording whether the fallback was needed.
    pub fn extract_with_outcome(&self, text: &str) -> ExtractionOutcome {
        let start = Instant::now();

        info!("Extracting receipt fields from {} characters of text", text.len());

        let result = panic::catch_unwind(AssertUnwindSafe(|| self.try_extract(text)))
            .unwrap_or_else(|payload| Err(ExtractionError::Panicked(panic_message(&*payload))));

        let (record, fallback_reason) = match result {
            Ok(record) => (record, None),
            Err(e) => {
                warn!("Receipt extraction failed, using fallback record: {}", e);
                (ExtractedRecord::fallback(self.default_currency), Some(e))
            }
        };

        ExtractionOutcome {
            record,
            fallback_reason,
            processing_time_ms: start.elapsed().as_millis() as u64,
        }
    }

    /// Extract a record. Never fails: internal errors yield the fallback
    /// record {Unknown, no date, 0, Others, default currency}.
    pub fn extract(&self, text: &str) -> ExtractedRecord {
        self.extract_with_outcome(text).record
    }
}

impl Default for ReceiptExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiptParser for ReceiptExtractor {
    fn parse(&self, text: &str) -> Result<ExtractedRecord> {
        self.try_extract(text)
    }
}

/// Extract a record from receipt text with default settings.
pub fn extract(text: &str) -> ExtractedRecord {
    ReceiptExtractor::new().extract(text)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
