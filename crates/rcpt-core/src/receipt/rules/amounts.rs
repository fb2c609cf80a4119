//! Amount resolution for receipts.
//!
//! The first number on the first line mentioning "total" wins; a total line
//! whose number is too large to represent is skipped. Without such a line the
//! largest short number in the whole text is taken. Thousands
//! separators are only removed on total lines; the fallback scan reads
//! "1,234.50" as the two tokens "1" and "234.50".

use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::error::ExtractionError;

use super::patterns::{LINE_BREAK, LOOSE_AMOUNT, TOTAL_AMOUNT, TOTAL_LINE};
use super::{ExtractionMatch, FieldExtractor};

/// Where a resolved amount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountSource {
    /// First number on a total line (0-indexed line number).
    TotalLine(usize),
    /// Largest number anywhere in the text.
    LargestNumber,
    /// No numeric content at all.
    NotFound,
}

/// Result of amount resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAmount {
    pub value: Decimal,
    pub source: AmountSource,
}

/// Amount field extractor.
pub struct AmountExtractor;

impl AmountExtractor {
    pub fn new() -> Self {
        Self
    }

    /// First amount found on a total line, scanning lines in order.
    pub fn total_line_amount(
        &self,
        text: &str,
    ) -> Result<Option<(usize, ExtractionMatch<Decimal>)>, ExtractionError> {
        for (line_no, line) in LINE_BREAK.split(text).enumerate() {
            if !TOTAL_LINE.is_match(line) {
                continue;
            }

            let stripped = line.replace(',', "");
            if let Some(m) = TOTAL_AMOUNT.find(&stripped) {
                match parse_amount(m.as_str()) {
                    Ok(value) => {
                        debug!("Total line {} yields amount {}", line_no, value);
                        return Ok(Some((line_no, ExtractionMatch::new(value, line.trim()))));
                    }
                    Err(e) => warn!("Skipping total line {}: {}", line_no, e),
                }
            }
        }

        Ok(None)
    }

    /// All short numeric tokens in the text, in reading order.
    pub fn loose_amounts(&self, text: &str) -> Result<Vec<ExtractionMatch<Decimal>>, ExtractionError> {
        LOOSE_AMOUNT
            .find_iter(text)
            .map(|m| {
                parse_amount(m.as_str())
                    .map(|value| ExtractionMatch::new(value, m.as_str()).with_position(m.start(), m.end()))
            })
            .collect()
    }

    /// Resolve the receipt total.
    pub fn resolve(&self, text: &str) -> Result<ResolvedAmount, ExtractionError> {
        if let Some((line_no, found)) = self.total_line_amount(text)? {
            return Ok(ResolvedAmount {
                value: found.value,
                source: AmountSource::TotalLine(line_no),
            });
        }

        let largest = self
            .loose_amounts(text)?
            .into_iter()
            .map(|m| m.value)
            .max();

        Ok(match largest {
            Some(value) => ResolvedAmount {
                value,
                source: AmountSource::LargestNumber,
            },
            None => ResolvedAmount {
                value: Decimal::ZERO,
                source: AmountSource::NotFound,
            },
        })
    }
}

impl Default for AmountExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for AmountExtractor {
    type Output = ExtractionMatch<Decimal>;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        match self.total_line_amount(text) {
            Ok(Some((_, found))) => Some(found),
            Ok(None) => self
                .loose_amounts(text)
                .ok()?
                .into_iter()
                .max_by(|a, b| a.value.cmp(&b.value)),
            Err(_) => None,
        }
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        self.loose_amounts(text).unwrap_or_default()
    }
}

/// Resolve the receipt amount, reporting unparseable tokens as errors.
pub fn try_resolve_amount(text: &str) -> Result<ResolvedAmount, ExtractionError> {
    AmountExtractor::new().resolve(text)
}

/// Resolve the receipt amount; zero when nothing usable is found.
pub fn resolve_amount(text: &str) -> Decimal {
    match try_resolve_amount(text) {
        Ok(resolved) => resolved.value,
        Err(e) => {
            warn!("Amount resolution failed: {}", e);
            Decimal::ZERO
        }
    }
}

fn parse_amount(token: &str) -> Result<Decimal, ExtractionError> {
    Decimal::from_str(token).map_err(|_| ExtractionError::Parse {
        field: "amount".to_string(),
        value: token.to_string(),
    })
}
