//! Structured receipt record produced by field extraction.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Vendor name used when no lexicon keyword matches.
pub const UNKNOWN_VENDOR: &str = "Unknown";

/// Fields extracted from a single receipt.
///
/// A plain value: it holds no reference to the text or file it came from.
/// Every field is always populated except `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    /// Vendor display name, or [`UNKNOWN_VENDOR`].
    pub vendor: String,

    /// Transaction date, if a supported date pattern was found.
    pub date: Option<NaiveDate>,

    /// Receipt total. Zero means the amount could not be determined.
    pub amount: Decimal,

    /// Spending category derived from the vendor.
    pub category: Category,

    /// Detected currency.
    pub currency: Currency,
}

impl Default for ExtractedRecord {
    fn default() -> Self {
        Self {
            vendor: UNKNOWN_VENDOR.to_string(),
            date: None,
            amount: Decimal::ZERO,
            category: Category::Others,
            currency: Currency::default(),
        }
    }
}

impl ExtractedRecord {
    /// The fallback record with a specific currency.
    pub fn fallback(currency: Currency) -> Self {
        Self {
            currency,
            ..Self::default()
        }
    }

    /// Whether the vendor lexicon produced a match.
    pub fn has_known_vendor(&self) -> bool {
        self.vendor != UNKNOWN_VENDOR
    }

    /// List the problems a persistence layer would reject this record for.
    ///
    /// Extraction legitimately yields a zero amount; storing it is the
    /// caller's decision. Currency codes are always well-formed since
    /// [`Currency`] is closed.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.amount <= Decimal::ZERO {
            issues.push(format!("Amount must be positive (got {})", self.amount));
        }

        issues
    }
}

/// Spending category.
///
/// Extraction only ever produces these two; downstream editing may use others.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Groceries,
    Others,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "Groceries",
            Self::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported currencies, serialized as their ISO 4217 code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    #[default]
    Inr,
    Aed,
}

impl Currency {
    /// Three-letter ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
            Self::Inr => "INR",
            Self::Aed => "AED",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USD" => Ok(Self::Usd),
            "EUR" => Ok(Self::Eur),
            "GBP" => Ok(Self::Gbp),
            "INR" => Ok(Self::Inr),
            "AED" => Ok(Self::Aed),
            other => Err(format!("unsupported currency code: {}", other)),
        }
    }
}
