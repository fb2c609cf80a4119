//! Vendor matching and category derivation.

use crate::models::record::{Category, UNKNOWN_VENDOR};

use super::FieldExtractor;

/// Known vendor keywords and their display names, in match priority order.
/// A keyword earlier in the list wins even when a later one appears first in
/// the text.
pub const VENDOR_LEXICON: &[(&str, &str)] = &[
    ("amazon", "Amazon"),
    ("flipkart", "Flipkart"),
    ("reliance", "Reliance"),
    ("big bazaar", "Big Bazaar"),
    ("super mart", "Amazon Super Mart"),
    ("dmart", "Dmart"),
    ("more", "More"),
];

/// Vendor name fragments that mark a grocery purchase.
pub const GROCERY_KEYWORDS: &[&str] = &["reliance", "big bazaar", "dmart", "more", "super mart"];

/// Vendor matcher over the fixed lexicon.
pub struct VendorMatcher;

impl VendorMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Display name of the matched vendor, or "Unknown".
    pub fn vendor_name(&self, text: &str) -> String {
        self.extract(text)
            .unwrap_or(UNKNOWN_VENDOR)
            .to_string()
    }
}

impl Default for VendorMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for VendorMatcher {
    type Output = &'static str;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let lower = text.to_lowercase();
        VENDOR_LEXICON
            .iter()
            .find(|(keyword, _)| lower.contains(keyword))
            .map(|(_, name)| *name)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let lower = text.to_lowercase();
        VENDOR_LEXICON
            .iter()
            .filter(|(keyword, _)| lower.contains(keyword))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Match the vendor display name for receipt text.
pub fn match_vendor(text: &str) -> String {
    VendorMatcher::new().vendor_name(text)
}

/// Derive the spending category from a vendor display name.
pub fn categorize(vendor: &str) -> Category {
    let lower = vendor.to_lowercase();
    if GROCERY_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Category::Groceries
    } else {
        Category::Others
    }
}
