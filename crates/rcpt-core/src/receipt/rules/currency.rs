//! Currency detection from currency symbols and codes.

use crate::models::record::Currency;

use super::FieldExtractor;

/// Currency signals in priority order: the first entry with any needle present
/// in the lower-cased text wins. Matching is plain substring search, so short
/// needles such as "rs" also fire inside unrelated words.
pub const CURRENCY_SIGNALS: &[(&[&str], Currency)] = &[
    (&["$", "usd"], Currency::Usd),
    (&["€", "eur"], Currency::Eur),
    (&["£", "gbp"], Currency::Gbp),
    (&["₹", "inr", "rs"], Currency::Inr),
    (&["aed", "د.إ"], Currency::Aed),
];

/// Currency detector with a configurable fallback.
pub struct CurrencyDetector {
    default_currency: Currency,
}

impl CurrencyDetector {
    pub fn new() -> Self {
        Self {
            default_currency: Currency::default(),
        }
    }

    /// Set the currency returned when no signal is present.
    pub fn with_default(mut self, currency: Currency) -> Self {
        self.default_currency = currency;
        self
    }

    /// Detect the receipt currency, falling back to the default.
    pub fn detect(&self, text: &str) -> Currency {
        self.extract(text).unwrap_or(self.default_currency)
    }
}

impl Default for CurrencyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for CurrencyDetector {
    type Output = Currency;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        let lower = text.to_lowercase();
        CURRENCY_SIGNALS
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
            .map(|(_, currency)| *currency)
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let lower = text.to_lowercase();
        CURRENCY_SIGNALS
            .iter()
            .filter(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
            .map(|(_, currency)| *currency)
            .collect()
    }
}

/// Detect the currency of receipt text, defaulting to INR.
pub fn detect_currency(text: &str) -> Currency {
    CurrencyDetector::new().detect(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_symbols_and_codes() {
        assert_eq!(detect_currency("Total $10"), Currency::Usd);
        assert_eq!(detect_currency("Amount USD 10"), Currency::Usd);
        assert_eq!(detect_currency("Summe 10,00 €"), Currency::Eur);
        assert_eq!(detect_currency("paid in EUR"), Currency::Eur);
        assert_eq!(detect_currency("£4.99"), Currency::Gbp);
        assert_eq!(detect_currency("GBP 4.99"), Currency::Gbp);
        assert_eq!(detect_currency("₹ 250"), Currency::Inr);
        assert_eq!(detect_currency("Rs. 250"), Currency::Inr);
        assert_eq!(detect_currency("AED 15.00"), Currency::Aed);
        assert_eq!(detect_currency("15.00 د.إ"), Currency::Aed);
    }

    #[test]
    fn test_priority_order() {
        // Dollar is checked before rupee regardless of position.
        assert_eq!(detect_currency("Total $10 and ₹20"), Currency::Usd);
        assert_eq!(detect_currency("₹20 then €5"), Currency::Eur);
    }

    #[test]
    fn test_permissive_substring() {
        // "rs" inside "Thursday" is treated as a rupee signal.
        assert_eq!(detect_currency("Thursday 15 AED"), Currency::Inr);
        // "eur" inside "Europe" beats a later AED code.
        assert_eq!(detect_currency("Europe Mall AED 10"), Currency::Eur);
    }

    #[test]
    fn test_default_fallback() {
        assert_eq!(detect_currency("nothing here 42"), Currency::Inr);
        assert_eq!(detect_currency(""), Currency::Inr);

        let detector = CurrencyDetector::new().with_default(Currency::Gbp);
        assert_eq!(detector.detect("nothing here"), Currency::Gbp);
        assert_eq!(detector.detect("USD 1"), Currency::Usd);
    }

    #[test]
    fn test_extract_all_in_priority_order() {
        let detector = CurrencyDetector::new();
        assert_eq!(
            detector.extract_all("₹20, $10, aed"),
            vec![Currency::Usd, Currency::Inr, Currency::Aed]
        );
    }
}
