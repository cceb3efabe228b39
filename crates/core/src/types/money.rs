//! Prices, currencies, and locale-aware display formatting.
//!
//! Shopify returns money as a decimal string plus an ISO 4217 code. Amounts
//! are kept as [`Decimal`] so totals never pick up binary floating point
//! error, and are only rounded when formatted for display.

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Errors produced when parsing money values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    #[error("unsupported currency: {0}")]
    UnknownCurrency(String),
}

/// ISO 4217 currency codes the storefront can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    USD,
    GBP,
    EUR,
    CAD,
    AUD,
    JPY,
}

impl CurrencyCode {
    /// All supported currencies.
    pub const ALL: [Self; 6] = [
        Self::USD,
        Self::GBP,
        Self::EUR,
        Self::CAD,
        Self::AUD,
        Self::JPY,
    ];

    /// Three-letter ISO code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::USD => "USD",
            Self::GBP => "GBP",
            Self::EUR => "EUR",
            Self::CAD => "CAD",
            Self::AUD => "AUD",
            Self::JPY => "JPY",
        }
    }

    /// Display symbol.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::USD | Self::CAD | Self::AUD => "$",
            Self::GBP => "£",
            Self::EUR => "€",
            Self::JPY => "¥",
        }
    }

    /// Number of digits after the decimal point.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Self::JPY => 0,
            _ => 2,
        }
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for CurrencyCode {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MoneyError::UnknownCurrency(s.to_string()))
    }
}

/// Display locale (BCP 47 tag) controlling separators and symbol position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Locale {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "en-GB")]
    EnGb,
    #[serde(rename = "en-CA")]
    EnCa,
    #[serde(rename = "en-AU")]
    EnAu,
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "fr-FR")]
    FrFr,
    #[serde(rename = "ja-JP")]
    JaJp,
}

impl Locale {
    /// BCP 47 language tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::EnCa => "en-CA",
            Self::EnAu => "en-AU",
            Self::DeDe => "de-DE",
            Self::FrFr => "fr-FR",
            Self::JaJp => "ja-JP",
        }
    }

    const fn group_separator(self) -> &'static str {
        match self {
            Self::DeDe => ".",
            Self::FrFr => " ",
            _ => ",",
        }
    }

    const fn decimal_separator(self) -> char {
        match self {
            Self::DeDe | Self::FrFr => ',',
            _ => '.',
        }
    }

    const fn symbol_after(self) -> bool {
        matches!(self, Self::DeDe | Self::FrFr)
    }
}

/// A monetary amount in a specific currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (dollars, not cents).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Parse a price from Shopify's `MoneyV2` representation.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is not a decimal number or the
    /// currency is not one the storefront supports.
    pub fn parse(amount: &str, currency_code: &str) -> Result<Self, MoneyError> {
        let amount = Decimal::from_str(amount.trim())
            .map_err(|_| MoneyError::InvalidAmount(amount.to_string()))?;
        Ok(Self::new(amount, currency_code.parse()?))
    }

    /// A zero amount in the given currency.
    #[must_use]
    pub const fn zero(currency_code: CurrencyCode) -> Self {
        Self::new(Decimal::ZERO, currency_code)
    }

    /// Multiply by a line quantity.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self::new(self.amount * Decimal::from(quantity), self.currency_code)
    }

    /// Amount rounded to the currency's minor units.
    #[must_use]
    pub fn rounded(self) -> Decimal {
        let dp = self.currency_code.minor_units();
        let mut rounded = self
            .amount
            .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(dp);
        rounded
    }

    /// Format for display in the given locale, e.g. `$1,234.50` or `1.234,50 €`.
    #[must_use]
    pub fn format(self, locale: Locale) -> String {
        let rounded = self.rounded();
        let negative = rounded.is_sign_negative() && !rounded.is_zero();
        let digits = rounded.abs().to_string();
        let (int_part, frac_part) = digits
            .split_once('.')
            .map_or((digits.as_str(), None), |(i, f)| (i, Some(f)));

        let mut number = group_thousands(int_part, locale.group_separator());
        if let Some(frac) = frac_part {
            number.push(locale.decimal_separator());
            number.push_str(frac);
        }

        let sign = if negative { "-" } else { "" };
        let symbol = self.currency_code.symbol();
        if locale.symbol_after() {
            format!("{sign}{number} {symbol}")
        } else {
            format!("{sign}{symbol}{number}")
        }
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.rounded(), self.currency_code)
    }
}

fn group_thousands(digits: &str, separator: &str) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push_str(separator);
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn price(amount: &str, code: &str) -> Price {
        Price::parse(amount, code).unwrap()
    }

    #[test]
    fn test_parse_shopify_money() {
        let p = price("29.5", "gbp");
        assert_eq!(p.currency_code, CurrencyCode::GBP);
        assert_eq!(p.amount, Decimal::new(295, 1));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Price::parse("abc", "USD"),
            Err(MoneyError::InvalidAmount(_))
        ));
        assert!(matches!(
            Price::parse("1.00", "XYZ"),
            Err(MoneyError::UnknownCurrency(_))
        ));
    }

    #[test]
    fn test_format_english_locales() {
        assert_eq!(price("1234.5", "USD").format(Locale::EnUs), "$1,234.50");
        assert_eq!(price("0", "GBP").format(Locale::EnGb), "£0.00");
        assert_eq!(price("999", "AUD").format(Locale::EnAu), "$999.00");
        assert_eq!(
            price("1234567.891", "CAD").format(Locale::EnCa),
            "$1,234,567.89"
        );
    }

    #[test]
    fn test_format_european_locales() {
        assert_eq!(price("1234.5", "EUR").format(Locale::DeDe), "1.234,50 €");
        assert_eq!(price("1234.5", "EUR").format(Locale::FrFr), "1 234,50 €");
    }

    #[test]
    fn test_format_yen_has_no_minor_units() {
        assert_eq!(price("4484.5", "JPY").format(Locale::JaJp), "¥4,485");
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(price("0.125", "USD").format(Locale::EnUs), "$0.13");
        assert_eq!(price("-0.125", "USD").format(Locale::EnUs), "-$0.13");
    }

    #[test]
    fn test_times() {
        let line = price("19.99", "USD").times(3);
        assert_eq!(line.amount, Decimal::new(5997, 2));
    }
}
