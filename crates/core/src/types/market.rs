//! Markets: the country/locale/currency a visitor browses in.
//!
//! Shopify prices are authored in the shop currency. Other markets see an
//! approximate conversion through a hardcoded USD rate table. These figures
//! are for display only; checkout always charges the shop currency.

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use super::money::{CurrencyCode, Locale, Price};

/// A selectable storefront market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Market {
    /// Short identifier stored in the visitor session (`us`, `gb`, ...).
    pub id: &'static str,
    /// Human readable name for the market selector.
    pub name: &'static str,
    /// ISO 3166-1 alpha-2 country code sent to Shopify as buyer identity.
    pub country_code: &'static str,
    /// Display locale.
    pub locale: Locale,
    /// Display currency.
    pub currency: CurrencyCode,
}

/// All markets, in selector order. The first entry is the fallback.
pub const MARKETS: &[Market] = &[
    Market {
        id: "us",
        name: "United States",
        country_code: "US",
        locale: Locale::EnUs,
        currency: CurrencyCode::USD,
    },
    Market {
        id: "gb",
        name: "United Kingdom",
        country_code: "GB",
        locale: Locale::EnGb,
        currency: CurrencyCode::GBP,
    },
    Market {
        id: "eu",
        name: "Europe",
        country_code: "DE",
        locale: Locale::DeDe,
        currency: CurrencyCode::EUR,
    },
    Market {
        id: "fr",
        name: "France",
        country_code: "FR",
        locale: Locale::FrFr,
        currency: CurrencyCode::EUR,
    },
    Market {
        id: "ca",
        name: "Canada",
        country_code: "CA",
        locale: Locale::EnCa,
        currency: CurrencyCode::CAD,
    },
    Market {
        id: "au",
        name: "Australia",
        country_code: "AU",
        locale: Locale::EnAu,
        currency: CurrencyCode::AUD,
    },
    Market {
        id: "jp",
        name: "Japan",
        country_code: "JP",
        locale: Locale::JaJp,
        currency: CurrencyCode::JPY,
    },
];

/// Approximate units of `currency` per 1 USD. Not fetched live.
#[must_use]
pub fn approximate_usd_rate(currency: CurrencyCode) -> Decimal {
    match currency {
        CurrencyCode::USD => Decimal::ONE,
        CurrencyCode::GBP => Decimal::new(79, 2),
        CurrencyCode::EUR => Decimal::new(92, 2),
        CurrencyCode::CAD => Decimal::new(136, 2),
        CurrencyCode::AUD => Decimal::new(152, 2),
        CurrencyCode::JPY => Decimal::new(14950, 2),
    }
}

/// A price ready for display in a market.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayPrice {
    /// Formatted text, e.g. `£23.70`.
    pub text: String,
    /// Whether the amount was converted with the static rate table.
    pub approximate: bool,
    /// The (possibly converted) amount.
    pub amount: Decimal,
    /// The display currency.
    pub currency: CurrencyCode,
}

/// Approximate prices are marked with `≈`.
impl fmt::Display for DisplayPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.approximate {
            write!(f, "≈ {}", self.text)
        } else {
            f.write_str(&self.text)
        }
    }
}

impl Market {
    /// All markets.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        MARKETS
    }

    /// The fallback market.
    #[must_use]
    #[allow(clippy::indexing_slicing)] // MARKETS is a non-empty constant
    pub const fn default_market() -> &'static Self {
        &MARKETS[0]
    }

    /// Look up a market by id (case-insensitive).
    #[must_use]
    pub fn find(id: &str) -> Option<&'static Self> {
        MARKETS.iter().find(|m| m.id.eq_ignore_ascii_case(id.trim()))
    }

    /// Look up a market by id, falling back to the default market.
    #[must_use]
    pub fn find_or_default(id: Option<&str>) -> &'static Self {
        id.and_then(Self::find).unwrap_or(Self::default_market())
    }

    /// First market selling in the given country.
    #[must_use]
    pub fn for_country(country_code: &str) -> Option<&'static Self> {
        MARKETS
            .iter()
            .find(|m| m.country_code.eq_ignore_ascii_case(country_code.trim()))
    }

    /// Convert a price into this market's currency.
    ///
    /// Returns the price unchanged (and not approximate) when the currencies
    /// already match.
    #[must_use]
    pub fn convert(&self, price: Price) -> (Price, bool) {
        if price.currency_code == self.currency {
            return (price, false);
        }
        let usd = price.amount / approximate_usd_rate(price.currency_code);
        let converted = (usd * approximate_usd_rate(self.currency))
            .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero);
        (Price::new(converted, self.currency), true)
    }

    /// Convert and format a price for this market.
    #[must_use]
    pub fn display_price(&self, price: Price) -> DisplayPrice {
        let (converted, approximate) = self.convert(price);
        DisplayPrice {
            text: converted.format(self.locale),
            approximate,
            amount: converted.rounded(),
            currency: self.currency,
        }
    }
}
