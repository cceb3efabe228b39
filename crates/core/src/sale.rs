//! Sale-price detection.
//!
//! A product is on sale when its compare-at price is above its price. Some
//! products are marked down without a compare-at price; merchandisers tag
//! those `sale-NN` (NN percent off) or `was-NN` (original price NN), and
//! the tags are consulted only when no compare-at price applies.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

/// Where a sale was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleSource {
    CompareAtPrice,
    SaleTag,
    WasTag,
}

/// A detected markdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaleInfo {
    /// Whole percent discount, 1..=99.
    pub percent_off: u8,
    /// Original (pre-sale) unit price, rounded to cents.
    pub original: Decimal,
    pub source: SaleSource,
}

/// A parsed merchandising tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleTag {
    /// `sale-NN`: NN percent off.
    PercentOff(u8),
    /// `was-NN`: the original price was NN.
    WasPrice(Decimal),
}

/// Parse a `sale-NN` or `was-NN` tag (case-insensitive).
///
/// `sale-` must be followed by a whole number from 1 to 99; `was-` by a
/// positive decimal amount.
#[must_use]
pub fn parse_sale_tag(tag: &str) -> Option<SaleTag> {
    let tag = tag.trim().to_ascii_lowercase();

    if let Some(rest) = tag.strip_prefix("sale-") {
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let percent: u8 = rest.parse().ok()?;
        return (1..=99).contains(&percent).then_some(SaleTag::PercentOff(percent));
    }

    if let Some(rest) = tag.strip_prefix("was-") {
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
            return None;
        }
        let amount = Decimal::from_str(rest).ok()?;
        return (amount > Decimal::ZERO).then_some(SaleTag::WasPrice(amount));
    }

    None
}

/// Whole percent saved going from `original` to `price`, rounded half up.
///
/// Returns `None` unless `original` is above `price`, and when the rounded
/// percentage would be 0 or 100.
#[must_use]
pub fn percent_off(original: Decimal, price: Decimal) -> Option<u8> {
    if original <= Decimal::ZERO || price < Decimal::ZERO || original <= price {
        return None;
    }
    let percent = ((original - price) / original * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    let percent = percent.to_u8()?;
    (1..=99).contains(&percent).then_some(percent)
}

/// Detect whether a product (or variant) is on sale.
///
/// The compare-at price wins when present and above the price; otherwise
/// the first usable `sale-NN` / `was-NN` tag is used.
#[must_use]
pub fn detect_sale<S: AsRef<str>>(
    price: Decimal,
    compare_at: Option<Decimal>,
    tags: &[S],
) -> Option<SaleInfo> {
    if let Some(compare_at) = compare_at
        && let Some(percent) = percent_off(compare_at, price)
    {
        return Some(SaleInfo {
            percent_off: percent,
            original: round_cents(compare_at),
            source: SaleSource::CompareAtPrice,
        });
    }

    tags.iter()
        .filter_map(|tag| parse_sale_tag(tag.as_ref()))
        .find_map(|tag| match tag {
            SaleTag::PercentOff(percent) => {
                let remaining = Decimal::ONE - Decimal::from(percent) / Decimal::ONE_HUNDRED;
                Some(SaleInfo {
                    percent_off: percent,
                    original: round_cents(price / remaining),
                    source: SaleSource::SaleTag,
                })
            }
            SaleTag::WasPrice(original) => {
                percent_off(original, price).map(|percent| SaleInfo {
                    percent_off: percent,
                    original: round_cents(original),
                    source: SaleSource::WasTag,
                })
            }
        })
}

fn round_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
