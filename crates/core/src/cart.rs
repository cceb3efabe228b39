//! Session-side mirror of the visitor's Shopify cart.
//!
//! Shopify owns the cart. The mirror is rebuilt from every cart mutation
//! response and stored in the session so cheap reads (the header badge,
//! toast messages) never call Shopify. Writes are last-write-wins.
//!
//! The storefront only builds mirrors with [`CartMirror::from_lines`].
//! [`CartMirror::add`], [`CartMirror::update`], [`CartMirror::remove`] and
//! [`CartMirror::clear`] edit a mirror locally, without a Shopify round
//! trip, and recompute totals after each change. A mirror holds one
//! currency; `add` rejects lines in any other.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CartLineId, CurrencyCode, Price, ProductId, VariantId};

/// Errors from cart mirror mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CartError {
    #[error("cart line not found: {0}")]
    LineNotFound(CartLineId),
    #[error("line currency {line} does not match cart currency {cart}")]
    CurrencyMismatch {
        cart: CurrencyCode,
        line: CurrencyCode,
    },
}

/// One line of the mirrored cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorLine {
    pub line_id: CartLineId,
    pub product_id: ProductId,
    pub variant_id: VariantId,
    /// Product title, plus variant title when it is not the default.
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl MirrorLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// The mirrored cart with its recomputed aggregates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartMirror {
    lines: Vec<MirrorLine>,
    total: Decimal,
    count: u32,
    currency: CurrencyCode,
}

impl Default for CartMirror {
    fn default() -> Self {
        Self::empty(CurrencyCode::default())
    }
}

impl CartMirror {
    /// An empty cart in the given currency.
    #[must_use]
    pub const fn empty(currency: CurrencyCode) -> Self {
        Self {
            lines: Vec::new(),
            total: Decimal::ZERO,
            count: 0,
            currency,
        }
    }

    /// Build a mirror from lines, recomputing totals.
    #[must_use]
    pub fn from_lines(lines: Vec<MirrorLine>, currency: CurrencyCode) -> Self {
        let mut cart = Self {
            lines,
            total: Decimal::ZERO,
            count: 0,
            currency,
        };
        cart.lines.retain(|l| l.quantity > 0);
        cart.recompute();
        cart
    }

    #[must_use]
    pub fn lines(&self) -> &[MirrorLine] {
        &self.lines
    }

    /// Sum of line totals.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// Sum of quantities.
    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Total as a price.
    #[must_use]
    pub const fn total_price(&self) -> Price {
        Price::new(self.total, self.currency)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Find the line for a variant.
    #[must_use]
    pub fn line_for_variant(&self, variant_id: &VariantId) -> Option<&MirrorLine> {
        self.lines.iter().find(|l| &l.variant_id == variant_id)
    }

    /// Add a line, merging quantities with an existing line for the same
    /// variant.
    ///
    /// # Errors
    ///
    /// Returns `CurrencyMismatch` if `currency` differs from the cart's
    /// currency on a non-empty cart.
    pub fn add(&mut self, line: MirrorLine, currency: CurrencyCode) -> Result<(), CartError> {
        if self.lines.is_empty() {
            self.currency = currency;
        } else if currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                cart: self.currency,
                line: currency,
            });
        }

        if line.quantity == 0 {
            return Ok(());
        }

        match self
            .lines
            .iter_mut()
            .find(|existing| existing.variant_id == line.variant_id)
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                existing.unit_price = line.unit_price;
            }
            None => self.lines.push(line),
        }
        self.recompute();
        Ok(())
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if no line has this id.
    pub fn update(&mut self, line_id: &CartLineId, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return self.remove(line_id);
        }
        let line = self
            .lines
            .iter_mut()
            .find(|l| &l.line_id == line_id)
            .ok_or_else(|| CartError::LineNotFound(line_id.clone()))?;
        line.quantity = quantity;
        self.recompute();
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `LineNotFound` if no line has this id.
    pub fn remove(&mut self, line_id: &CartLineId) -> Result<(), CartError> {
        let before = self.lines.len();
        self.lines.retain(|l| &l.line_id != line_id);
        if self.lines.len() == before {
            return Err(CartError::LineNotFound(line_id.clone()));
        }
        self.recompute();
        Ok(())
    }

    /// Remove all lines.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total = self.lines.iter().map(MirrorLine::line_total).sum();
        self.count = self
            .lines
            .iter()
            .fold(0u32, |acc, l| acc.saturating_add(l.quantity));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(n: u64, quantity: u32, cents: i64) -> MirrorLine {
        MirrorLine {
            line_id: CartLineId::from_numeric(n),
            product_id: ProductId::from_numeric(n * 10),
            variant_id: VariantId::from_numeric(n * 100),
            name: format!("Tee {n}"),
            quantity,
            unit_price: Decimal::new(cents, 2),
        }
    }

    #[test]
    fn test_add_recomputes_totals() {
        let mut cart = CartMirror::default();
        cart.add(line(1, 2, 2500), CurrencyCode::USD).unwrap();
        cart.add(line(2, 1, 1999), CurrencyCode::USD).unwrap();
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total(), Decimal::new(6999, 2));
    }

    #[test]
    fn test_add_same_variant_merges() {
        let mut cart = CartMirror::default();
        cart.add(line(1, 1, 2500), CurrencyCode::USD).unwrap();
        cart.add(line(1, 2, 2500), CurrencyCode::USD).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.count(), 3);
        assert_eq!(cart.total(), Decimal::new(7500, 2));
    }

    #[test]
    fn test_update_and_remove() {
        let mut cart = CartMirror::from_lines(
            vec![line(1, 1, 1000), line(2, 4, 500)],
            CurrencyCode::GBP,
        );
        assert_eq!(cart.total(), Decimal::new(3000, 2));

        cart.update(&CartLineId::from_numeric(2), 1).unwrap();
        assert_eq!(cart.count(), 2);
        assert_eq!(cart.total(), Decimal::new(1500, 2));

        cart.update(&CartLineId::from_numeric(1), 0).unwrap();
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.total(), Decimal::new(500, 2));

        cart.remove(&CartLineId::from_numeric(2)).unwrap();
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn test_unknown_line() {
        let mut cart = CartMirror::default();
        let missing = CartLineId::from_numeric(9);
        assert_eq!(
            cart.remove(&missing),
            Err(CartError::LineNotFound(missing.clone()))
        );
        assert!(cart.update(&missing, 3).is_err());
    }

    #[test]
    fn test_currency_mismatch() {
        let mut cart = CartMirror::default();
        cart.add(line(1, 1, 1000), CurrencyCode::EUR).unwrap();
        assert_eq!(cart.currency(), CurrencyCode::EUR);
        assert!(matches!(
            cart.add(line(2, 1, 1000), CurrencyCode::USD),
            Err(CartError::CurrencyMismatch { .. })
        ));
    }

    #[test]
    fn test_from_lines_drops_empty_lines() {
        let cart = CartMirror::from_lines(vec![line(1, 0, 1000)], CurrencyCode::USD);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_serde_roundtrip_keeps_totals() {
        let cart = CartMirror::from_lines(vec![line(1, 2, 1250)], CurrencyCode::AUD);
        let json = serde_json::to_string(&cart).unwrap();
        let back: CartMirror = serde_json::from_str(&json).unwrap();
        assert_eq!(back, cart);
        assert_eq!(back.total_price().format(crate::Locale::EnAu), "$25.00");
    }
}
