//! Cart type conversion functions.

use indecisive_wear_core::{CartLineId, MoneyError, ProductId, VariantId};

use crate::shopify::types::{Cart, CartCost, CartDiscountCode, CartLine, CartMerchandise};

use super::super::responses::{RawCart, RawCartLine};
use super::{convert_image, convert_money};

pub fn convert_cart(cart: RawCart) -> Result<Cart, MoneyError> {
    Ok(Cart {
        id: cart.id,
        checkout_url: cart.checkout_url,
        total_quantity: cart.total_quantity,
        lines: cart
            .lines
            .into_nodes()
            .into_iter()
            .map(convert_line)
            .collect::<Result<_, _>>()?,
        cost: CartCost {
            subtotal: convert_money(&cart.cost.subtotal_amount)?,
            total: convert_money(&cart.cost.total_amount)?,
        },
        discount_codes: cart
            .discount_codes
            .into_iter()
            .map(|d| CartDiscountCode {
                code: d.code,
                applicable: d.applicable,
            })
            .collect(),
        country_code: cart.buyer_identity.and_then(|b| b.country_code),
    })
}

fn convert_line(line: RawCartLine) -> Result<CartLine, MoneyError> {
    Ok(CartLine {
        id: CartLineId::new(line.id),
        quantity: line.quantity,
        unit_price: convert_money(&line.cost.amount_per_quantity)?,
        total: convert_money(&line.cost.total_amount)?,
        merchandise: CartMerchandise {
            id: VariantId::new(line.merchandise.id),
            title: line.merchandise.title,
            image: line.merchandise.image.map(convert_image),
            product_id: ProductId::new(line.merchandise.product.id),
            product_handle: line.merchandise.product.handle,
            product_title: line.merchandise.product.title,
        },
    })
}
