//! Type conversion functions for Shopify Storefront API responses.

pub mod cart;
pub mod collections;
pub mod customer;
pub mod products;

pub use cart::convert_cart;
pub use collections::{convert_collection, convert_collection_connection};
pub use customer::convert_customer;
pub use products::{convert_product, convert_product_connection, convert_products};

use indecisive_wear_core::{MoneyError, Price};

use crate::shopify::types::{Image, PageInfo};

use super::responses::{RawImage, RawMoney, RawPageInfo};

/// Parse a Shopify `MoneyV2`.
pub fn convert_money(money: &RawMoney) -> Result<Price, MoneyError> {
    Price::parse(&money.amount, &money.currency_code)
}

pub fn convert_image(image: RawImage) -> Image {
    Image {
        url: image.url,
        alt_text: image.alt_text,
        width: image.width,
        height: image.height,
    }
}

pub fn convert_page_info(page_info: RawPageInfo) -> PageInfo {
    PageInfo {
        has_next_page: page_info.has_next_page,
        end_cursor: page_info.end_cursor,
    }
}
