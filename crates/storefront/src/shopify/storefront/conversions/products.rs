//! Product type conversion functions.

use indecisive_wear_core::{MoneyError, ProductId, VariantId};

use crate::shopify::types::{
    Product, ProductConnection, ProductOption, ProductVariant, SelectedOption,
};

use super::super::responses::{Connection, RawProduct, RawVariant};
use super::{convert_image, convert_money, convert_page_info};

/// Convert a product from either the card or the detail selection.
pub fn convert_product(product: RawProduct) -> Result<Product, MoneyError> {
    let price = convert_money(&product.price_range.min_variant_price)?;

    // Shopify reports a zero compare-at range when no variant has one
    let compare_at_price = match product.compare_at_price_range {
        Some(range) => {
            let compare = convert_money(&range.min_variant_price)?;
            (!compare.amount.is_zero()).then_some(compare)
        }
        None => None,
    };

    let variants = product
        .variants
        .map(Connection::into_nodes)
        .unwrap_or_default()
        .into_iter()
        .map(convert_variant)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Product {
        id: ProductId::new(product.id),
        handle: product.handle,
        title: product.title,
        description: product.description,
        description_html: product.description_html,
        available_for_sale: product.available_for_sale,
        product_type: product.product_type,
        vendor: product.vendor,
        tags: product.tags,
        created_at: product.created_at,
        price,
        compare_at_price,
        featured_image: product.featured_image.map(convert_image),
        images: product
            .images
            .map(Connection::into_nodes)
            .unwrap_or_default()
            .into_iter()
            .map(convert_image)
            .collect(),
        options: product
            .options
            .into_iter()
            .map(|option| ProductOption {
                name: option.name,
                values: option.option_values.into_iter().map(|v| v.name).collect(),
            })
            .collect(),
        variants,
    })
}

fn convert_variant(variant: RawVariant) -> Result<ProductVariant, MoneyError> {
    Ok(ProductVariant {
        id: VariantId::new(variant.id),
        title: variant.title,
        available_for_sale: variant.available_for_sale,
        price: convert_money(&variant.price)?,
        compare_at_price: variant
            .compare_at_price
            .as_ref()
            .map(convert_money)
            .transpose()?,
        selected_options: variant
            .selected_options
            .into_iter()
            .map(|o| SelectedOption {
                name: o.name,
                value: o.value,
            })
            .collect(),
        image: variant.image.map(convert_image),
    })
}

/// Convert a list of products (recommendations).
pub fn convert_products(products: Vec<RawProduct>) -> Result<Vec<Product>, MoneyError> {
    products.into_iter().map(convert_product).collect()
}

/// Convert a product connection.
pub fn convert_product_connection(
    connection: Connection<RawProduct>,
) -> Result<ProductConnection, MoneyError> {
    let page_info = convert_page_info(connection.page_info.clone());
    Ok(ProductConnection {
        products: convert_products(connection.into_nodes())?,
        page_info,
    })
}
