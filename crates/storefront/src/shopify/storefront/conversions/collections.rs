//! Collection type conversion functions.

use indecisive_wear_core::MoneyError;

use crate::shopify::types::{Collection, CollectionConnection, PageInfo};

use super::super::responses::{Connection, RawCollection};
use super::{convert_image, convert_page_info, convert_product_connection};

/// Convert a collection, including its first page of products when selected.
pub fn convert_collection(collection: RawCollection) -> Result<Collection, MoneyError> {
    let (products, page_info) = match collection.products {
        Some(connection) => {
            let connection = convert_product_connection(connection)?;
            (connection.products, connection.page_info)
        }
        None => (Vec::new(), PageInfo::default()),
    };

    Ok(Collection {
        id: collection.id,
        handle: collection.handle,
        title: collection.title,
        description: collection.description,
        image: collection.image.map(convert_image),
        products,
        page_info,
    })
}

/// Convert a collection connection.
pub fn convert_collection_connection(
    connection: Connection<RawCollection>,
) -> Result<CollectionConnection, MoneyError> {
    let page_info = convert_page_info(connection.page_info.clone());
    Ok(CollectionConnection {
        collections: connection
            .into_nodes()
            .into_iter()
            .map(convert_collection)
            .collect::<Result<_, _>>()?,
        page_info,
    })
}
