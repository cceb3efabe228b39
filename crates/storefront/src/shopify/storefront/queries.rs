//! GraphQL operations for the Shopify Storefront API.
//!
//! Each operation is a unit struct implementing [`GraphQLQuery`] with a
//! sibling module holding its `Variables` and `ResponseData`, the same shape
//! `#[derive(GraphQLQuery)]` generates. Documents are assembled from shared
//! fragments with `concat!` so every operation is a `&'static str`.

use graphql_client::{GraphQLQuery, QueryBody};

macro_rules! money {
    () => {
        "amount currencyCode"
    };
}

macro_rules! image_fields {
    () => {
        "url altText width height"
    };
}

macro_rules! product_card_fragment {
    () => {
        concat!(
            "fragment ProductCard on Product { ",
            "id handle title vendor productType tags availableForSale createdAt ",
            "featuredImage { ",
            image_fields!(),
            " } ",
            "priceRange { minVariantPrice { ",
            money!(),
            " } } ",
            "compareAtPriceRange { minVariantPrice { ",
            money!(),
            " } } ",
            "}"
        )
    };
}

macro_rules! product_detail_fragment {
    () => {
        concat!(
            "fragment ProductDetail on Product { ",
            "...ProductCard description descriptionHtml ",
            "images(first: 10) { edges { node { ",
            image_fields!(),
            " } } pageInfo { hasNextPage endCursor } } ",
            "options { name optionValues { name } } ",
            "variants(first: 50) { edges { node { ",
            "id title availableForSale ",
            "price { ",
            money!(),
            " } compareAtPrice { ",
            money!(),
            " } ",
            "selectedOptions { name value } ",
            "image { ",
            image_fields!(),
            " } ",
            "} } pageInfo { hasNextPage endCursor } } ",
            "}"
        )
    };
}

macro_rules! cart_fragment {
    () => {
        concat!(
            "fragment CartFields on Cart { ",
            "id checkoutUrl totalQuantity ",
            "buyerIdentity { countryCode } ",
            "cost { subtotalAmount { ",
            money!(),
            " } totalAmount { ",
            money!(),
            " } } ",
            "discountCodes { code applicable } ",
            "lines(first: 100) { edges { node { ",
            "id quantity ",
            "cost { amountPerQuantity { ",
            money!(),
            " } totalAmount { ",
            money!(),
            " } } ",
            "merchandise { ... on ProductVariant { id title image { ",
            image_fields!(),
            " } product { id handle title } } } ",
            "} } pageInfo { hasNextPage endCursor } } ",
            "}"
        )
    };
}

macro_rules! cart_mutation {
    ($operation:literal, $field:literal, $params:literal, $args:literal) => {
        concat!(
            "mutation ",
            $operation,
            $params,
            " { ",
            $field,
            $args,
            " { cart { ...CartFields } userErrors { message } } } ",
            cart_fragment!()
        )
    };
}

macro_rules! operation {
    ($name:ident, $module:ident, $operation_name:literal, $query:expr) => {
        pub struct $name;

        impl GraphQLQuery for $name {
            type Variables = $module::Variables;
            type ResponseData = $module::ResponseData;

            fn build_query(variables: Self::Variables) -> QueryBody<Self::Variables> {
                QueryBody {
                    variables,
                    query: $query,
                    operation_name: $operation_name,
                }
            }
        }
    };
}

// =============================================================================
// Products
// =============================================================================

operation!(
    GetProducts,
    get_products,
    "GetProducts",
    concat!(
        "query GetProducts($first: Int!, $after: String, $query: String, ",
        "$sortKey: ProductSortKeys, $reverse: Boolean) { ",
        "products(first: $first, after: $after, query: $query, sortKey: $sortKey, reverse: $reverse) { ",
        "edges { node { ...ProductCard } } pageInfo { hasNextPage endCursor } } } ",
        product_card_fragment!()
    )
);

pub mod get_products {
    use serde::{Deserialize, Serialize};

    use super::super::responses::{Connection, RawProduct};

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
        pub query: Option<String>,
        pub sort_key: Option<&'static str>,
        pub reverse: Option<bool>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub products: Connection<RawProduct>,
    }
}

operation!(
    GetProductByHandle,
    get_product_by_handle,
    "GetProductByHandle",
    concat!(
        "query GetProductByHandle($handle: String!) { ",
        "product(handle: $handle) { ...ProductDetail } } ",
        product_detail_fragment!(),
        " ",
        product_card_fragment!()
    )
);

pub mod get_product_by_handle {
    use serde::{Deserialize, Serialize};

    use super::super::responses::RawProduct;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub handle: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub product: Option<RawProduct>,
    }
}

operation!(
    GetProductRecommendations,
    get_product_recommendations,
    "GetProductRecommendations",
    concat!(
        "query GetProductRecommendations($productId: ID!, $intent: ProductRecommendationIntent) { ",
        "productRecommendations(productId: $productId, intent: $intent) { ...ProductCard } } ",
        product_card_fragment!()
    )
);

pub mod get_product_recommendations {
    use serde::{Deserialize, Serialize};

    use super::super::responses::RawProduct;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub product_id: String,
        pub intent: Option<&'static str>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub product_recommendations: Option<Vec<RawProduct>>,
    }
}

// =============================================================================
// Collections
// =============================================================================

operation!(
    GetCollectionByHandle,
    get_collection_by_handle,
    "GetCollectionByHandle",
    concat!(
        "query GetCollectionByHandle($handle: String!, $first: Int!, $after: String, ",
        "$sortKey: ProductCollectionSortKeys, $reverse: Boolean) { ",
        "collection(handle: $handle) { id handle title description image { ",
        image_fields!(),
        " } ",
        "products(first: $first, after: $after, sortKey: $sortKey, reverse: $reverse) { ",
        "edges { node { ...ProductCard } } pageInfo { hasNextPage endCursor } } } } ",
        product_card_fragment!()
    )
);

pub mod get_collection_by_handle {
    use serde::{Deserialize, Serialize};

    use super::super::responses::RawCollection;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub handle: String,
        pub first: i64,
        pub after: Option<String>,
        pub sort_key: Option<&'static str>,
        pub reverse: Option<bool>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub collection: Option<RawCollection>,
    }
}

operation!(
    GetCollections,
    get_collections,
    "GetCollections",
    concat!(
        "query GetCollections($first: Int!, $after: String) { ",
        "collections(first: $first, after: $after, sortKey: TITLE) { ",
        "edges { node { id handle title description image { ",
        image_fields!(),
        " } } } pageInfo { hasNextPage endCursor } } }"
    )
);

pub mod get_collections {
    use serde::{Deserialize, Serialize};

    use super::super::responses::{Connection, RawCollection};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub first: i64,
        pub after: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub collections: Connection<RawCollection>,
    }
}

// =============================================================================
// Cart
// =============================================================================

operation!(
    GetCart,
    get_cart,
    "GetCart",
    concat!(
        "query GetCart($cartId: ID!) { cart(id: $cartId) { ...CartFields } } ",
        cart_fragment!()
    )
);

pub mod get_cart {
    use serde::{Deserialize, Serialize};

    use super::super::responses::RawCart;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub cart: Option<RawCart>,
    }
}

/// Input types shared by the cart mutations.
pub mod cart_inputs {
    use serde::Serialize;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartLineInput {
        pub merchandise_id: String,
        pub quantity: u32,
    }

    #[derive(Debug, Clone, Serialize)]
    pub struct CartLineUpdateInput {
        pub id: String,
        pub quantity: u32,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartBuyerIdentityInput {
        pub country_code: String,
    }

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CartInput {
        pub lines: Vec<CartLineInput>,
        #[serde(skip_serializing_if = "Option::is_none")]
        pub buyer_identity: Option<CartBuyerIdentityInput>,
    }
}

operation!(
    CreateCart,
    create_cart,
    "CreateCart",
    cart_mutation!(
        "CreateCart",
        "cartCreate",
        "($input: CartInput!)",
        "(input: $input)"
    )
);

pub mod create_cart {
    use serde::{Deserialize, Serialize};

    use super::super::responses::CartPayload;
    use super::cart_inputs::CartInput;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub input: CartInput,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_create: Option<CartPayload>,
    }
}

operation!(
    AddToCart,
    add_to_cart,
    "AddToCart",
    cart_mutation!(
        "AddToCart",
        "cartLinesAdd",
        "($cartId: ID!, $lines: [CartLineInput!]!)",
        "(cartId: $cartId, lines: $lines)"
    )
);

pub mod add_to_cart {
    use serde::{Deserialize, Serialize};

    use super::super::responses::CartPayload;
    use super::cart_inputs::CartLineInput;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_add: Option<CartPayload>,
    }
}

operation!(
    UpdateCartLines,
    update_cart_lines,
    "UpdateCartLines",
    cart_mutation!(
        "UpdateCartLines",
        "cartLinesUpdate",
        "($cartId: ID!, $lines: [CartLineUpdateInput!]!)",
        "(cartId: $cartId, lines: $lines)"
    )
);

pub mod update_cart_lines {
    use serde::{Deserialize, Serialize};

    use super::super::responses::CartPayload;
    use super::cart_inputs::CartLineUpdateInput;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub lines: Vec<CartLineUpdateInput>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_update: Option<CartPayload>,
    }
}

operation!(
    RemoveFromCart,
    remove_from_cart,
    "RemoveFromCart",
    cart_mutation!(
        "RemoveFromCart",
        "cartLinesRemove",
        "($cartId: ID!, $lineIds: [ID!]!)",
        "(cartId: $cartId, lineIds: $lineIds)"
    )
);

pub mod remove_from_cart {
    use serde::{Deserialize, Serialize};

    use super::super::responses::CartPayload;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub line_ids: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_lines_remove: Option<CartPayload>,
    }
}

operation!(
    UpdateCartDiscountCodes,
    update_cart_discount_codes,
    "UpdateCartDiscountCodes",
    cart_mutation!(
        "UpdateCartDiscountCodes",
        "cartDiscountCodesUpdate",
        "($cartId: ID!, $discountCodes: [String!]!)",
        "(cartId: $cartId, discountCodes: $discountCodes)"
    )
);

pub mod update_cart_discount_codes {
    use serde::{Deserialize, Serialize};

    use super::super::responses::CartPayload;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub discount_codes: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_discount_codes_update: Option<CartPayload>,
    }
}

operation!(
    UpdateCartBuyerIdentity,
    update_cart_buyer_identity,
    "UpdateCartBuyerIdentity",
    cart_mutation!(
        "UpdateCartBuyerIdentity",
        "cartBuyerIdentityUpdate",
        "($cartId: ID!, $buyerIdentity: CartBuyerIdentityInput!)",
        "(cartId: $cartId, buyerIdentity: $buyerIdentity)"
    )
);

pub mod update_cart_buyer_identity {
    use serde::{Deserialize, Serialize};

    use super::super::responses::CartPayload;
    use super::cart_inputs::CartBuyerIdentityInput;

    #[derive(Debug, Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub cart_id: String,
        pub buyer_identity: CartBuyerIdentityInput,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub cart_buyer_identity_update: Option<CartPayload>,
    }
}

// =============================================================================
// Shop
// =============================================================================

operation!(GetShop, get_shop, "GetShop", "query GetShop { shop { name } }");

pub mod get_shop {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables;

    #[derive(Debug, Deserialize)]
    pub struct Shop {
        pub name: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub shop: Shop,
    }
}

// =============================================================================
// Customer accounts
// =============================================================================

operation!(
    CustomerCreate,
    customer_create,
    "CustomerCreate",
    concat!(
        "mutation CustomerCreate($input: CustomerCreateInput!) { ",
        "customerCreate(input: $input) { customer { id } ",
        "customerUserErrors { message } } }"
    )
);

pub mod customer_create {
    use serde::{Deserialize, Serialize};

    use super::super::responses::{RawCustomerRef, RawUserError};

    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CustomerCreateInput {
        pub email: String,
        pub password: String,
        pub first_name: Option<String>,
        pub last_name: Option<String>,
        pub accepts_marketing: bool,
    }

    #[derive(Clone, Serialize)]
    pub struct Variables {
        pub input: CustomerCreateInput,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub customer: Option<RawCustomerRef>,
        #[serde(default)]
        pub customer_user_errors: Vec<RawUserError>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_create: Option<Payload>,
    }
}

operation!(
    CustomerAccessTokenCreate,
    customer_access_token_create,
    "CustomerAccessTokenCreate",
    concat!(
        "mutation CustomerAccessTokenCreate($input: CustomerAccessTokenCreateInput!) { ",
        "customerAccessTokenCreate(input: $input) { ",
        "customerAccessToken { accessToken expiresAt } ",
        "customerUserErrors { message } } }"
    )
);

pub mod customer_access_token_create {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    use super::super::responses::RawUserError;

    #[derive(Clone, Serialize)]
    pub struct CustomerAccessTokenCreateInput {
        pub email: String,
        pub password: String,
    }

    #[derive(Clone, Serialize)]
    pub struct Variables {
        pub input: CustomerAccessTokenCreateInput,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct AccessToken {
        pub access_token: String,
        pub expires_at: DateTime<Utc>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        pub customer_access_token: Option<AccessToken>,
        #[serde(default)]
        pub customer_user_errors: Vec<RawUserError>,
    }

    #[derive(Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_access_token_create: Option<Payload>,
    }
}

operation!(
    CustomerAccessTokenDelete,
    customer_access_token_delete,
    "CustomerAccessTokenDelete",
    concat!(
        "mutation CustomerAccessTokenDelete($customerAccessToken: String!) { ",
        "customerAccessTokenDelete(customerAccessToken: $customerAccessToken) { ",
        "userErrors { message } } }"
    )
);

pub mod customer_access_token_delete {
    use serde::{Deserialize, Serialize};

    use super::super::responses::RawUserError;

    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub customer_access_token: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[serde(default)]
        pub user_errors: Vec<RawUserError>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_access_token_delete: Option<Payload>,
    }
}

operation!(
    CustomerRecover,
    customer_recover,
    "CustomerRecover",
    concat!(
        "mutation CustomerRecover($email: String!) { ",
        "customerRecover(email: $email) { customerUserErrors { message } } }"
    )
);

pub mod customer_recover {
    use serde::{Deserialize, Serialize};

    use super::super::responses::RawUserError;

    #[derive(Debug, Clone, Serialize)]
    pub struct Variables {
        pub email: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Payload {
        #[serde(default)]
        pub customer_user_errors: Vec<RawUserError>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ResponseData {
        pub customer_recover: Option<Payload>,
    }
}

operation!(
    GetCustomer,
    get_customer,
    "GetCustomer",
    concat!(
        "query GetCustomer($customerAccessToken: String!, $orderCount: Int!) { ",
        "customer(customerAccessToken: $customerAccessToken) { ",
        "id email firstName lastName displayName ",
        "orders(first: $orderCount, sortKey: PROCESSED_AT, reverse: true) { edges { node { ",
        "id name processedAt financialStatus fulfillmentStatus statusUrl ",
        "totalPrice { ",
        money!(),
        " } ",
        "lineItems(first: 50) { edges { node { quantity } } pageInfo { hasNextPage endCursor } } ",
        "} } pageInfo { hasNextPage endCursor } } } }"
    )
);

pub mod get_customer {
    use serde::{Deserialize, Serialize};

    use super::super::responses::RawCustomer;

    #[derive(Clone, Serialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Variables {
        pub customer_access_token: String,
        pub order_count: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct ResponseData {
        pub customer: Option<RawCustomer>,
    }
}
