//! Product listing filters.
//!
//! Translates listing query-string parameters into a Shopify search query
//! string and sort order. There is no ranking here: Shopify does the
//! matching, this only concatenates terms.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::sale::SaleInfo;

/// Query-string parameters accepted by product listings.
///
/// Everything is kept as a string so malformed values are ignored instead
/// of failing the whole request.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct ListingParams {
    /// Free-text search.
    pub q: Option<String>,
    /// Product type, e.g. `T-Shirts`.
    #[serde(rename = "type")]
    pub product_type: Option<String>,
    pub vendor: Option<String>,
    /// Comma-separated tags; a product matching any of them is included.
    pub tag: Option<String>,
    /// `true`, `1` or `on` restricts to products available for sale.
    pub available: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub sort: Option<String>,
    /// Discount range, e.g. `10-30`, `50+`, or `any`.
    pub discount: Option<String>,
    /// Pagination cursor.
    pub after: Option<String>,
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty())
}

fn quote(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

fn parse_price(value: Option<&String>) -> Option<Decimal> {
    non_blank(value)
        .and_then(|v| Decimal::from_str(v).ok())
        .filter(|d| !d.is_sign_negative())
}

impl ListingParams {
    /// Free-text search term, if any.
    #[must_use]
    pub fn search_text(&self) -> Option<&str> {
        non_blank(self.q.as_ref())
    }

    /// Whether the availability filter is switched on.
    #[must_use]
    pub fn only_available(&self) -> bool {
        non_blank(self.available.as_ref())
            .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "on"))
    }

    /// Requested tags (trimmed, blanks removed).
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        non_blank(self.tag.as_ref())
            .map(|t| {
                t.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parsed sort order.
    #[must_use]
    pub fn sort_order(&self) -> SortOrder {
        SortOrder::parse(non_blank(self.sort.as_ref()), self.search_text().is_some())
    }

    /// Parsed discount range.
    #[must_use]
    pub fn discount_range(&self) -> Option<DiscountRange> {
        non_blank(self.discount.as_ref()).and_then(DiscountRange::parse)
    }

    /// Pagination cursor.
    #[must_use]
    pub fn cursor(&self) -> Option<String> {
        non_blank(self.after.as_ref()).map(str::to_string)
    }

    /// Build the Shopify search query string, or `None` when unfiltered.
    #[must_use]
    pub fn search_query(&self) -> Option<String> {
        let mut terms: Vec<String> = Vec::new();

        if let Some(text) = self.search_text() {
            terms.push(text.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        if let Some(product_type) = non_blank(self.product_type.as_ref()) {
            terms.push(format!("product_type:{}", quote(product_type)));
        }
        if let Some(vendor) = non_blank(self.vendor.as_ref()) {
            terms.push(format!("vendor:{}", quote(vendor)));
        }

        let tags = self.tags();
        match tags.as_slice() {
            [] => {}
            [tag] => terms.push(format!("tag:{}", quote(tag))),
            many => {
                let any = many
                    .iter()
                    .map(|t| format!("tag:{}", quote(t)))
                    .collect::<Vec<_>>()
                    .join(" OR ");
                terms.push(format!("({any})"));
            }
        }

        if self.only_available() {
            terms.push("available_for_sale:true".to_string());
        }
        if let Some(min) = parse_price(self.min_price.as_ref()) {
            terms.push(format!("variants.price:>={min}"));
        }
        if let Some(max) = parse_price(self.max_price.as_ref()) {
            terms.push(format!("variants.price:<={max}"));
        }

        if terms.is_empty() {
            None
        } else {
            Some(terms.join(" AND "))
        }
    }

    /// Non-empty filter parameters (everything except the cursor), for
    /// building pagination and sort links.
    #[must_use]
    pub fn link_pairs(&self) -> Vec<(&'static str, String)> {
        [
            ("q", &self.q),
            ("type", &self.product_type),
            ("vendor", &self.vendor),
            ("tag", &self.tag),
            ("available", &self.available),
            ("min_price", &self.min_price),
            ("max_price", &self.max_price),
            ("sort", &self.sort),
            ("discount", &self.discount),
        ]
        .into_iter()
        .filter_map(|(key, value)| non_blank(value.as_ref()).map(|v| (key, v.to_string())))
        .collect()
    }
}

/// Listing sort orders exposed to shoppers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortOrder {
    #[default]
    Featured,
    Newest,
    PriceAsc,
    PriceDesc,
    TitleAsc,
    TitleDesc,
    Relevance,
}

impl SortOrder {
    /// Sort options shown in the listing selector.
    pub const OPTIONS: [Self; 6] = [
        Self::Featured,
        Self::Newest,
        Self::PriceAsc,
        Self::PriceDesc,
        Self::TitleAsc,
        Self::TitleDesc,
    ];

    /// Parse a `sort` parameter. Unknown values fall back to the default,
    /// which is relevance for searches and featured otherwise.
    #[must_use]
    pub fn parse(value: Option<&str>, searching: bool) -> Self {
        let fallback = if searching {
            Self::Relevance
        } else {
            Self::Featured
        };
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("featured") => Self::Featured,
            Some("newest") => Self::Newest,
            Some("price-asc") => Self::PriceAsc,
            Some("price-desc") => Self::PriceDesc,
            Some("title-asc") => Self::TitleAsc,
            Some("title-desc") => Self::TitleDesc,
            Some("relevance") if searching => Self::Relevance,
            _ => fallback,
        }
    }

    /// Query parameter value.
    #[must_use]
    pub const fn as_param(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::Newest => "newest",
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::TitleAsc => "title-asc",
            Self::TitleDesc => "title-desc",
            Self::Relevance => "relevance",
        }
    }

    /// Label for the sort selector.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Featured => "Featured",
            Self::Newest => "Newest",
            Self::PriceAsc => "Price: low to high",
            Self::PriceDesc => "Price: high to low",
            Self::TitleAsc => "A-Z",
            Self::TitleDesc => "Z-A",
            Self::Relevance => "Relevance",
        }
    }

    /// Shopify `ProductSortKeys` value.
    #[must_use]
    pub const fn product_sort_key(self) -> &'static str {
        match self {
            Self::Featured => "BEST_SELLING",
            Self::Newest => "CREATED_AT",
            Self::PriceAsc | Self::PriceDesc => "PRICE",
            Self::TitleAsc | Self::TitleDesc => "TITLE",
            Self::Relevance => "RELEVANCE",
        }
    }

    /// Shopify `ProductCollectionSortKeys` value.
    #[must_use]
    pub const fn collection_sort_key(self) -> &'static str {
        match self {
            Self::Featured => "COLLECTION_DEFAULT",
            Self::Newest => "CREATED",
            Self::PriceAsc | Self::PriceDesc => "PRICE",
            Self::TitleAsc | Self::TitleDesc => "TITLE",
            Self::Relevance => "RELEVANCE",
        }
    }

    /// Whether Shopify should reverse the sort key order.
    #[must_use]
    pub const fn reverse(self) -> bool {
        matches!(self, Self::Newest | Self::PriceDesc | Self::TitleDesc)
    }
}

/// A discount percentage range used to filter listings after fetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiscountRange {
    pub min: u8,
    /// Inclusive upper bound; `None` is open-ended.
    pub max: Option<u8>,
}

impl DiscountRange {
    /// Ranges offered in the sale filter.
    pub const PRESETS: [(&'static str, &'static str); 4] = [
        ("any", "Any discount"),
        ("10-30", "10% to 30% off"),
        ("30-50", "30% to 50% off"),
        ("50+", "50% off or more"),
    ];

    /// Parse `N-M`, `N+`, or `any`. Returns `None` for anything else.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.eq_ignore_ascii_case("any") {
            return Some(Self { min: 1, max: None });
        }
        if let Some(min) = value.strip_suffix('+') {
            let min: u8 = min.trim().parse().ok()?;
            return (min <= 100).then_some(Self { min, max: None });
        }
        let (min, max) = value.split_once('-')?;
        let min: u8 = min.trim().parse().ok()?;
        let max: u8 = max.trim().parse().ok()?;
        (min <= max && max <= 100).then_some(Self {
            min,
            max: Some(max),
        })
    }

    /// Whether a discount percentage falls within the range.
    #[must_use]
    pub fn contains(self, percent: u8) -> bool {
        percent >= self.min && self.max.is_none_or(|max| percent <= max)
    }

    /// Whether a product with this sale state belongs in the range.
    ///
    /// Full-price products count as 0% off.
    #[must_use]
    pub fn matches(self, sale: Option<&SaleInfo>) -> bool {
        self.contains(sale.map_or(0, |s| s.percent_off))
    }
}
