use crate::extract::jsonld;
use crate::extract::snapshot::PageSnapshot;
use serde::Serialize;
use serde_json::Value;

/// Title used when neither linked data nor the DOM yields one
pub const UNKNOWN_TITLE: &str = "Unknown product";

/// Price portion of a product record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PriceInfo {
    pub value: Option<f64>,
    pub currency: Option<String>,
    pub display_text: Option<String>,
    pub availability: Option<String>,
}

/// Aggregate rating portion of a product record
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RatingInfo {
    pub value: Option<f64>,
    pub review_count: Option<u64>,
}

/// Normalized product data assembled from one page snapshot.
///
/// Every field is populated independently; a gap in one source never blocks
/// the others, so partial records are valid, expected results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductRecord {
    pub title: String,
    pub url: Option<String>,
    pub sku: Option<String>,
    pub brand: Option<String>,
    pub description: Option<String>,
    pub price: PriceInfo,
    pub rating: Option<RatingInfo>,
    pub seller: Option<String>,
    pub breadcrumbs: Vec<String>,
    pub images: Vec<String>,
    pub raw_price_text: Option<String>,
}

impl ProductRecord {
    /// Build a record from a snapshot, best-effort field by field
    pub fn from_snapshot(snapshot: &PageSnapshot, url: Option<String>) -> Self {
        let node = snapshot.product_node.as_ref();
        let offer = node.and_then(|n| first_offer(n));

        let title = node
            .and_then(|n| n.get("name"))
            .and_then(|v| jsonld::as_string(v))
            .or_else(|| snapshot.heading.clone())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let price_value = offer
            .and_then(|o| o.get("price"))
            .and_then(jsonld::as_number)
            .or_else(|| snapshot.price_text.as_deref().and_then(jsonld::parse_amount));

        let currency = offer
            .and_then(|o| o.get("priceCurrency"))
            .and_then(|v| jsonld::as_string(v))
            .or_else(|| {
                snapshot
                    .price_text
                    .as_deref()
                    .and_then(jsonld::infer_currency)
                    .map(String::from)
            });

        let availability = offer
            .and_then(|o| o.get("availability"))
            .and_then(|v| jsonld::as_string(v));

        let rating = node
            .and_then(|n| n.get("aggregateRating"))
            .filter(|r| r.is_object())
            .map(|r| RatingInfo {
                value: r.get("ratingValue").and_then(jsonld::as_number),
                review_count: r
                    .get("reviewCount")
                    .or_else(|| r.get("ratingCount"))
                    .and_then(jsonld::as_count),
            });

        Self {
            title,
            url,
            sku: node.and_then(|n| {
                n.get("sku")
                    .and_then(|v| jsonld::as_string(v))
                    .or_else(|| n.get("mpn").and_then(|v| jsonld::as_string(v)))
            }),
            brand: node
                .and_then(|n| n.get("brand"))
                .and_then(jsonld::resolve_name),
            description: node
                .and_then(|n| n.get("description"))
                .and_then(|v| jsonld::as_string(v)),
            price: PriceInfo {
                value: price_value,
                currency,
                display_text: snapshot.price_text.clone(),
                availability,
            },
            rating,
            seller: offer
                .and_then(|o| o.get("seller"))
                .and_then(jsonld::resolve_name),
            breadcrumbs: snapshot.breadcrumbs.clone(),
            images: node
                .and_then(|n| n.get("image"))
                .map(jsonld::as_image_list)
                .unwrap_or_default(),
            raw_price_text: snapshot.price_text.clone(),
        }
    }

    /// Minimal record for scenarios that only open a page: title and URL
    pub fn minimal(title: Option<String>, url: Option<String>) -> Self {
        Self {
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            url,
            sku: None,
            brand: None,
            description: None,
            price: PriceInfo::default(),
            rating: None,
            seller: None,
            breadcrumbs: Vec::new(),
            images: Vec::new(),
            raw_price_text: None,
        }
    }
}

/// First offer of a product node; `offers` may be an object or a list
fn first_offer(node: &Value) -> Option<&Value> {
    let offers = node.get("offers")?;
    match offers {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(offers),
        _ => None,
    }
}
