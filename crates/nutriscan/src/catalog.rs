//! Open Food Facts product lookup.
//!
//! One GET per barcode against `/api/v2/product/<barcode>.json`, reshaped into a
//! [`ProductRecord`]. Unknown products and service failures are separate
//! error kinds so callers can tell "not in the catalog" from "catalog down".

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use reqwest::Url;

use crate::types::{Barcode, Ingredient, NutritionFacts, ProductRecord};

/// Public Open Food Facts instance.
pub const DEFAULT_CATALOG_URL: &str = "https://world.openfoodfacts.org";

/// Suffix marking a per-100g value in the `nutriments` map.
const PER_100G_SUFFIX: &str = "_100g";

const USER_AGENT: &str = concat!(
    "nutriscan/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/nutriscan/nutriscan)"
);

const NO_NAME: &str = "No name available";
const NO_BRAND: &str = "No brand available";
const NO_DESCRIPTION: &str = "No description available";

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("product {0} not found in Open Food Facts database")]
    NotFound(Barcode),
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid catalog URL: {0}")]
    InvalidUrl(String),
}

impl LookupError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LookupError::NotFound(_))
    }
}

/// HTTP client for the product catalog.
pub struct CatalogClient {
    client: reqwest::Client,
    base_url: Url,
}

impl CatalogClient {
    /// Create a client for the catalog at `base_url` (no trailing slash needed).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, LookupError> {
        let parsed = Url::parse(base_url)
            .map_err(|e| LookupError::InvalidUrl(format!("{base_url}: {e}")))?;
        if parsed.cannot_be_a_base() {
            return Err(LookupError::InvalidUrl(base_url.to_string()));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// `<base>/api/v2/product/<barcode>.json`, with the barcode kept as a
    /// single percent-encoded path segment.
    pub fn product_url(&self, barcode: &Barcode) -> Result<Url, LookupError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "v2", "product"])
            .push(&format!("{barcode}.json"));
        Ok(url)
    }

    /// Fetch and reshape the product for `barcode`.
    pub async fn fetch_product(&self, barcode: &Barcode) -> Result<ProductRecord, LookupError> {
        let url = self.product_url(barcode)?;
        info!(url = %url, "fetching product from catalog");

        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            info!(barcode = %barcode, "catalog has no such product");
            return Err(LookupError::NotFound(barcode.clone()));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "catalog request failed");
            return Err(LookupError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let data: Value = serde_json::from_str(&body)?;
        parse_response(barcode, &data)
    }
}

/// Interpret a decoded catalog response body.
pub fn parse_response(barcode: &Barcode, data: &Value) -> Result<ProductRecord, LookupError> {
    let found = data.get("status").and_then(Value::as_i64) == Some(1);
    match data.get("product") {
        Some(product) if found && product.is_object() => {
            let record = reshape_product(barcode, product);
            info!(
                barcode = %barcode,
                name = %record.product_name,
                facts = record.nutrition_facts.len(),
                "product found"
            );
            Ok(record)
        }
        _ => {
            info!(barcode = %barcode, "catalog reported product not found");
            Err(LookupError::NotFound(barcode.clone()))
        }
    }
}

/// Copy the descriptive fields out of a catalog `product` object.
pub fn reshape_product(barcode: &Barcode, product: &Value) -> ProductRecord {
    ProductRecord {
        barcode: barcode.clone(),
        product_name: text_or(product, "product_name", NO_NAME),
        brand: text_or(product, "brands", NO_BRAND),
        generic_name: text_or(product, "generic_name", NO_DESCRIPTION),
        image_url: text(product, "image_url"),
        ingredients: product.get("ingredients").and_then(extract_ingredients),
        allergens: text(product, "allergens"),
        categories: text(product, "categories"),
        labels: text(product, "labels"),
        nutrition_facts: product
            .get("nutriments")
            .map(extract_nutrition_facts)
            .unwrap_or_default(),
    }
}

/// Keep the per-100g entries of a `nutriments` map under display names.
pub fn extract_nutrition_facts(nutriments: &Value) -> NutritionFacts {
    let Some(map) = nutriments.as_object() else {
        return NutritionFacts::new();
    };

    map.iter()
        .filter_map(|(key, value)| {
            let stem = key.strip_suffix(PER_100G_SUFFIX)?;
            let amount = number(value)?;
            Some((nutrient_display_name(stem), amount))
        })
        .collect()
}

/// Read an ingredient list entry by entry; entries that are not objects are skipped.
pub fn extract_ingredients(list: &Value) -> Option<Vec<Ingredient>> {
    let entries = list.as_array()?;
    Some(
        entries
            .iter()
            .filter(|entry| entry.is_object())
            .map(|entry| Ingredient {
                id: text(entry, "id"),
                text: text(entry, "text"),
                percent_estimate: entry.get("percent_estimate").and_then(number),
            })
            .collect(),
    )
}

/// A finite number, given either as a JSON number or as a numeric string.
fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// `saturated-fat` -> `Saturated-fat`, `vitamin_b12` -> `Vitamin b12`.
pub fn nutrient_display_name(stem: &str) -> String {
    let spaced = stem.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

fn text(product: &Value, key: &str) -> Option<String> {
    product
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn text_or(product: &Value, key: &str, default: &str) -> String {
    text(product, key).unwrap_or_else(|| default.to_string())
}
