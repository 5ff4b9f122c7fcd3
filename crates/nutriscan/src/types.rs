//! Core data types shared by the scan, lookup, and insight steps.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Per-100g nutrient values keyed by display name (e.g. `Sugars`).
pub type NutritionFacts = BTreeMap<String, f64>;

/// A decoded barcode value. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Barcode(String);

impl Barcode {
    /// Build a barcode from raw text, trimming surrounding whitespace.
    ///
    /// Returns `None` when nothing is left after trimming.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Barcode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Barcode::new(s).ok_or_else(|| "barcode must not be empty".to_string())
    }
}

/// Result of a successful decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecodedBarcode {
    pub barcode: Barcode,
    /// Symbology reported by the decoder, e.g. `EAN_13`.
    pub format: String,
}

/// One entry of a product's ingredient list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub percent_estimate: Option<f64>,
}

/// Flattened view of a catalog product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub barcode: Barcode,
    pub product_name: String,
    pub brand: String,
    pub generic_name: String,
    pub image_url: Option<String>,
    pub ingredients: Option<Vec<Ingredient>>,
    pub allergens: Option<String>,
    pub categories: Option<String>,
    pub labels: Option<String>,
    pub nutrition_facts: NutritionFacts,
}

/// Everything a full run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub barcode: Barcode,
    pub product: ProductRecord,
    pub insight: String,
}
