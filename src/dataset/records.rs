//! Row types for the shopping-queries tables and the curated splits

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::DatasetError;

/// A source table row: column name to value, `None` for nulls
pub type RawRow = BTreeMap<String, Option<String>>;

/// Placeholder values that mark a product field as unusable
const INVALID_VALUES: [&str; 3] = ["", "nan", "none"];

/// True when every column of `row` holds a real value
pub fn is_complete_row(row: &RawRow) -> bool {
    row.values().all(|value| match value {
        Some(v) => !INVALID_VALUES.contains(&v.trim().to_lowercase().as_str()),
        None => false,
    })
}

fn required(row: &RawRow, table: &'static str, column: &str) -> Result<String, DatasetError> {
    match row.get(column) {
        Some(value) => Ok(value.clone().unwrap_or_default()),
        None => Err(DatasetError::MissingColumn {
            table,
            column: column.to_string(),
        }),
    }
}

fn optional(row: &RawRow, column: &str) -> Option<String> {
    row.get(column).cloned().flatten()
}

/// Query/product judgement from the examples table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExampleRecord {
    pub example_id: String,
    pub query: String,
    pub query_id: String,
    pub product_id: String,
    pub product_locale: String,
    pub esci_label: String,
    pub split: String,
}

impl ExampleRecord {
    pub fn from_row(row: &RawRow) -> Result<Self, DatasetError> {
        const TABLE: &str = "examples";
        Ok(Self {
            example_id: optional(row, "example_id").unwrap_or_default(),
            query: required(row, TABLE, "query")?,
            query_id: required(row, TABLE, "query_id")?,
            product_id: required(row, TABLE, "product_id")?,
            product_locale: required(row, TABLE, "product_locale")?,
            esci_label: required(row, TABLE, "esci_label")?,
            split: required(row, TABLE, "split")?,
        })
    }
}

/// Product attributes; text fields are optional once written to CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    #[serde(default)]
    pub product_title: Option<String>,
    #[serde(default)]
    pub product_description: Option<String>,
    #[serde(default)]
    pub product_bullet_point: Option<String>,
    #[serde(default)]
    pub product_brand: Option<String>,
    #[serde(default)]
    pub product_color: Option<String>,
    #[serde(default)]
    pub product_locale: Option<String>,
}

impl ProductRecord {
    pub fn from_row(row: &RawRow) -> Result<Self, DatasetError> {
        Ok(Self {
            product_id: required(row, "products", "product_id")?,
            product_title: optional(row, "product_title"),
            product_description: optional(row, "product_description"),
            product_bullet_point: optional(row, "product_bullet_point"),
            product_brand: optional(row, "product_brand"),
            product_color: optional(row, "product_color"),
            product_locale: optional(row, "product_locale"),
        })
    }
}

/// Joined example + product row, the shape of the train and test CSVs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairRecord {
    pub example_id: String,
    pub query: String,
    pub query_id: String,
    pub product_id: String,
    pub product_locale: String,
    pub esci_label: String,
    pub split: String,
    pub product_title: Option<String>,
    pub product_description: Option<String>,
    pub product_bullet_point: Option<String>,
    pub product_brand: Option<String>,
    pub product_color: Option<String>,
}

impl PairRecord {
    pub fn join(example: &ExampleRecord, product: &ProductRecord) -> Self {
        Self {
            example_id: example.example_id.clone(),
            query: example.query.clone(),
            query_id: example.query_id.clone(),
            product_id: example.product_id.clone(),
            product_locale: example.product_locale.clone(),
            esci_label: example.esci_label.clone(),
            split: example.split.clone(),
            product_title: product.product_title.clone(),
            product_description: product.product_description.clone(),
            product_bullet_point: product.product_bullet_point.clone(),
            product_brand: product.product_brand.clone(),
            product_color: product.product_color.clone(),
        }
    }

    /// The (query_id, product_id) key
    pub fn pair(&self) -> (&str, &str) {
        (&self.query_id, &self.product_id)
    }
}

impl From<&PairRecord> for ProductRecord {
    fn from(pair: &PairRecord) -> Self {
        Self {
            product_id: pair.product_id.clone(),
            product_title: pair.product_title.clone(),
            product_description: pair.product_description.clone(),
            product_bullet_point: pair.product_bullet_point.clone(),
            product_brand: pair.product_brand.clone(),
            product_color: pair.product_color.clone(),
            product_locale: Some(pair.product_locale.clone()),
        }
    }
}
