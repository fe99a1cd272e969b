//! Categorical attribute detection in free-text queries
//!
//! Detects a color and a brand by case-insensitive substring match against
//! closed vocabularies. Vocabulary order decides ties: the first entry that
//! occurs anywhere in the query wins.

use serde::{Deserialize, Serialize};

/// Known color vocabulary, in match priority order
pub const KNOWN_COLORS: &[&str] = &[
    "black", "brown", "blonde", "red", "white", "blue", "green", "gray",
];

/// Known brand vocabulary, in match priority order
pub const KNOWN_BRANDS: &[&str] = &["L'Oréal", "Clairol", "Revlon", "Schwarzkopf", "Naturtint"];

/// Attributes detected in a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryAttributes {
    pub color: Option<String>,
    pub brand: Option<String>,
}

impl QueryAttributes {
    pub fn is_empty(&self) -> bool {
        self.color.is_none() && self.brand.is_none()
    }
}

/// Vocabulary-driven attribute extractor
#[derive(Debug, Clone)]
pub struct AttributeExtractor {
    colors: Vec<String>,
    brands: Vec<String>,
}

impl Default for AttributeExtractor {
    fn default() -> Self {
        Self::new(
            KNOWN_COLORS.iter().map(|c| c.to_string()).collect(),
            KNOWN_BRANDS.iter().map(|b| b.to_string()).collect(),
        )
    }
}

impl AttributeExtractor {
    /// Create an extractor over custom vocabularies (order is priority)
    pub fn new(colors: Vec<String>, brands: Vec<String>) -> Self {
        Self { colors, brands }
    }

    /// Extract color and brand from a query
    pub fn extract(&self, query: &str) -> QueryAttributes {
        let query_lower = query.to_lowercase();

        QueryAttributes {
            color: first_match(&self.colors, &query_lower),
            brand: first_match(&self.brands, &query_lower),
        }
    }
}

/// Returns the vocabulary spelling of the first entry contained in `haystack`
fn first_match(vocabulary: &[String], haystack: &str) -> Option<String> {
    vocabulary
        .iter()
        .find(|term| haystack.contains(&term.to_lowercase()))
        .cloned()
}

/// Extract color and brand using the default vocabularies
pub fn extract_color_and_brand(query: &str) -> (Option<String>, Option<String>) {
    let attributes = AttributeExtractor::default().extract(query);
    (attributes.color, attributes.brand)
}
