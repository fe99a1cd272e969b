//! Hybrid query construction
//!
//! A single scored request does both retrieval stages: the boosted title
//! `match` clause (with `minimum_should_match = 1`) gates candidates, term
//! filters drop documents with the wrong color or brand, and a script score
//! ranks survivors by vector similarity:
//!
//! ```text
//! score = 1.0 + 0.9 * cos(q, title_embed) + 0.1 * cos(q, bullets_embed)
//! ```
//!
//! The offset keeps scores non-negative, which Elasticsearch requires.

use serde_json::{json, Value};

use crate::attributes::QueryAttributes;
use crate::store::{fields, ProductDocument};

/// Fixed result page size
pub const PAGE_SIZE: usize = 10;

/// Boost on the title `match` clause
pub const TITLE_MATCH_BOOST: f32 = 10.0;

pub const TITLE_SIMILARITY_WEIGHT: f32 = 0.9;
pub const BULLETS_SIMILARITY_WEIGHT: f32 = 0.1;
pub const SCORE_OFFSET: f32 = 1.0;

const SCRIPT_SOURCE: &str = "0.9 * cosineSimilarity(params.query_vector, 'product_title_embed') + \
                             0.1 * cosineSimilarity(params.query_vector, 'product_bullets') + 1.0";

/// Exact-match constraint on a keyword field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermFilter {
    pub field: &'static str,
    pub value: String,
}

/// Lexical gate + attribute filters + vector scoring, as one request
#[derive(Debug, Clone)]
pub struct HybridQuery {
    pub text: String,
    pub query_vector: Vec<f32>,
    pub filters: Vec<TermFilter>,
    pub size: usize,
}

impl HybridQuery {
    /// Build the query for `text` and its embedding
    pub fn build(text: impl Into<String>, query_vector: Vec<f32>, attributes: &QueryAttributes) -> Self {
        let mut filters = Vec::new();
        if let Some(color) = &attributes.color {
            filters.push(TermFilter {
                field: fields::COLOR,
                value: color.clone(),
            });
        }
        if let Some(brand) = &attributes.brand {
            filters.push(TermFilter {
                field: fields::BRAND,
                value: brand.clone(),
            });
        }

        Self {
            text: text.into(),
            query_vector,
            filters,
            size: PAGE_SIZE,
        }
    }

    /// The lexical clause must always match, with or without filters
    pub fn minimum_should_match(&self) -> u32 {
        1
    }

    /// Elasticsearch `_search` request body
    pub fn to_request_body(&self) -> Value {
        let filters: Vec<Value> = self
            .filters
            .iter()
            .map(|f| json!({ "term": { (f.field): f.value } }))
            .collect();

        json!({
            "size": self.size,
            "_source": fields::DISPLAY,
            "query": {
                "script_score": {
                    "query": {
                        "bool": {
                            "should": [
                                {
                                    "match": {
                                        (fields::TITLE_TEXT): {
                                            "query": self.text,
                                            "boost": TITLE_MATCH_BOOST
                                        }
                                    }
                                }
                            ],
                            "filter": filters,
                            "minimum_should_match": self.minimum_should_match()
                        }
                    },
                    "script": {
                        "source": SCRIPT_SOURCE,
                        "params": {
                            "query_vector": self.query_vector
                        }
                    }
                }
            }
        })
    }

    /// Evaluate the script score against stored title and bullet vectors
    pub fn script_score(&self, title_embed: &[f32], bullets_embed: &[f32]) -> f32 {
        TITLE_SIMILARITY_WEIGHT * cosine_similarity(&self.query_vector, title_embed)
            + BULLETS_SIMILARITY_WEIGHT * cosine_similarity(&self.query_vector, bullets_embed)
            + SCORE_OFFSET
    }

    /// Whether a document passes the filters and the lexical gate
    pub fn matches(&self, doc: &ProductDocument) -> bool {
        let filters_pass = self.filters.iter().all(|f| match f.field {
            fields::COLOR => doc.product_color == f.value,
            fields::BRAND => doc.product_brand == f.value,
            _ => false,
        });

        filters_pass && lexical_match(&self.text, &doc.product_title_text)
    }
}

/// True when query and title share at least one analyzed token
fn lexical_match(query: &str, title: &str) -> bool {
    let title_tokens = analyze(title);
    analyze(query).iter().any(|t| title_tokens.contains(t))
}

/// Lowercased alphanumeric tokens, close to the standard analyzer
fn analyze(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Cosine similarity in [-1, 1]; 0 for mismatched lengths or zero vectors
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| *x as f64 * *y as f64).sum();
    let mag_a: f64 = a.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();
    let mag_b: f64 = b.iter().map(|x| (*x as f64).powi(2)).sum::<f64>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    (dot / (mag_a * mag_b)) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(color: Option<&str>, brand: Option<&str>) -> QueryAttributes {
        QueryAttributes {
            color: color.map(str::to_string),
            brand: brand.map(str::to_string),
        }
    }

    #[test]
    fn test_identical_vectors_score_two() {
        let v = vec![0.3, -0.2, 0.9, 0.1];
        let query = HybridQuery::build("dye", v.clone(), &attrs(None, None));
        let score = query.script_score(&v, &v);
        assert!((score - 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_opposite_vectors_score_zero() {
        let v = vec![1.0, 2.0];
        let neg = vec![-1.0, -2.0];
        let query = HybridQuery::build("dye", v, &attrs(None, None));
        assert!(query.script_score(&neg, &neg).abs() < 1e-6);
    }

    #[test]
    fn test_weights() {
        let query = HybridQuery::build("dye", vec![1.0, 0.0], &attrs(None, None));
        // title aligned, bullets orthogonal
        let score = query.script_score(&[1.0, 0.0], &[0.0, 1.0]);
        assert!((score - 1.9).abs() < 1e-6);
        // title orthogonal, bullets aligned
        let score = query.script_score(&[0.0, 1.0], &[2.0, 0.0]);
        assert!((score - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_no_filters_without_attributes() {
        let query = HybridQuery::build("fabric storage bins", vec![0.5], &attrs(None, None));
        assert!(query.filters.is_empty());
        assert_eq!(query.minimum_should_match(), 1);

        let body = query.to_request_body();
        let bool_query = &body["query"]["script_score"]["query"]["bool"];
        assert_eq!(bool_query["filter"], json!([]));
        assert_eq!(bool_query["minimum_should_match"], json!(1));
    }

    #[test]
    fn test_filters_from_attributes() {
        let query = HybridQuery::build("red Clairol dye", vec![0.5], &attrs(Some("red"), Some("Clairol")));
        assert_eq!(query.minimum_should_match(), 1);

        let body = query.to_request_body();
        let bool_query = &body["query"]["script_score"]["query"]["bool"];
        assert_eq!(
            bool_query["filter"],
            json!([
                { "term": { "product_color": "red" } },
                { "term": { "product_brand": "Clairol" } }
            ])
        );
        assert_eq!(bool_query["minimum_should_match"], json!(1));
    }

    #[test]
    fn test_request_body_shape() {
        let query = HybridQuery::build("hair dye", vec![0.25, 0.5], &attrs(None, None));
        let body = query.to_request_body();

        assert_eq!(body["size"], json!(10));
        let should = &body["query"]["script_score"]["query"]["bool"]["should"][0];
        assert_eq!(should["match"]["product_title_text"]["query"], json!("hair dye"));
        assert_eq!(should["match"]["product_title_text"]["boost"], json!(10.0));

        let script = &body["query"]["script_score"]["script"];
        assert_eq!(script["params"]["query_vector"], json!([0.25, 0.5]));
        let source = script["source"].as_str().unwrap();
        assert!(source.contains("0.9 * cosineSimilarity(params.query_vector, 'product_title_embed')"));
        assert!(source.contains("0.1 * cosineSimilarity(params.query_vector, 'product_bullets')"));
        assert!(source.ends_with("+ 1.0"));
    }

    #[test]
    fn test_lexical_gate() {
        assert!(lexical_match("Black Hair-Dye", "permanent hair color"));
        assert!(!lexical_match("frying pan", "permanent hair color"));
        assert!(!lexical_match("", "permanent hair color"));
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[3.0, 4.0], &[6.0, 8.0]) - 1.0).abs() < 1e-6);
    }
}
