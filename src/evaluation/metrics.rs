//! Ranking metrics over binary relevance.
//!
//! - Hits@N: whether any of the top N results is relevant
//! - MRR (Mean Reciprocal Rank): 1 / rank of the first relevant result
//!
//! Both are averaged over the evaluated queries. A query that has no entry in
//! the ground truth counts as a query with no relevant products, so it
//! contributes zero to every metric instead of being skipped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use super::EvaluationError;
use crate::dataset::RelevanceMap;
use crate::error::{ProdSearchError, Result};

/// Cutoffs reported when none are configured
pub const DEFAULT_CUTOFFS: [usize; 3] = [1, 5, 10];

/// Returns 1 if any of the first `n` retrieved ids is relevant, else 0.
///
/// # Arguments
///
/// * `retrieved` - Product ids in ranked order, best first
/// * `relevant` - Product ids judged relevant for the query
/// * `n` - Cutoff rank; `n` larger than the result list looks at every result
pub fn hits_at_n(retrieved: &[String], relevant: &BTreeSet<String>, n: usize) -> f64 {
    if retrieved.iter().take(n).any(|id| relevant.contains(id)) {
        1.0
    } else {
        0.0
    }
}

/// Returns 1 / rank of the first relevant id (ranks start at 1), or 0 if none is relevant.
pub fn reciprocal_rank(retrieved: &[String], relevant: &BTreeSet<String>) -> f64 {
    retrieved
        .iter()
        .position(|id| relevant.contains(id))
        .map(|i| 1.0 / (i + 1) as f64)
        .unwrap_or(0.0)
}

/// Aggregated metrics for one evaluation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Mean Hits@N, keyed by N
    pub hits_at_n: BTreeMap<usize, f64>,
    /// Mean Reciprocal Rank
    pub mrr: f64,
    /// Number of queries the means are taken over
    pub num_queries: usize,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationReport {
    /// Write the report as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| ProdSearchError::Io {
                source: e,
                context: format!("Failed to create directory: {:?}", parent),
            })?;
        }

        let json = serde_json::to_string_pretty(self).map_err(|e| ProdSearchError::Json {
            source: e,
            context: "Failed to serialize evaluation report".to_string(),
        })?;

        std::fs::write(path, json).map_err(|e| ProdSearchError::Io {
            source: e,
            context: format!("Failed to write evaluation report: {:?}", path),
        })
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (n, value) in &self.hits_at_n {
            writeln!(f, "Hits@{}: {:.4}", n, value)?;
        }
        write!(f, "MRR: {:.4}", self.mrr)
    }
}

/// Computes mean Hits@N for every cutoff and MRR over `results`.
///
/// # Arguments
///
/// * `results` - Ranked product ids per query id
/// * `ground_truth` - Relevant product ids per query id
/// * `cutoffs` - The N values to report Hits@N for
///
/// # Errors
///
/// Returns [`EvaluationError::NoQueries`] when `results` is empty.
pub fn evaluate_hits_and_mrr(
    results: &BTreeMap<String, Vec<String>>,
    ground_truth: &RelevanceMap,
    cutoffs: &[usize],
) -> std::result::Result<EvaluationReport, EvaluationError> {
    if results.is_empty() {
        return Err(EvaluationError::NoQueries);
    }

    let mut hits: BTreeMap<usize, f64> = cutoffs.iter().map(|&n| (n, 0.0)).collect();
    let mut rr_sum = 0.0;

    for (query_id, retrieved) in results {
        let relevant = ground_truth.relevant(query_id);

        for (n, total) in hits.iter_mut() {
            *total += hits_at_n(retrieved, relevant, *n);
        }
        rr_sum += reciprocal_rank(retrieved, relevant);
    }

    let count = results.len() as f64;
    for total in hits.values_mut() {
        *total /= count;
    }

    Ok(EvaluationReport {
        hits_at_n: hits,
        mrr: rr_sum / count,
        num_queries: results.len(),
        evaluated_at: Utc::now(),
    })
}
