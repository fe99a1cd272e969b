//! Offline retrieval evaluation against the held-out test split

mod metrics;

pub use metrics::{
    evaluate_hits_and_mrr, hits_at_n, reciprocal_rank, EvaluationReport, DEFAULT_CUTOFFS,
};

use ahash::AHashSet;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::dataset::{read_csv, PairRecord, RelevanceMap};
use crate::error::Result;
use crate::retrieval::ProductSearcher;

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("No queries to evaluate")]
    NoQueries,
}

/// Distinct (query_id, query) pairs, first occurrence wins
pub fn unique_queries(rows: &[PairRecord]) -> Vec<(String, String)> {
    let mut seen = AHashSet::new();
    rows.iter()
        .filter(|row| seen.insert(row.query_id.as_str()))
        .map(|row| (row.query_id.clone(), row.query.clone()))
        .collect()
}

/// Runs every test query through a searcher and scores the rankings
pub struct Evaluator<'a> {
    searcher: &'a ProductSearcher<'a>,
    cutoffs: Vec<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(searcher: &'a ProductSearcher<'a>) -> Self {
        Self {
            searcher,
            cutoffs: DEFAULT_CUTOFFS.to_vec(),
        }
    }

    pub fn with_cutoffs(mut self, cutoffs: Vec<usize>) -> Self {
        self.cutoffs = cutoffs;
        self
    }

    /// Search each query and collect the ranked product ids per query id
    pub fn retrieve(&self, queries: &[(String, String)]) -> Result<BTreeMap<String, Vec<String>>> {
        let mut results = BTreeMap::new();

        for (i, (query_id, query)) in queries.iter().enumerate() {
            let hits = self.searcher.search(query)?;
            tracing::debug!("Query {} ({:?}): {} hits", query_id, query, hits.len());

            results.insert(
                query_id.clone(),
                hits.into_iter().map(|hit| hit.product_id).collect(),
            );

            if (i + 1) % 100 == 0 {
                tracing::info!("Evaluated {}/{} queries", i + 1, queries.len());
            }
        }

        Ok(results)
    }

    /// Evaluate the queries of `rows` against `ground_truth`
    pub fn evaluate(&self, rows: &[PairRecord], ground_truth: &RelevanceMap) -> Result<EvaluationReport> {
        let queries = unique_queries(rows);
        tracing::info!("Evaluating {} distinct queries", queries.len());

        let results = self.retrieve(&queries)?;
        Ok(evaluate_hits_and_mrr(&results, ground_truth, &self.cutoffs)?)
    }

    /// Load the test CSV and relevance map, then evaluate
    pub fn run(&self, test_file: &Path, relevance_map: &Path) -> Result<EvaluationReport> {
        let rows: Vec<PairRecord> = read_csv(test_file)?;
        let ground_truth = RelevanceMap::load(relevance_map)?;

        let report = self.evaluate(&rows, &ground_truth)?;
        for line in report.to_string().lines() {
            tracing::info!("{}", line);
        }
        Ok(report)
    }
}
