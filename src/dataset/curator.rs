//! Train/test curation from the shopping-queries examples and products tables

use ahash::{AHashMap, AHashSet};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::{
    is_complete_row, DatasetError, ExampleRecord, PairRecord, ProductRecord, RawRow, RelevanceMap,
};
use crate::text::clean_and_filter;

/// Sampling and filtering parameters
#[derive(Debug, Clone)]
pub struct CurationOptions {
    /// Distinct query ids to sample
    pub unique_queries: usize,
    /// Pairs to sample into the train split
    pub max_rows: usize,
    pub seed: u64,
    pub locale: String,
    pub label: String,
    pub split: String,
}

impl Default for CurationOptions {
    fn default() -> Self {
        Self {
            unique_queries: 1000,
            max_rows: 3000,
            seed: 42,
            locale: "us".to_string(),
            label: "E".to_string(),
            split: "train".to_string(),
        }
    }
}

/// Curated splits plus the ground truth built from the whole pool
#[derive(Debug, Clone)]
pub struct CuratedDataset {
    pub train: Vec<PairRecord>,
    pub test: Vec<PairRecord>,
    pub relevance: RelevanceMap,
}

pub struct DatasetCurator {
    options: CurationOptions,
}

impl DatasetCurator {
    pub fn new(options: CurationOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CurationOptions {
        &self.options
    }

    /// Drop incomplete products and clean their free-text fields
    fn clean_products(&self, products: &[RawRow]) -> Result<Vec<ProductRecord>, DatasetError> {
        let mut cleaned = Vec::new();
        for row in products.iter().filter(|row| is_complete_row(row)) {
            let mut product = ProductRecord::from_row(row)?;
            product.product_description = product.product_description.map(|t| clean_and_filter(&t));
            product.product_bullet_point = product.product_bullet_point.map(|t| clean_and_filter(&t));
            cleaned.push(product);
        }

        tracing::info!(
            "Kept {} of {} products after dropping incomplete rows",
            cleaned.len(),
            products.len()
        );
        Ok(cleaned)
    }

    /// Inner join on (locale, product_id), restricted to the configured slice
    fn join(
        &self,
        examples: &[RawRow],
        products: &[ProductRecord],
    ) -> Result<Vec<PairRecord>, DatasetError> {
        let mut by_key: AHashMap<(&str, &str), &ProductRecord> = AHashMap::new();
        for product in products {
            let locale = product.product_locale.as_deref().unwrap_or_default();
            by_key
                .entry((locale, product.product_id.as_str()))
                .or_insert(product);
        }

        let mut joined = Vec::new();
        for row in examples {
            let example = ExampleRecord::from_row(row)?;
            if example.product_locale != self.options.locale
                || example.esci_label != self.options.label
                || example.split != self.options.split
            {
                continue;
            }

            let key = (example.product_locale.as_str(), example.product_id.as_str());
            if let Some(product) = by_key.get(&key) {
                joined.push(PairRecord::join(&example, product));
            }
        }

        Ok(joined)
    }

    /// Run the curation over in-memory tables
    pub fn curate(
        &self,
        examples: &[RawRow],
        products: &[RawRow],
    ) -> Result<CuratedDataset, DatasetError> {
        let products = self.clean_products(products)?;
        let joined = self.join(examples, &products)?;

        // Distinct query ids in first-seen order
        let mut seen = AHashSet::new();
        let query_ids: Vec<&str> = joined
            .iter()
            .map(|p| p.query_id.as_str())
            .filter(|q| seen.insert(*q))
            .collect();

        let sampled = sample_indices(
            self.options.seed,
            query_ids.len(),
            self.options.unique_queries,
            "query ids",
        )?;
        let selected: AHashSet<&str> = sampled.into_iter().map(|i| query_ids[i]).collect();

        let mut seen_pairs = AHashSet::new();
        let pool: Vec<PairRecord> = joined
            .iter()
            .filter(|p| selected.contains(p.query_id.as_str()))
            .filter(|p| seen_pairs.insert(p.pair()))
            .cloned()
            .collect();

        let relevance = RelevanceMap::from_pairs(pool.iter().map(|p| (p.query_id.as_str(), p.product_id.as_str())));

        let train_idx = sample_indices(self.options.seed, pool.len(), self.options.max_rows, "rows")?;
        let train: Vec<PairRecord> = train_idx.into_iter().map(|i| pool[i].clone()).collect();

        let train_pairs: AHashSet<(&str, &str)> = train.iter().map(PairRecord::pair).collect();
        let test: Vec<PairRecord> = pool
            .iter()
            .filter(|p| !train_pairs.contains(&p.pair()))
            .cloned()
            .collect();

        tracing::info!(
            "Curated {} queries: {} pool pairs, {} train, {} test",
            relevance.len(),
            pool.len(),
            train.len(),
            test.len()
        );

        Ok(CuratedDataset {
            train,
            test,
            relevance,
        })
    }
}

/// Sample `amount` distinct indices from `0..length`, deterministic in `seed`
fn sample_indices(
    seed: u64,
    length: usize,
    amount: usize,
    what: &'static str,
) -> Result<Vec<usize>, DatasetError> {
    if amount > length {
        return Err(DatasetError::SampleTooLarge {
            what,
            requested: amount,
            available: length,
        });
    }

    let mut rng = StdRng::seed_from_u64(seed);
    Ok(rand::seq::index::sample(&mut rng, length, amount).into_vec())
}
