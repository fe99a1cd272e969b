//! Integration Test: train/test curation properties over a synthetic catalogue

use ahash::AHashSet;
use tempfile::TempDir;

use prodsearch::dataset::{
    read_csv, write_csv, CurationOptions, DatasetCurator, PairRecord, RawRow, RelevanceMap,
};

const QUERIES: usize = 20;
const PRODUCTS_PER_QUERY: usize = 3;

fn raw(values: &[(&str, String)]) -> RawRow {
    values
        .iter()
        .map(|(k, v)| (k.to_string(), Some(v.clone())))
        .collect()
}

fn catalogue() -> (Vec<RawRow>, Vec<RawRow>) {
    let mut examples = Vec::new();
    let mut products = Vec::new();

    for q in 0..QUERIES {
        for p in 0..PRODUCTS_PER_QUERY {
            let product_id = format!("P{}-{}", q, p);
            examples.push(raw(&[
                ("example_id", format!("{}", q * 10 + p)),
                ("query", format!("query number {}", q)),
                ("query_id", q.to_string()),
                ("product_id", product_id.clone()),
                ("product_locale", "us".to_string()),
                ("esci_label", "E".to_string()),
                ("split", "train".to_string()),
            ]));
            products.push(raw(&[
                ("product_id", product_id),
                ("product_title", format!("Product {} for query {}", p, q)),
                ("product_description", "<p>A <i>useful</i> product</p>".to_string()),
                ("product_bullet_point", "Works well".to_string()),
                ("product_brand", "Revlon".to_string()),
                ("product_color", "brown".to_string()),
                ("product_locale", "us".to_string()),
            ]));
        }
    }

    (examples, products)
}

fn options(seed: u64) -> CurationOptions {
    CurationOptions {
        unique_queries: 10,
        max_rows: 18,
        seed,
        ..CurationOptions::default()
    }
}

#[test]
fn test_train_and_test_partition_the_pool() {
    let (examples, products) = catalogue();
    let curated = DatasetCurator::new(options(42))
        .curate(&examples, &products)
        .unwrap();

    assert_eq!(curated.relevance.len(), 10);
    assert_eq!(curated.relevance.pair_count(), 10 * PRODUCTS_PER_QUERY);
    assert_eq!(curated.train.len(), 18);
    assert_eq!(curated.test.len(), 12);

    let train: AHashSet<(&str, &str)> = curated.train.iter().map(PairRecord::pair).collect();
    let test: AHashSet<(&str, &str)> = curated.test.iter().map(PairRecord::pair).collect();
    assert!(train.is_disjoint(&test));

    for (query_id, product_id) in train.iter().chain(test.iter()) {
        assert!(curated.relevance.contains(query_id, product_id));
    }
    println!("✓ {} train / {} test pairs", train.len(), test.len());
}

#[test]
fn test_curation_is_deterministic() {
    let (examples, products) = catalogue();

    let a = DatasetCurator::new(options(7)).curate(&examples, &products).unwrap();
    let b = DatasetCurator::new(options(7)).curate(&examples, &products).unwrap();
    assert_eq!(a.train, b.train);
    assert_eq!(a.test, b.test);
    assert_eq!(a.relevance, b.relevance);
}

#[test]
fn test_text_fields_are_cleaned() {
    let (examples, products) = catalogue();
    let curated = DatasetCurator::new(options(42))
        .curate(&examples, &products)
        .unwrap();

    assert!(curated
        .train
        .iter()
        .all(|row| row.product_description.as_deref() == Some("A useful product")));
}

#[test]
fn test_sample_larger_than_pool_fails() {
    let (examples, products) = catalogue();
    let result = DatasetCurator::new(CurationOptions {
        unique_queries: QUERIES + 1,
        ..options(42)
    })
    .curate(&examples, &products);

    assert!(result.is_err());
}

#[test]
fn test_artifacts_round_trip() {
    let (examples, products) = catalogue();
    let curated = DatasetCurator::new(options(42))
        .curate(&examples, &products)
        .unwrap();

    let temp = TempDir::new().unwrap();
    let train_path = temp.path().join("train/train.csv");
    let map_path = temp.path().join("all_pairs.json");

    write_csv(&train_path, &curated.train).unwrap();
    curated.relevance.save(&map_path).unwrap();

    let train: Vec<PairRecord> = read_csv(&train_path).unwrap();
    assert_eq!(train, curated.train);
    assert_eq!(RelevanceMap::load(&map_path).unwrap(), curated.relevance);
}
