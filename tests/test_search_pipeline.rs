//! Integration Test: dataset -> index -> search -> evaluate
//!
//! Runs the whole pipeline against the in-memory store with a deterministic
//! bag-of-words embedder, so no model download or cluster is needed.

use serde_json::json;
use std::path::Path;
use tempfile::TempDir;

use prodsearch::config::{Config, DatasetConfig};
use prodsearch::dataset::{self, read_csv, PairRecord, RelevanceMap};
use prodsearch::embedding::{EmbeddingError, EmbeddingProvider};
use prodsearch::error::ProdSearchError;
use prodsearch::evaluation::Evaluator;
use prodsearch::indexing::IndexBuilder;
use prodsearch::retrieval::ProductSearcher;
use prodsearch::store::{DocumentStore, MemoryStore, StoreError};

const DIM: usize = 64;

/// Hashes lowercase tokens into a fixed-size count vector
struct HashingEmbedder;

impl HashingEmbedder {
    fn bucket(token: &str) -> usize {
        // FNV-1a
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in token.bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        (hash % DIM as u64) as usize
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vector = vec![0.0; DIM];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            vector[Self::bucket(&token.to_lowercase())] += 1.0;
        }
        Ok(vector)
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize {
        DIM
    }

    fn model_name(&self) -> &str {
        "hashing-test"
    }
}

fn mapping(dims: usize) -> serde_json::Value {
    json!({
        "mappings": {
            "properties": {
                "product_title_embed": {"type": "dense_vector", "dims": dims, "similarity": "cosine"},
                "product_description": {"type": "dense_vector", "dims": dims, "similarity": "cosine"},
                "product_bullets": {"type": "dense_vector", "dims": dims, "similarity": "cosine"},
                "product_title_text": {"type": "text"},
                "product_brand": {"type": "keyword"},
                "product_color": {"type": "keyword"},
                "product_id": {"type": "keyword"}
            }
        }
    })
}

fn write_tables(dir: &Path) {
    std::fs::write(
        dir.join("examples.csv"),
        "example_id,query,query_id,product_id,product_locale,esci_label,split\n\
         1,black hair dye,10,B1,us,E,train\n\
         2,red lipstick,11,B2,us,E,train\n\
         3,herbal shampoo,12,B3,us,E,train\n\
         4,herbal shampoo,12,B2,us,C,train\n\
         5,black hair dye,10,B1,es,E,train\n",
    )
    .unwrap();
    std::fs::write(
        dir.join("products.csv"),
        "product_id,product_title,product_description,product_bullet_point,product_brand,product_color,product_locale\n\
         B1,Clairol Black Hair Dye,<p>Deep <b>black</b> permanent colour</p>,Lasts eight weeks,Clairol,black,us\n\
         B2,Revlon Red Lipstick,Matte finish lipstick,All day wear,Revlon,red,us\n\
         B3,Herbal Shampoo Bottle,Gentle daily shampoo,Sulfate free,Herbal,green,us\n",
    )
    .unwrap();
}

fn dataset_config(dir: &Path) -> DatasetConfig {
    DatasetConfig {
        data_dir: dir.to_path_buf(),
        examples_file: "examples.csv".to_string(),
        products_file: "products.csv".to_string(),
        output_dir_train: dir.join("train"),
        output_dir_test: dir.join("test"),
        relevance_map_path: dir.join("all_pairs.json"),
        max_rows: 3,
        unique_queries: 3,
        ..DatasetConfig::default()
    }
}

#[test]
fn test_pipeline_end_to_end() {
    let temp = TempDir::new().unwrap();
    write_tables(temp.path());
    let config = dataset_config(temp.path());

    // Curate
    let summary = dataset::generate_dataset(&config).unwrap();
    assert_eq!(summary.queries, 3);
    assert_eq!(summary.train_rows, 3);
    assert_eq!(summary.test_rows, 0);
    println!("✓ Dataset curated: {} train rows", summary.train_rows);

    // Index
    let embedder = HashingEmbedder;
    let store = MemoryStore::new();
    let products = dataset::load_train_products(&summary.train_path).unwrap();
    let stats = IndexBuilder::new(&embedder, &store, "products", mapping(DIM))
        .build(&products)
        .unwrap();
    assert_eq!(stats.indexed, 3);
    assert_eq!(store.document_count("products"), Some(3));

    let stored = store.get("products", "B1").unwrap();
    assert_eq!(stored.product_title_text, "Clairol Black Hair Dye");
    assert_eq!(stored.product_title_embed.len(), DIM);
    println!("✓ Indexed {} products", stats.indexed);

    // Search
    let searcher = ProductSearcher::new(&embedder, &store, "products");
    let results = searcher.search("black hair dye").unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].product_id, "B1");
    assert_eq!(results[0].brand, "Clairol");
    assert!(results[0].score > 1.0);
    println!("✓ Search returned {}", results[0].title);

    // Evaluate against the queries that were indexed
    let train: Vec<PairRecord> = read_csv(&summary.train_path).unwrap();
    let truth = RelevanceMap::load(&summary.relevance_path).unwrap();
    let report = Evaluator::new(&searcher).evaluate(&train, &truth).unwrap();

    assert_eq!(report.num_queries, 3);
    assert_eq!(report.hits_at_n[&1], 1.0);
    assert_eq!(report.hits_at_n[&10], 1.0);
    assert_eq!(report.mrr, 1.0);
    println!("✓ Evaluation:\n{}", report);
}

#[test]
fn test_rebuild_replaces_index() {
    let embedder = HashingEmbedder;
    let store = MemoryStore::new();
    let temp = TempDir::new().unwrap();
    write_tables(temp.path());
    let summary = dataset::generate_dataset(&dataset_config(temp.path())).unwrap();
    let products = dataset::load_train_products(&summary.train_path).unwrap();

    let builder = IndexBuilder::new(&embedder, &store, "products", mapping(DIM));
    builder.build(&products).unwrap();
    builder.build(&products[..1]).unwrap();

    assert_eq!(store.document_count("products"), Some(1));
}

#[test]
fn test_brand_filter_excludes_other_brands() {
    let embedder = HashingEmbedder;
    let store = MemoryStore::new();
    let temp = TempDir::new().unwrap();
    write_tables(temp.path());
    let summary = dataset::generate_dataset(&dataset_config(temp.path())).unwrap();
    let products = dataset::load_train_products(&summary.train_path).unwrap();
    IndexBuilder::new(&embedder, &store, "products", mapping(DIM))
        .build(&products)
        .unwrap();

    let searcher = ProductSearcher::new(&embedder, &store, "products");
    // Lexically matches B2's title but asks for another brand
    let results = searcher.search("Clairol red lipstick").unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_mapping_dimension_mismatch() {
    let embedder = HashingEmbedder;
    let store = MemoryStore::new();

    let err = IndexBuilder::new(&embedder, &store, "products", mapping(384))
        .build(&[])
        .unwrap_err();
    assert!(matches!(err, ProdSearchError::InvalidConfigValue { .. }));
    // Nothing was created
    assert!(!store.index_exists("products").unwrap());
}

#[test]
fn test_unreachable_store() {
    let embedder = HashingEmbedder;
    let store = MemoryStore::unreachable();

    let err = IndexBuilder::new(&embedder, &store, "products", mapping(DIM))
        .build(&[])
        .unwrap_err();
    assert!(matches!(
        err,
        ProdSearchError::Store(StoreError::Connection { .. })
    ));

    let searcher = ProductSearcher::new(&embedder, &store, "products");
    assert!(searcher.search("dye").is_err());
}

#[test]
fn test_search_missing_index() {
    let embedder = HashingEmbedder;
    let store = MemoryStore::new();
    let searcher = ProductSearcher::new(&embedder, &store, "missing");

    let err = searcher.search("dye").unwrap_err();
    assert!(matches!(
        err,
        ProdSearchError::Store(StoreError::IndexNotFound { .. })
    ));
}

#[test]
#[ignore] // Requires a running Elasticsearch on the configured url and a model download
fn test_live_elasticsearch() {
    use prodsearch::embedding::create_provider;
    use prodsearch::store::ElasticsearchStore;

    let config = Config::default();
    let embedder = create_provider(&config.embedding).unwrap();
    let store = ElasticsearchStore::from_config(&config.store).unwrap();

    let temp = TempDir::new().unwrap();
    write_tables(temp.path());
    let summary = dataset::generate_dataset(&dataset_config(temp.path())).unwrap();
    let products = dataset::load_train_products(&summary.train_path).unwrap();

    let mapping = prodsearch::indexing::default_mapping().unwrap();
    IndexBuilder::new(embedder.as_ref(), &store, "prodsearch_live_test", mapping)
        .build(&products)
        .unwrap();

    let searcher = ProductSearcher::new(embedder.as_ref(), &store, "prodsearch_live_test");
    let results = searcher.search("black hair dye").unwrap();
    println!("✓ Live search returned {} results", results.len());

    store.delete_index("prodsearch_live_test").unwrap();
}
