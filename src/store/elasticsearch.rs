//! Elasticsearch REST client over blocking HTTP

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use super::{DocumentStore, HitSource, ProductDocument, StoreError, StoreHit};
use crate::config::StoreConfig;
use crate::error::{ProdSearchError, Result};
use crate::retrieval::HybridQuery;

#[derive(Debug, Clone)]
enum Auth {
    None,
    Basic { username: String, password: String },
    ApiKey(String),
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: HitsEnvelope,
}

#[derive(Debug, Deserialize)]
struct HitsEnvelope {
    hits: Vec<RawHit>,
}

#[derive(Debug, Deserialize)]
struct RawHit {
    #[serde(rename = "_score")]
    score: Option<f32>,
    #[serde(rename = "_source", default)]
    source: HitSource,
}

/// Document store backed by an Elasticsearch cluster
///
/// Every call is a single blocking round trip; nothing is retried.
pub struct ElasticsearchStore {
    client: Client,
    base_url: Url,
    auth: Auth,
}

impl ElasticsearchStore {
    /// Connect using the `[store]` configuration section
    pub fn from_config(config: &StoreConfig) -> Result<Self> {
        let base_url = Url::parse(&config.url).map_err(|e| ProdSearchError::InvalidConfigValue {
            path: "store.url".to_string(),
            message: format!("{}: {}", config.url, e),
        })?;

        let auth = match (&config.username, &config.api_key_env) {
            (Some(username), _) => Auth::Basic {
                username: username.clone(),
                password: config.password.clone().unwrap_or_default(),
            },
            (None, Some(env_var)) => {
                let key = std::env::var(env_var).map_err(|_| {
                    ProdSearchError::Config(format!("Environment variable {} is not set", env_var))
                })?;
                Auth::ApiKey(key)
            }
            (None, None) => Auth::None,
        };

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProdSearchError::Config(format!("Failed to build HTTP client: {}", e)))?;

        tracing::debug!("Document store endpoint: {}", base_url);

        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    fn url(&self, segments: &[&str]) -> std::result::Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidResponse(format!("Invalid base url {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.auth {
            Auth::None => builder,
            Auth::Basic { username, password } => builder.basic_auth(username, Some(password)),
            Auth::ApiKey(key) => builder.header("Authorization", format!("ApiKey {}", key)),
        }
    }

    fn send(&self, builder: RequestBuilder) -> std::result::Result<Response, StoreError> {
        builder.send().map_err(|e| StoreError::Connection {
            url: self.base_url.to_string(),
            message: e.to_string(),
        })
    }

    fn check(operation: &str, response: Response) -> std::result::Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().unwrap_or_default();
        Err(StoreError::Request {
            operation: operation.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

impl DocumentStore for ElasticsearchStore {
    fn index_exists(&self, index: &str) -> std::result::Result<bool, StoreError> {
        let response = self.send(self.request(Method::HEAD, self.url(&[index])?))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            _ => Self::check("index exists", response).map(|_| true),
        }
    }

    fn delete_index(&self, index: &str) -> std::result::Result<(), StoreError> {
        let response = self.send(self.request(Method::DELETE, self.url(&[index])?))?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(());
        }
        Self::check("delete index", response)?;
        Ok(())
    }

    fn create_index(
        &self,
        index: &str,
        mapping: &serde_json::Value,
    ) -> std::result::Result<(), StoreError> {
        let builder = self.request(Method::PUT, self.url(&[index])?).json(mapping);
        Self::check("create index", self.send(builder)?)?;
        Ok(())
    }

    fn index_document(
        &self,
        index: &str,
        id: &str,
        document: &ProductDocument,
    ) -> std::result::Result<(), StoreError> {
        let builder = self
            .request(Method::PUT, self.url(&[index, "_doc", id])?)
            .json(document);
        Self::check("index document", self.send(builder)?)?;
        Ok(())
    }

    fn search(
        &self,
        index: &str,
        query: &HybridQuery,
    ) -> std::result::Result<Vec<StoreHit>, StoreError> {
        let builder = self
            .request(Method::POST, self.url(&[index, "_search"])?)
            .json(&query.to_request_body());
        let response = self.send(builder)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::IndexNotFound {
                index: index.to_string(),
            });
        }

        let parsed: SearchResponse = Self::check("search", response)?
            .json()
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        Ok(parsed
            .hits
            .hits
            .into_iter()
            .map(|hit| StoreHit {
                score: hit.score.unwrap_or(0.0),
                source: hit.source,
            })
            .collect())
    }
}
