//! Pinecone index client.
//!
//! Only the data-plane `/query` endpoint is used. Indexes are created and
//! populated by the ingestion pipeline.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use newsrank_core::error::{ErrorCode, NewsrankError, NewsrankResult};
use newsrank_core::traits::{DenseIndex, IndexMatch, SparseIndex, VectorIndexConfig};
use newsrank_core::types::SparseVector;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Pinecone index usable as a dense or a sparse index.
pub struct PineconeIndex {
    client: Client,
    query_url: String,
    namespace: Option<String>,
    index_name: String,
}

#[derive(Debug, Deserialize)]
struct PineconeMatch {
    id: String,
    #[serde(default)]
    score: f32,
}

#[derive(Debug, Deserialize)]
struct PineconeQueryResponse {
    #[serde(default)]
    matches: Vec<PineconeMatch>,
}

impl PineconeIndex {
    /// Create a client for the index at `config.host`.
    ///
    /// The API key comes from the config, falling back to `PINECONE_API_KEY`.
    pub fn new(config: &VectorIndexConfig) -> NewsrankResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var("PINECONE_API_KEY").ok())
            .ok_or_else(|| {
                NewsrankError::Configuration(
                    "Pinecone API key required. Set PINECONE_API_KEY or provide api_key."
                        .to_string(),
                )
            })?;

        let host = config.host.clone().ok_or_else(|| {
            NewsrankError::Configuration(format!(
                "Pinecone host required for index '{}'",
                config.index_name
            ))
        })?;
        let base = url::Url::parse(&host)
            .map_err(|e| NewsrankError::Configuration(format!("Invalid Pinecone host: {}", e)))?;
        let query_url = base
            .join("query")
            .map_err(|e| NewsrankError::Configuration(format!("Invalid Pinecone host: {}", e)))?
            .to_string();

        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&api_key).map_err(|_| {
            NewsrankError::Configuration("Pinecone API key contains invalid characters".to_string())
        })?;
        headers.insert("Api-Key", key);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NewsrankError::Configuration(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            query_url,
            namespace: config.namespace.clone(),
            index_name: config.index_name.clone(),
        })
    }

    /// Endpoint queries are sent to.
    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    fn dense_body(&self, vector: &[f32], top_k: usize) -> Value {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": false,
        });
        self.apply_namespace(&mut body);
        body
    }

    fn sparse_body(&self, vector: &SparseVector, top_k: usize) -> Value {
        let mut body = json!({
            "sparseVector": {
                "indices": vector.term_indices(),
                "values": vector.weights(),
            },
            "topK": top_k,
            "includeMetadata": false,
        });
        self.apply_namespace(&mut body);
        body
    }

    fn apply_namespace(&self, body: &mut Value) {
        if let Some(namespace) = &self.namespace {
            body["namespace"] = json!(namespace);
        }
    }

    async fn send_query(&self, body: Value) -> NewsrankResult<Vec<IndexMatch>> {
        let response = self
            .client
            .post(&self.query_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| NewsrankError::VectorIndex {
                message: format!("Failed to query {}: {}", self.index_name, e),
                code: ErrorCode::IdxConnectionFailed,
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(NewsrankError::vector_index(format!(
                "Query on {} failed with {}: {}",
                self.index_name, status, error
            )));
        }

        let text = response.text().await.map_err(|e| {
            NewsrankError::invalid_index_response(format!("Failed to read response: {}", e))
        })?;
        let matches = parse_matches(&text)?;
        tracing::debug!(index = %self.index_name, matches = matches.len(), "Pinecone query");
        Ok(matches)
    }
}

fn parse_matches(body: &str) -> NewsrankResult<Vec<IndexMatch>> {
    let parsed: PineconeQueryResponse = serde_json::from_str(body).map_err(|e| {
        NewsrankError::invalid_index_response(format!("Failed to parse response: {}", e))
    })?;
    Ok(parsed
        .matches
        .into_iter()
        .map(|m| IndexMatch::new(m.id, m.score))
        .collect())
}

#[async_trait]
impl DenseIndex for PineconeIndex {
    async fn query(&self, vector: &[f32], top_k: usize) -> NewsrankResult<Vec<IndexMatch>> {
        self.send_query(self.dense_body(vector, top_k)).await
    }
}

#[async_trait]
impl SparseIndex for PineconeIndex {
    async fn query(&self, vector: &SparseVector, top_k: usize) -> NewsrankResult<Vec<IndexMatch>> {
        self.send_query(self.sparse_body(vector, top_k)).await
    }
}
