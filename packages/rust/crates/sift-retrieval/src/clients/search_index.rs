//! Remote index over HTTP `/search`, usable as both the dense and sparse index.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, normalize_base_url, post_json};
use crate::error::RetrievalError;
use crate::traits::{SparseIndex, VectorIndex};
use crate::types::IndexHit;

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum SearchMode {
    Dense,
    Sparse,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    mode: SearchMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    vector: Option<&'a [f32]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
    limit: usize,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    hits: Vec<IndexHit>,
}

/// Search service client.
#[derive(Debug, Clone)]
pub struct HttpSearchIndex {
    client: Client,
    base_url: String,
}

impl HttpSearchIndex {
    /// Client for `base_url` with a per-request `timeout`.
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: normalize_base_url(base_url),
        }
    }

    async fn post_search(&self, request: SearchRequest<'_>) -> Result<Vec<IndexHit>, String> {
        let url = format!("{}/search", self.base_url);
        let response: SearchResponse =
            post_json(&self.client, &url, &request, "retrieval.index.http").await?;
        Ok(response.hits)
    }
}

#[async_trait]
impl VectorIndex for HttpSearchIndex {
    async fn search(
        &self,
        vector: &[f32],
        domain_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<IndexHit>, RetrievalError> {
        let request = SearchRequest {
            mode: SearchMode::Dense,
            vector: Some(vector),
            text: None,
            domain: domain_filter,
            limit,
        };
        self.post_search(request)
            .await
            .map_err(RetrievalError::DenseSearchFailed)
    }
}

#[async_trait]
impl SparseIndex for HttpSearchIndex {
    async fn search(
        &self,
        text: &str,
        domain_filter: Option<&str>,
        limit: usize,
    ) -> Result<Vec<IndexHit>, RetrievalError> {
        let request = SearchRequest {
            mode: SearchMode::Sparse,
            vector: None,
            text: Some(text),
            domain: domain_filter,
            limit,
        };
        self.post_search(request)
            .await
            .map_err(RetrievalError::SparseSearchFailed)
    }
}
