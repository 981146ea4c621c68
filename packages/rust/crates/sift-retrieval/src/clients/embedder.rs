//! Query embedder over HTTP `/embed/batch`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, normalize_base_url, post_json};
use crate::error::RetrievalError;
use crate::traits::QueryEmbedder;

#[derive(Serialize)]
struct EmbedBatchRequest<'a> {
    texts: [&'a str; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
}

#[derive(Deserialize)]
struct EmbedBatchResponse {
    vectors: Option<Vec<Vec<f32>>>,
}

/// Embedding service client.
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    model: Option<String>,
}

impl HttpEmbedder {
    /// Client for `base_url` (e.g. `http://127.0.0.1:3302`).
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self {
            client: build_client(timeout),
            base_url: normalize_base_url(base_url),
            model: None,
        }
    }

    /// Request a specific embedding model.
    #[must_use]
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }
}

#[async_trait]
impl QueryEmbedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let url = format!("{}/embed/batch", self.base_url);
        let body = EmbedBatchRequest {
            texts: [text],
            model: self.model.as_deref(),
        };
        let response: EmbedBatchResponse =
            post_json(&self.client, &url, &body, "retrieval.embedding.http")
                .await
                .map_err(RetrievalError::EmbeddingUnavailable)?;
        response
            .vectors
            .and_then(|vectors| vectors.into_iter().next())
            .filter(|vector| !vector.is_empty())
            .ok_or_else(|| {
                RetrievalError::EmbeddingUnavailable("embedding response had no vector".to_string())
            })
    }
}
