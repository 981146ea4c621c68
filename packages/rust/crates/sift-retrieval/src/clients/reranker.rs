//! Cross-encoder reranker over HTTP `/rerank`, with bounded retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::http::{build_client, normalize_base_url, post_json};
use crate::error::RetrievalError;
use crate::observability::RetrievalEvent;
use crate::traits::Reranker;

#[derive(Serialize)]
struct RerankRequest<'a> {
    query: &'a str,
    passages: &'a [String],
}

#[derive(Deserialize)]
struct RerankResponse {
    scores: Vec<f32>,
}

/// Reranker service client.
///
/// Transport failures are retried up to `max_retries` times; a well-formed
/// response is never retried, so short responses surface to the ladder.
#[derive(Debug, Clone)]
pub struct HttpReranker {
    client: Client,
    base_url: String,
    max_retries: u32,
}

impl HttpReranker {
    /// Client for `base_url` with a per-attempt `timeout`.
    #[must_use]
    pub fn new(base_url: &str, timeout: Duration, max_retries: u32) -> Self {
        Self {
            client: build_client(timeout),
            base_url: normalize_base_url(base_url),
            max_retries,
        }
    }
}

#[async_trait]
impl Reranker for HttpReranker {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>, RetrievalError> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }
        let url = format!("{}/rerank", self.base_url);
        let body = RerankRequest { query, passages };
        let mut attempt = 0;
        loop {
            match post_json::<_, RerankResponse>(&self.client, &url, &body, "retrieval.rerank.http")
                .await
            {
                Ok(response) => return Ok(response.scores),
                Err(error) if attempt < self.max_retries => {
                    attempt += 1;
                    tracing::debug!(
                        event = RetrievalEvent::RerankRetry.as_str(),
                        attempt,
                        max_retries = self.max_retries,
                        error = %error,
                        "retrying rerank request"
                    );
                }
                Err(error) => return Err(RetrievalError::RerankFailed(error)),
            }
        }
    }
}
