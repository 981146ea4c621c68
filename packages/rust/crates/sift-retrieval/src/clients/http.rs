use std::time::{Duration, Instant};

use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;

pub(super) fn build_client(timeout: Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}

pub(super) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// POST `body` as JSON and decode the response. Errors are rendered to text;
/// callers wrap them in the right [`crate::RetrievalError`] variant.
pub(super) async fn post_json<B, R>(
    client: &Client,
    url: &str,
    body: &B,
    event_prefix: &'static str,
) -> Result<R, String>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let started = Instant::now();
    let response = match client.post(url).json(body).send().await {
        Ok(response) => response,
        Err(error) => {
            tracing::debug!(
                event = event_prefix,
                stage = "request_failed",
                url,
                elapsed_ms = started.elapsed().as_millis(),
                error = %error,
                "http request failed"
            );
            return Err(format!("request to {url} failed: {error}"));
        }
    };
    let status = response.status();
    if !status.is_success() {
        tracing::debug!(
            event = event_prefix,
            stage = "non_success_status",
            url,
            status = %status,
            elapsed_ms = started.elapsed().as_millis(),
            "http endpoint returned non-success status"
        );
        return Err(format!("{url} returned {status}"));
    }
    match response.json::<R>().await {
        Ok(decoded) => {
            tracing::debug!(
                event = event_prefix,
                stage = "completed",
                url,
                elapsed_ms = started.elapsed().as_millis(),
                "http call completed"
            );
            Ok(decoded)
        }
        Err(error) => {
            tracing::debug!(
                event = event_prefix,
                stage = "decode_failed",
                url,
                error = %error,
                "http response decode failed"
            );
            Err(format!("malformed response from {url}: {error}"))
        }
    }
}
