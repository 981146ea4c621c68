#![allow(clippy::doc_markdown)]

//! sift-tokenizer - token counting and truncation for context budgeting
//!
//! Uses the tiktoken-rs cl100k_base encoding. The BPE tables are built lazily
//! and cached for the lifetime of the process. When the encoding
//! cannot be initialised the functions fall back to a whitespace heuristic
//! instead of panicking, so budget checks keep working (less precisely).
//!
//! # Example
//!
//! ```rust,ignore
//! use sift_tokenizer::{count_tokens, truncate};
//!
//! let text = "Hello, world!";
//! let count = count_tokens(text);
//! let truncated = truncate(text, 5);
//! ```

use std::sync::OnceLock;

use thiserror::Error;
use tiktoken_rs::CoreBPE;

/// Errors for tokenization operations.
#[derive(Error, Debug)]
pub enum TokenizerError {
    /// Failed to initialize the tokenization model
    #[error("tokenization model initialization failed: {0}")]
    ModelInit(String),
    /// Failed to decode tokens back to text
    #[error("token decoding failed: {0}")]
    Decoding(String),
}

/// Encoding id used for every count in this crate.
pub const ENCODING: &str = "cl100k_base";

fn build_bpe() -> Result<CoreBPE, TokenizerError> {
    tiktoken_rs::cl100k_base().map_err(|e| TokenizerError::ModelInit(format!("{ENCODING}: {e}")))
}

/// Cached BPE instance; `None` when the encoding failed to initialise.
fn bpe() -> Option<&'static CoreBPE> {
    static CL100K_BASE: OnceLock<Option<CoreBPE>> = OnceLock::new();
    CL100K_BASE.get_or_init(|| build_bpe().ok()).as_ref()
}

/// Count tokens in text using cl100k_base, falling back to the heuristic estimate.
#[must_use]
pub fn count_tokens(text: &str) -> usize {
    match bpe() {
        Some(bpe) => bpe.encode_with_special_tokens(text).len(),
        None => estimate_token_count(text),
    }
}

/// Count tokens, surfacing model initialisation failures instead of estimating.
///
/// # Errors
///
/// Returns [`TokenizerError::ModelInit`] when the BPE tables cannot be built.
pub fn try_count_tokens(text: &str) -> Result<usize, TokenizerError> {
    match bpe() {
        Some(bpe) => Ok(bpe.encode_with_special_tokens(text).len()),
        None => Err(build_bpe()
            .err()
            .unwrap_or_else(|| TokenizerError::ModelInit(ENCODING.to_string()))),
    }
}

/// Truncate text to fit within `max_tokens` (cl100k_base).
#[must_use]
pub fn truncate(text: &str, max_tokens: usize) -> String {
    let Some(bpe) = bpe() else {
        return estimate_truncate(text, max_tokens);
    };

    let tokens = bpe.encode_with_special_tokens(text);
    if tokens.len() <= max_tokens {
        return text.to_string();
    }

    let truncated: Vec<_> = tokens.into_iter().take(max_tokens).collect();
    bpe.decode(truncated)
        .unwrap_or_else(|_| estimate_truncate(text, max_tokens))
}

/// Rough approximation used when no BPE table is available: two tokens per word.
#[must_use]
pub fn estimate_token_count(text: &str) -> usize {
    text.split_whitespace().count().saturating_mul(2)
}

fn estimate_truncate(text: &str, max_tokens: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let target_words = std::cmp::min(max_tokens / 2, words.len());
    words[..target_words].join(" ")
}
