//! HTTP collaborators: embedding service, reranker service and remote indexes.
//!
//! All three speak small JSON endpoints and map transport failures to
//! [`crate::RetrievalError`] so the retriever can classify them.

mod embedder;
mod http;
mod reranker;
mod search_index;

pub use embedder::HttpEmbedder;
pub use reranker::HttpReranker;
pub use search_index::HttpSearchIndex;
