//! Context-window compression: fold older turns into one summary message.

mod compressor;
mod summarizer;

pub use compressor::{
    Compression, CompressionConfig, CompressionStatus, ContextCompressor, DEFAULT_KEEP_RECENT,
    DEFAULT_SUMMARIZER_TIMEOUT_MS, DEFAULT_TOKEN_BUDGET,
};
pub use summarizer::{LlmSummarizer, Summarizer, SummarizerError};
