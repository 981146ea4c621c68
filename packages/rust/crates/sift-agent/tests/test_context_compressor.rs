#![allow(missing_docs)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sift_agent::{
    CompressionStatus, ContextCompressor, Message, Summarizer, SummarizerError, total_tokens,
};

#[derive(Default)]
struct RecordingSummarizer {
    calls: AtomicUsize,
    seen: Mutex<Vec<(Option<String>, usize)>>,
}

#[async_trait]
impl Summarizer for RecordingSummarizer {
    async fn summarize(
        &self,
        previous_summary: Option<&str>,
        messages: &[Message],
    ) -> Result<String, SummarizerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .expect("seen lock")
            .push((previous_summary.map(str::to_string), messages.len()));
        Ok(format!("summary of {} messages", messages.len()))
    }
}

struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn summarize(
        &self,
        _previous_summary: Option<&str>,
        _messages: &[Message],
    ) -> Result<String, SummarizerError> {
        Err(SummarizerError::Unavailable("503 from model".to_string()))
    }
}

struct SlowSummarizer;

#[async_trait]
impl Summarizer for SlowSummarizer {
    async fn summarize(
        &self,
        _previous_summary: Option<&str>,
        _messages: &[Message],
    ) -> Result<String, SummarizerError> {
        tokio::time::sleep(Duration::from_millis(300)).await;
        Ok("late".to_string())
    }
}

fn history(turns: usize) -> Vec<Message> {
    (0..turns)
        .map(|i| {
            let text = format!(
                "turn {i}: the quarterly revenue report for region {i} lists several line items \
                 including travel, equipment and contractor spending"
            );
            if i % 2 == 0 {
                Message::user(text)
            } else {
                Message::assistant(text, None)
            }
        })
        .collect()
}

#[tokio::test]
async fn history_within_budget_is_unchanged() {
    let summarizer = Arc::new(RecordingSummarizer::default());
    let compressor = ContextCompressor::new(summarizer.clone());
    let messages = history(8);
    let budget = total_tokens(&messages);

    let compression = compressor.compress(&messages, budget, 3).await;

    assert_eq!(compression.status, CompressionStatus::Unchanged);
    assert_eq!(compression.messages, messages);
    assert_eq!(compression.replaced_prefix, 0);
    assert!(compression.summary().is_none());
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn over_budget_prefix_is_summarized_and_recent_kept() {
    let summarizer = Arc::new(RecordingSummarizer::default());
    let compressor = ContextCompressor::new(summarizer.clone());
    let messages = history(10);
    let before = total_tokens(&messages);

    let compression = compressor.compress(&messages, before / 2, 3).await;

    assert!(compression.is_compressed());
    assert_eq!(compression.replaced_prefix, 7);
    assert_eq!(compression.messages.len(), 4);
    assert!(compression.messages[0].is_summary());
    assert_eq!(compression.messages[0].content, "summary of 7 messages");
    assert_eq!(&compression.messages[1..], &messages[7..]);
    match compression.status {
        CompressionStatus::Compressed {
            replaced,
            tokens_before,
            tokens_after,
        } => {
            assert_eq!(replaced, 7);
            assert_eq!(tokens_before, before);
            assert_eq!(tokens_after, total_tokens(&compression.messages));
            assert!(tokens_after < tokens_before);
        }
        other => panic!("expected compression, got {other:?}"),
    }
}

#[tokio::test]
async fn compression_is_idempotent_when_result_fits() {
    let summarizer = Arc::new(RecordingSummarizer::default());
    let compressor = ContextCompressor::new(summarizer.clone());
    let messages = history(10);
    let budget = total_tokens(&messages) - 1;

    let once = compressor.compress(&messages, budget, 4).await;
    let twice = compressor.compress(&once.messages, budget, 4).await;

    assert!(once.is_compressed());
    assert_eq!(twice.status, CompressionStatus::Unchanged);
    assert_eq!(twice.messages, once.messages);
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn compression_is_idempotent_when_still_over_budget() {
    let summarizer = Arc::new(RecordingSummarizer::default());
    let compressor = ContextCompressor::new(summarizer.clone());
    let messages = history(10);

    let once = compressor.compress(&messages, 10, 4).await;
    let twice = compressor.compress(&once.messages, 10, 4).await;

    assert!(once.is_compressed());
    assert!(once.over_budget(10));
    assert!(matches!(twice.status, CompressionStatus::OverBudget { .. }));
    assert_eq!(twice.messages, once.messages);
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn too_few_messages_reports_over_budget() {
    let summarizer = Arc::new(RecordingSummarizer::default());
    let compressor = ContextCompressor::new(summarizer.clone());
    let messages = history(3);
    let tokens = total_tokens(&messages);

    let compression = compressor.compress(&messages, 1, 6).await;

    assert_eq!(
        compression.status,
        CompressionStatus::OverBudget { tokens, budget: 1 }
    );
    assert_eq!(compression.messages, messages);
    assert_eq!(summarizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn previous_summary_is_folded_not_stacked() {
    let summarizer = Arc::new(RecordingSummarizer::default());
    let compressor = ContextCompressor::new(summarizer.clone());
    let mut messages = vec![Message::summary("earlier discussion about budgets")];
    messages.extend(history(8));

    let compression = compressor.compress(&messages, 1, 3).await;

    assert_eq!(compression.replaced_prefix, 6);
    assert_eq!(compression.messages.len(), 4);
    assert_eq!(
        compression
            .messages
            .iter()
            .filter(|message| message.is_summary())
            .count(),
        1
    );
    let seen = summarizer.seen.lock().expect("seen lock").clone();
    assert_eq!(
        seen,
        vec![(Some("earlier discussion about budgets".to_string()), 5)]
    );
}

#[tokio::test]
async fn summarizer_failure_keeps_history() {
    let compressor = ContextCompressor::new(Arc::new(FailingSummarizer));
    let messages = history(10);

    let compression = compressor.compress(&messages, 1, 3).await;

    assert!(matches!(
        compression.status,
        CompressionStatus::Failed { ref reason } if reason.contains("503")
    ));
    assert_eq!(compression.messages, messages);
    assert_eq!(compression.replaced_prefix, 0);
}

#[tokio::test]
async fn slow_summarizer_times_out() {
    let compressor =
        ContextCompressor::new(Arc::new(SlowSummarizer)).with_timeout(Duration::from_millis(20));
    let messages = history(10);

    let compression = compressor.compress(&messages, 1, 3).await;

    assert!(matches!(compression.status, CompressionStatus::Failed { .. }));
    assert_eq!(compression.messages, messages);
}
