//! `search_knowledge_base`: the hybrid retriever exposed as a tool.

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Value, json};
use sift_retrieval::{
    HybridRetriever, RequestDeadline, RetrievalRequest, RetrievalResult, RetrievalTier,
};

use crate::observability::SessionEvent;

use super::error::ToolError;
use super::{Tool, ToolOutput};

/// Registered name of the retrieval tool.
pub const KNOWLEDGE_BASE_TOOL: &str = "search_knowledge_base";

/// Upper bound on `top_k` accepted from the thinker.
const MAX_TOP_K: usize = 50;

/// Arguments of `search_knowledge_base`.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SearchKnowledgeBaseArgs {
    /// What to look up.
    #[schemars(length(min = 1))]
    pub query: String,
    /// Restrict results to one domain (e.g. "erp", "hr").
    #[serde(default)]
    pub domain: Option<String>,
    /// Number of passages to return.
    #[serde(default)]
    #[schemars(range(min = 1, max = 50))]
    pub top_k: Option<usize>,
}

/// Retrieval tool backed by a shared [`HybridRetriever`].
#[derive(Clone)]
pub struct KnowledgeBaseTool {
    retriever: Arc<HybridRetriever>,
}

impl KnowledgeBaseTool {
    /// Catalog description.
    pub const DESCRIPTION: &'static str = "Search the document knowledge base with hybrid \
         (semantic + keyword) retrieval. Returns ranked passages with their source.";

    /// Wrap a retriever.
    #[must_use]
    pub fn new(retriever: Arc<HybridRetriever>) -> Self {
        Self { retriever }
    }

    /// JSON Schema derived from [`SearchKnowledgeBaseArgs`].
    #[must_use]
    pub fn schema() -> Value {
        serde_json::to_value(schemars::schema_for!(SearchKnowledgeBaseArgs))
            .unwrap_or_else(|_| json!({ "type": "object" }))
    }
}

#[async_trait]
impl Tool for KnowledgeBaseTool {
    async fn invoke(&self, args: Value, deadline: RequestDeadline) -> Result<ToolOutput, ToolError> {
        let args: SearchKnowledgeBaseArgs =
            serde_json::from_value(args).map_err(|error| ToolError::InvalidArgs {
                tool: KNOWLEDGE_BASE_TOOL.to_string(),
                reason: error.to_string(),
            })?;
        let top_k = args
            .top_k
            .unwrap_or(self.retriever.config().top_k)
            .clamp(1, MAX_TOP_K);
        tracing::debug!(
            event = SessionEvent::RetrievalToolInvoked.as_str(),
            query = %args.query,
            domain = ?args.domain,
            top_k,
            "knowledge base search"
        );
        let request = RetrievalRequest::new(args.query)
            .domain(args.domain)
            .top_k(top_k)
            .deadline(deadline);
        let result = self.retriever.execute(request).await;
        if result.is_degraded() {
            tracing::info!(
                event = SessionEvent::RetrievalToolDegraded.as_str(),
                tier = result.tier_used.as_str(),
                cause = result.degradation.map(|cause| cause.as_str()),
                filter_relaxed = result.filter_relaxed,
                "knowledge base answered below full quality"
            );
        }
        Ok(ToolOutput {
            degraded: result.is_degraded(),
            tier: Some(result.tier_used),
            content: render_result(&result),
        })
    }
}

/// Observation payload for one retrieval result.
pub(crate) fn render_result(result: &RetrievalResult) -> Value {
    let passages: Vec<Value> = result
        .candidates
        .iter()
        .map(|candidate| {
            json!({
                "doc_id": candidate.doc_id,
                "chunk_id": candidate.chunk_id,
                "source": candidate.source,
                "domain": candidate.domain,
                "score": candidate.score_for(result.tier_used),
                "text": candidate.text,
            })
        })
        .collect();
    let mut payload = json!({
        "tier": result.tier_used.as_str(),
        "passages": passages,
    });
    if result.tier_used == RetrievalTier::Failed {
        payload["status"] = json!("no_information_available");
    }
    if let Some(cause) = result.degradation {
        payload["degradation"] = json!(cause.as_str());
    }
    if result.filter_relaxed {
        payload["filter_relaxed"] = json!(true);
    }
    payload
}
