//! Wire HTTP collaborators and the session store from a [`CoreConfig`].

use std::sync::Arc;

use anyhow::{Context, Result};
use sift_retrieval::{HttpEmbedder, HttpReranker, HttpSearchIndex, HybridRetriever, Reranker};

use crate::compression::LlmSummarizer;
use crate::config::{CoreConfig, SessionBackend, SessionBackendConfig};
use crate::engine::Engine;
use crate::llm::LlmClient;
use crate::reasoning::LlmThinker;
use crate::session::{FileSessionStore, MemorySessionStore, SessionError, SessionStore};
use crate::tools::{KnowledgeBaseTool, ToolRegistry};

impl Engine {
    /// Build an engine whose collaborators all come from `config`.
    ///
    /// The knowledge-base tool is registered only when both the embedding and
    /// search services are configured; without a rerank service retrieval
    /// completes at HYBRID.
    ///
    /// # Errors
    ///
    /// Fails when the session store cannot be opened or tool registration fails.
    pub async fn from_config(config: CoreConfig) -> Result<Self> {
        let llm = LlmClient::new(config.llm.clone());
        let mut tools = ToolRegistry::new(config.reasoning.tool_timeout());
        match build_retriever(&config) {
            Some(retriever) => tools
                .register_knowledge_base(KnowledgeBaseTool::new(Arc::new(retriever)))
                .context("failed to register the knowledge base tool")?,
            None => tracing::warn!(
                embedding_url = ?config.services.embedding_url,
                search_url = ?config.services.search_url,
                "retrieval services not configured; knowledge base tool disabled"
            ),
        }
        let store = open_session_store(&config.session)
            .await
            .context("failed to open session store")?;
        Ok(Self::new(
            store,
            Arc::new(LlmThinker::new(llm.clone())),
            Arc::new(tools),
            Arc::new(LlmSummarizer::new(llm)),
            config,
        ))
    }
}

/// Open the configured session backend.
///
/// # Errors
///
/// [`SessionError::Unavailable`] when the JSONL directory cannot be created.
pub async fn open_session_store(
    config: &SessionBackendConfig,
) -> Result<Arc<dyn SessionStore>, SessionError> {
    Ok(match config.backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Jsonl => Arc::new(FileSessionStore::open(config.dir.clone()).await?),
    })
}

fn build_retriever(config: &CoreConfig) -> Option<HybridRetriever> {
    let services = &config.services;
    let embedding_url = services.embedding_url.as_deref()?;
    let search_url = services.search_url.as_deref()?;
    let retrieval = &config.retrieval;

    let embedder = HttpEmbedder::new(embedding_url, retrieval.dense_timeout())
        .with_model(services.embedding_model.clone());
    let index = Arc::new(HttpSearchIndex::new(
        search_url,
        retrieval.dense_timeout().max(retrieval.sparse_timeout()),
    ));
    let reranker = services.rerank_url.as_deref().map(|url| {
        Arc::new(HttpReranker::new(
            url,
            retrieval.rerank_timeout(),
            config.rerank_max_retries,
        )) as Arc<dyn Reranker>
    });
    Some(HybridRetriever::new(
        Arc::new(embedder),
        index.clone(),
        index,
        reranker,
        *retrieval,
    ))
}
