use anyhow::Result;

use sift_agent::{CompressionStatus, CoreConfig, Engine, SessionStore as _, total_tokens};

pub(crate) struct CompressRequest {
    pub(crate) session_id: String,
    pub(crate) budget: Option<usize>,
    pub(crate) keep_recent: Option<usize>,
    pub(crate) apply: bool,
}

pub(crate) async fn run_compress_mode(request: CompressRequest, mut config: CoreConfig) -> Result<()> {
    if let Some(budget) = request.budget {
        config.context.token_budget = budget;
    }
    if let Some(keep_recent) = request.keep_recent {
        config.context.keep_recent = keep_recent;
    }
    config.validate()?;
    let budget = config.context.token_budget;
    let keep_recent = config.context.keep_recent;
    let engine = Engine::from_config(config).await?;

    let compression = if request.apply {
        engine.compress_stored(&request.session_id).await?
    } else {
        let session = engine.store().get(&request.session_id).await?;
        engine
            .compressor()
            .compress(&session.messages, budget, keep_recent)
            .await
    };

    match &compression.status {
        CompressionStatus::Unchanged => println!("unchanged: history within {budget} tokens"),
        CompressionStatus::OverBudget { tokens, budget } => {
            println!("over budget: {tokens} tokens > {budget}, nothing left to summarize");
        }
        CompressionStatus::Failed { reason } => println!("failed: {reason}"),
        CompressionStatus::Compressed {
            replaced,
            tokens_before,
            tokens_after,
        } => {
            println!(
                "compressed: {replaced} messages -> 1 summary, {tokens_before} -> {tokens_after} tokens{}",
                if request.apply { " (saved)" } else { " (dry run)" }
            );
            if let Some(summary) = compression.summary() {
                println!("\n{}", summary.content);
            }
        }
    }
    println!(
        "messages: {} ({} tokens)",
        compression.messages.len(),
        total_tokens(&compression.messages)
    );
    Ok(())
}
