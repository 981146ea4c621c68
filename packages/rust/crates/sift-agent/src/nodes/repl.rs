use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};

use sift_agent::{
    CoreConfig, Engine, SessionStatus, SessionStore as _, StepType, TurnOutcome, TurnStatus,
};

pub(crate) async fn run_repl_mode(
    query: Option<String>,
    session_id: Option<String>,
    show_trace: bool,
    config: CoreConfig,
) -> Result<()> {
    let engine = Engine::from_config(config).await?;
    if let Some(q) = query {
        let outcome = engine.run_turn(session_id.as_deref(), q.trim()).await?;
        print_outcome(&outcome, show_trace);
        return Ok(());
    }

    let mut session_id = session_id;
    let mut reader = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = reader.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "/quit" | "/exit") {
            break;
        }
        let outcome = engine.run_turn(session_id.as_deref(), line).await?;
        print_outcome(&outcome, show_trace);
        session_id = Some(outcome.session_id);
    }
    if let Some(id) = session_id {
        engine
            .store()
            .set_status(&id, SessionStatus::Completed)
            .await?;
        eprintln!("session {id} closed");
    }
    Ok(())
}

fn print_outcome(outcome: &TurnOutcome, show_trace: bool) {
    println!("{}", outcome.answer);
    if show_trace {
        for step in outcome.trace.steps() {
            let label = match step.step_type {
                StepType::Think => "THINK",
                StepType::Act => "ACT",
                StepType::Observe => "OBSERVE",
                StepType::Answer => "ANSWER",
            };
            let tool = step.tool_name.as_deref().unwrap_or("");
            eprintln!("  [{label}] {tool} {}", sift_tokenizer::truncate(&step.content, 64));
        }
    }
    let tiers: Vec<&str> = outcome.tiers.iter().map(|tier| tier.as_str()).collect();
    let mut flags = vec![format!("status={}", outcome.status.as_str())];
    if !tiers.is_empty() {
        flags.push(format!("tiers={}", tiers.join(",")));
    }
    if outcome.degraded {
        flags.push("degraded".to_string());
    }
    if outcome.status == TurnStatus::Aborted
        && let Some(reason) = outcome.aborted
    {
        flags.push(format!("aborted={}", reason.as_str()));
    }
    eprintln!("[session {}] {}", outcome.session_id, flags.join(" "));
}
