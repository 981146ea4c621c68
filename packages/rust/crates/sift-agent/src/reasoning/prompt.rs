//! Thinker prompt assembly: routing hints, tool catalog, history, trace.

use std::fmt::Write as _;

use crate::llm::ChatMessage;
use crate::session::{ReasoningTrace, Role, StepType};

use super::thinker::ThinkContext;

/// Observation text kept per OBSERVE step when replaying the trace.
const OBSERVATION_TOKEN_LIMIT: usize = 768;

/// Appended after a protocol error.
pub const CORRECTIVE_HINT: &str = "Your previous reply was not a valid decision object. \
Reply with exactly one JSON object and nothing else.";

const ROUTING_HINTS: &str = "You are a retrieval-augmented assistant. Decide the single next step.\n\
- Call a tool when the answer depends on documents you have not seen yet.\n\
- Prefer search_knowledge_base for questions about company documents; pass `domain` only when the question names one.\n\
- Answer directly when the conversation or earlier observations already contain the answer.\n\
- If an observation reports no_information_available, say so instead of guessing.\n\
- Cite passage sources in the answer when you used them.";

const DECISION_FORMAT: &str = "Reply with one JSON object:\n\
{\"reasoning\": \"...\", \"action\": \"tool\", \"tool_name\": \"...\", \"tool_args\": {...}}\n\
or\n\
{\"reasoning\": \"...\", \"action\": \"answer\", \"response\": \"...\"}";

/// Chat messages for one thinker call.
#[must_use]
pub fn build_thinker_messages(context: &ThinkContext<'_>) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(context.history.len() + 2);
    messages.push(ChatMessage::system(system_prompt(context)));
    for message in context.history {
        let role = match message.role {
            Role::Tool => Role::User,
            other => other,
        };
        let content = match (message.role, message.name.as_deref()) {
            (Role::Tool, Some(name)) => format!("[{name} output]\n{}", message.content),
            _ => message.content.clone(),
        };
        messages.push(ChatMessage::new(role.as_str(), content));
    }
    messages.push(ChatMessage::user(turn_prompt(context)));
    messages
}

fn system_prompt(context: &ThinkContext<'_>) -> String {
    let mut prompt = String::from(ROUTING_HINTS);
    prompt.push_str("\n\nAvailable tools:\n");
    if context.catalog.is_empty() {
        prompt.push_str("(none; answer directly)\n");
    }
    for tool in context.catalog {
        let _ = writeln!(
            prompt,
            "- {}: {}\n  arguments schema: {}",
            tool.name, tool.description, tool.schema
        );
    }
    prompt.push('\n');
    prompt.push_str(DECISION_FORMAT);
    prompt
}

fn turn_prompt(context: &ThinkContext<'_>) -> String {
    let mut prompt = format!("Question: {}\n", context.question);
    if !context.trace.is_empty() {
        prompt.push_str("\nSteps so far:\n");
        prompt.push_str(&render_trace(context.trace));
    }
    let _ = write!(
        prompt,
        "\nIteration {} of {}.",
        context.iteration + 1,
        context.max_iterations
    );
    if context.is_last_iteration() {
        prompt.push_str(" This is the last step: answer now with what you have.");
    }
    if let Some(hint) = context.corrective_hint {
        prompt.push_str("\n\n");
        prompt.push_str(hint);
    }
    prompt
}

/// Plain-text replay of a trace, one line per step.
#[must_use]
pub(crate) fn render_trace(trace: &ReasoningTrace) -> String {
    let mut out = String::new();
    for step in trace.steps() {
        match step.step_type {
            StepType::Think => {
                let _ = writeln!(out, "THINK: {}", step.content);
            }
            StepType::Act => {
                let args = step
                    .tool_args
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default();
                let _ = writeln!(
                    out,
                    "ACT: {} {args}",
                    step.tool_name.as_deref().unwrap_or("?")
                );
            }
            StepType::Observe => {
                let content = sift_tokenizer::truncate(&step.content, OBSERVATION_TOKEN_LIMIT);
                let _ = writeln!(out, "OBSERVE: {content}");
            }
            StepType::Answer => {
                let _ = writeln!(out, "ANSWER: {}", step.content);
            }
        }
    }
    out
}
