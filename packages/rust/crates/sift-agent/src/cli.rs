use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "Agentic retrieval: hybrid search + bounded reasoning over your documents.")]
pub(crate) struct Cli {
    /// Override config home (reads `<conf>/sift/settings.yaml`).
    #[arg(long, global = true)]
    pub(crate) conf: Option<PathBuf>,

    /// Debug logging on stderr (RUST_LOG still wins).
    #[arg(long, short, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Ask questions. One-shot with --query, otherwise read lines from stdin until EOF.
    Repl {
        /// Run one turn with this question and exit.
        #[arg(long)]
        query: Option<String>,

        /// Continue this session (created on first use). Default: new session.
        #[arg(long)]
        session_id: Option<String>,

        /// Print the reasoning trace after each answer.
        #[arg(long)]
        trace: bool,
    },
    /// Show what compression would do to a stored session.
    Compress {
        /// Session to compress.
        #[arg(long)]
        session_id: String,

        /// Token budget (default: context.token_budget).
        #[arg(long)]
        budget: Option<usize>,

        /// Messages kept verbatim (default: context.keep_recent).
        #[arg(long)]
        keep_recent: Option<usize>,

        /// Persist the summary into the session instead of only printing it.
        #[arg(long)]
        apply: bool,
    },
}
