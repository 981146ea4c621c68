//! `sift` CLI: interactive / one-shot question answering and session compression.
//!
//! Settings come from `packages/conf/settings.yaml` under `SIFT_ROOT` and
//! `<config home>/sift/settings.yaml`; override the config home with `--conf`.
//!
//! Logging: set `RUST_LOG=sift_agent=debug` (or pass `--verbose`) to see agent logs on stderr.

mod cli;
mod nodes;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sift_agent::{CoreConfig, load_runtime_settings, set_config_home_override};

use crate::cli::{Cli, Command};
use crate::nodes::{CompressRequest, run_compress_mode, run_repl_mode};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(conf_dir) = cli.conf.clone() {
        set_config_home_override(conf_dir);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if cli.verbose {
            "sift_agent=debug,sift_retrieval=debug"
        } else {
            "sift_agent=info,sift_retrieval=info"
        })
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let runtime_settings = load_runtime_settings();
    let config = CoreConfig::from_settings(&runtime_settings)?;

    match cli.command {
        Command::Repl {
            query,
            session_id,
            trace,
        } => run_repl_mode(query, session_id, trace, config).await,
        Command::Compress {
            session_id,
            budget,
            keep_recent,
            apply,
        } => {
            run_compress_mode(
                CompressRequest {
                    session_id,
                    budget,
                    keep_recent,
                    apply,
                },
                config,
            )
            .await
        }
    }
}
