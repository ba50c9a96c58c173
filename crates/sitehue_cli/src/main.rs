//! CLI entry point for sitehue.

mod cli;
mod commands;
mod output;
mod server;

use clap::Parser;
use sitehue_observability::ObservabilityConfig;

use crate::cli::{Cli, Command};

/// Load the nearest `.env`, searching from the cwd upwards.
fn load_env_file() {
    let Ok(cwd) = std::env::current_dir() else {
        return;
    };
    let mut dir = cwd;
    for _ in 0..32 {
        let env_file = dir.join(".env");
        if env_file.exists() {
            let _ = dotenvy::from_path(&env_file);
            break;
        }
        if let Some(parent) = dir.parent() {
            dir = parent.to_path_buf();
        } else {
            break;
        }
    }
}

/// Tracing goes to stderr. One-shot commands stay quiet unless RUST_LOG or
/// `--verbose` asks otherwise; the server logs at info.
fn init_tracing(cli: &Cli) {
    let (service_name, default_level) = match cli.command {
        Command::Extract { .. } => ("sitehue-cli", "warn"),
        Command::Serve { .. } => ("sitehue-server", "info"),
    };

    let mut config = ObservabilityConfig::from_env().with_default_level(default_level);
    if std::env::var("OTEL_SERVICE_NAME").is_err() && std::env::var("SERVICE_NAME").is_err() {
        config.service_name = service_name.to_string();
    }
    if config.service_version.is_none() {
        config = config.with_version(env!("CARGO_PKG_VERSION"));
    }
    if cli.verbose {
        config = config.with_log_level("sitehue_extract=debug,sitehue_cli=debug,info");
    }

    if let Err(e) = sitehue_observability::init(config) {
        output::warning(&format!("Tracing disabled: {e}"));
    }
}

#[tokio::main]
async fn main() {
    load_env_file();
    let cli = Cli::parse();
    output::init(cli.output);
    init_tracing(&cli);

    let result = commands::handle(cli).await;
    sitehue_observability::shutdown();

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
