//! `sitehue serve` subcommand.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use sitehue_core::ThemeStore;
use sitehue_extract::config::ENV_WEBDRIVER_URL;
use sitehue_extract::{ExtractConfig, WebsiteDataAssembler};

use crate::output;
use crate::server::{self, AppState};

pub async fn handle(addr: SocketAddr) -> Result<()> {
    let config = ExtractConfig::from_env()?;
    let assembler = WebsiteDataAssembler::from_config(&config)?;
    let state = AppState::new(assembler, Arc::new(ThemeStore::new()));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr()?;

    output::header(&format!("sitehue listening on http://{local}"));
    if config.webdriver_url.is_none() {
        output::warning(&format!(
            "{ENV_WEBDRIVER_URL} is not set; headless browser fallback disabled"
        ));
    }
    tracing::info!(
        addr = %local,
        page_timeout_ms = config.page_timeout.as_millis() as u64,
        favicon_timeout_ms = config.favicon_timeout.as_millis() as u64,
        browser = config.webdriver_url.is_some(),
        "Server started"
    );

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
