use std::sync::Arc;

use anyhow::Context;
use common::protection::FileCheckStateStore;
use tracing::{Level, info, warn};

use server::config::AppConfig;
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let check_state = Arc::new(FileCheckStateStore::new(config.protection.state_file.clone()));
    let state = AppState::new(config, check_state);

    // Same as a fresh install: check everything regardless of the last run.
    let outcome = state.reconciler.reconcile(true).await;
    if outcome.is_failed() {
        warn!(?outcome, "Protected directory is not fully in place, will retry");
    }
    state.scheduler.clone().spawn();

    let app = server::build_router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
