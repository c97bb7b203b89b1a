//! Presentation server.
//!
//! Serves a folder of slides and runs the code snippets they send over
//! `/socket`.
//!
//! Run with: cargo run -p present-server -- --folder ./slides

mod cli;

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::Parser;
use present_core::{Environment, SystemEnvironment};
use present_executor::Orchestrator;
use present_transport::{AppState, KubectlCli, router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, static_root};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let assets = static_root(&cli.folder).context("unable to get static file path")?;

    let env: Arc<dyn Environment> = Arc::new(SystemEnvironment);
    let state = AppState {
        orchestrator: Orchestrator::new(Arc::clone(&env), cli.exec_config()),
        cluster: Arc::new(KubectlCli::new(cli.kubectl.clone(), env)),
    };
    let app = router(state, assets.clone());

    let listener = tokio::net::TcpListener::bind(&cli.address)
        .await
        .with_context(|| format!("unable to listen on {}", cli.address))?;
    tracing::info!(address = %cli.address, folder = %assets.display(), "Serving presentation");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
