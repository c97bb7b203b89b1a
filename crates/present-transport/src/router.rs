//! HTTP surface: WebSocket sessions, CRD lookups and static assets.

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use present_executor::Orchestrator;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{cluster::ClusterCli, crd::crd_handler, websocket::ws_handler};

/// Application state shared across handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub cluster: Arc<dyn ClusterCli>,
}

/// Build the application router.
///
/// Anything not matched by `/socket` or `/crd/` is served from `assets`.
#[must_use]
pub fn router(state: AppState, assets: impl Into<PathBuf>) -> Router {
    Router::new()
        .route("/socket", get(ws_handler))
        .route("/crd/", get(crd_handler))
        .fallback_service(ServeDir::new(assets.into()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
