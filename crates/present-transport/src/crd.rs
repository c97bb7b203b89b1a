//! `/crd/` endpoint.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    cluster::{ClusterError, definition_details, definition_names},
    router::AppState,
};

/// Query string of the `/crd/` endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct CrdQuery {
    #[serde(default)]
    pub name: Option<String>,
}

/// List definition names, or describe one when `name` is given.
pub async fn crd_handler(State(state): State<AppState>, Query(query): Query<CrdQuery>) -> Response {
    let result = match query.name.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => describe(&state, name).await,
        None => list(&state).await,
    };
    result.unwrap_or_else(|err| {
        tracing::warn!("CRD lookup failed: {err}");
        (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
    })
}

async fn list(state: &AppState) -> Result<Response, ClusterError> {
    let listing = state.cluster.list_definitions().await?;
    Ok(Json(definition_names(&listing)?).into_response())
}

async fn describe(state: &AppState, name: &str) -> Result<Response, ClusterError> {
    let definition = state.cluster.get_definition(name).await?;
    let Some(details) = definition_details(&definition)? else {
        return Ok((StatusCode::NOT_FOUND, format!("{name} declares no versions")).into_response());
    };
    let body = serde_json::to_string_pretty(&details)?;
    Ok(([(axum::http::header::CONTENT_TYPE, "application/json")], body).into_response())
}
