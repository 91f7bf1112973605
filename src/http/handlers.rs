use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::domain::{BatchRequest, BatchResponse, batch::DEFAULT_SESSION};

use super::{
    AppState,
    error::{ApiError, ApiResult},
};

pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "feedlens relay is running",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn recommend_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> ApiResult<Json<BatchResponse>> {
    let Json(request) = payload.map_err(|rejection| {
        tracing::debug!(target: "http", error = %rejection, "rejected /recommend body");
        ApiError::bad_request("Invalid request body.")
    })?;

    let recommendations = state.relay.recommend(request).await?;
    Ok(Json(BatchResponse { recommendations }))
}

pub async fn list_categories_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "categories": state.categories.list().await }))
}

#[derive(Debug, Deserialize)]
pub struct SetCategoriesRequest {
    pub categories: Vec<String>,
}

pub async fn set_categories_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SetCategoriesRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let Json(request) =
        payload.map_err(|_| ApiError::bad_request("Categories must be an array."))?;

    let categories = state.categories.replace(&request.categories).await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetSessionRequest {
    #[serde(default)]
    pub session_id: Option<String>,
}

/// Forgets every URL the session has submitted, as on a fresh page load.
pub async fn reset_session_handler(
    State(state): State<Arc<AppState>>,
    payload: Option<Json<ResetSessionRequest>>,
) -> Json<Value> {
    let request = payload.map(|Json(request)| request).unwrap_or_default();
    let session = request
        .session_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .unwrap_or(DEFAULT_SESSION);

    let reset = state.relay.sessions().reset(session);
    tracing::info!(target: "http", session, reset, "session reset requested");
    Json(json!({ "sessionId": session, "reset": reset }))
}
