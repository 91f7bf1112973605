use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{
    AppState,
    handlers::{
        health_handler, list_categories_handler, recommend_handler, reset_session_handler,
        set_categories_handler,
    },
};

pub fn http_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/recommend", post(recommend_handler))
        .route("/categories", get(list_categories_handler))
        .route("/set-categories", post(set_categories_handler))
        .route("/reset-session", post(reset_session_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
