use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use crate::app::errors;
use crate::app::services::AppServices;

/// Fixed payload served at `/`.
pub const WELCOME_MESSAGE: &str = "Witaj w API biblioteki!";

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": WELCOME_MESSAGE }))
}

pub async fn health(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store().ping().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => {
            tracing::warn!("health check failed: {e}");
            errors::json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", e.to_string())
        }
    }
}
