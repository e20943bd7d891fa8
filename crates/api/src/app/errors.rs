use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use libcat_core::DomainError;
use libcat_infra::StoreError;

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    tracing::warn!("store operation failed: {err}");
    match err {
        StoreError::UniqueViolation(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::ForeignKeyViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_reference", msg)
        }
        StoreError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", msg)
        }
        StoreError::Database(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg)
        }
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
