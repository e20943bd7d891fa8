//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: storage wiring (Postgres or in-memory)
//! - `routes/`: HTTP routes + handlers (one file per resource)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use libcat_infra::{AppConfig, StoreError};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router over the given services.
pub fn build_app(services: AppServices) -> Router {
    routes::router()
        .layer(Extension(Arc::new(services)))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Wire storage from configuration and build the router (used by `main.rs`).
pub async fn bootstrap(config: &AppConfig) -> Result<Router, StoreError> {
    let services = services::build_services(config).await?;
    Ok(build_app(services))
}
