use axum::{routing::get, Router};

pub mod authors;
pub mod books;
pub mod system;

/// Router for every endpoint. Collection paths keep their trailing slash
/// (`/books/`, `/authors/`), matching what existing clients call.
pub fn router() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/health", get(system::health))
        .merge(books::router())
        .merge(authors::router())
}
