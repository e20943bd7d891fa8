use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use libcat_core::{BookId, DomainError, NewBook};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/books/", get(list_books).post(create_book))
        .route("/books/search/", get(search_books))
        .route("/books/:book_id", get(get_book))
}

pub async fn list_books(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store().list_books().await {
        Ok(books) => {
            let items = books.into_iter().map(dto::book_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_book(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateBookRequest>,
) -> axum::response::Response {
    let new_book = NewBook::from(body);
    if let Err(e) = new_book.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store().create_book(new_book).await {
        Ok(book) => {
            tracing::info!(book_id = %book.id, "book created");
            (StatusCode::CREATED, Json(dto::book_to_json(book))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_book(
    Extension(services): Extension<Arc<AppServices>>,
    Path(book_id): Path<String>,
) -> axum::response::Response {
    let id: BookId = match book_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().get_book(id).await {
        Ok(Some(book)) => (StatusCode::OK, Json(dto::book_to_json(book))).into_response(),
        Ok(None) => errors::domain_error_to_response(DomainError::not_found()),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn search_books(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::SearchBooksQuery>,
) -> axum::response::Response {
    match services.store().search_books(&params.query).await {
        Ok(books) => {
            let items = books.into_iter().map(dto::book_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
