use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};

use libcat_core::{AuthorId, DomainError, NewAuthor};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/authors/", get(list_authors).post(create_author))
        .route("/authors/:author_id", get(get_author))
}

pub async fn list_authors(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.store().list_authors().await {
        Ok(authors) => {
            let items = authors.into_iter().map(dto::author_to_json).collect::<Vec<_>>();
            (StatusCode::OK, Json(items)).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_author(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateAuthorRequest>,
) -> axum::response::Response {
    let new_author = NewAuthor::from(body);
    if let Err(e) = new_author.validate() {
        return errors::domain_error_to_response(e);
    }

    match services.store().create_author(new_author).await {
        Ok(author) => {
            tracing::info!(author_id = %author.id, "author created");
            (StatusCode::CREATED, Json(dto::author_to_json(author))).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn get_author(
    Extension(services): Extension<Arc<AppServices>>,
    Path(author_id): Path<String>,
) -> axum::response::Response {
    let id: AuthorId = match author_id.parse() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.store().get_author(id).await {
        Ok(Some(author)) => (StatusCode::OK, Json(dto::author_to_json(author))).into_response(),
        Ok(None) => errors::domain_error_to_response(DomainError::not_found()),
        Err(e) => errors::store_error_to_response(e),
    }
}
