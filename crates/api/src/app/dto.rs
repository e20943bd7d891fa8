use serde::Deserialize;

use libcat_core::{Author, AuthorId, Book, LanguageId, NationalityId, NewAuthor, NewBook};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    pub author_id: AuthorId,
    pub published_year: Option<i32>,
    pub language_id: Option<LanguageId>,
    pub pages: Option<i32>,
    pub isbn: Option<String>,
    pub description: Option<String>,
}

impl From<CreateBookRequest> for NewBook {
    fn from(req: CreateBookRequest) -> Self {
        NewBook {
            title: req.title,
            author_id: req.author_id,
            published_year: req.published_year,
            language_id: req.language_id,
            pages: req.pages,
            isbn: req.isbn,
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateAuthorRequest {
    pub first_name: String,
    pub last_name: String,
    pub nationality_id: Option<NationalityId>,
}

impl From<CreateAuthorRequest> for NewAuthor {
    fn from(req: CreateAuthorRequest) -> Self {
        NewAuthor {
            first_name: req.first_name,
            last_name: req.last_name,
            nationality_id: req.nationality_id,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchBooksQuery {
    #[serde(default)]
    pub query: String,
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn book_to_json(book: Book) -> serde_json::Value {
    serde_json::json!({
        "id": book.id,
        "title": book.title,
        "author_id": book.author_id,
        "language_id": book.language_id,
        "published_year": book.published_year,
        "pages": book.pages,
        "isbn": book.isbn,
        "description": book.description,
    })
}

pub fn author_to_json(author: Author) -> serde_json::Value {
    serde_json::json!({
        "id": author.id,
        "first_name": author.first_name,
        "last_name": author.last_name,
        "nationality_id": author.nationality_id,
    })
}
