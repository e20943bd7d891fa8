//! Catalog entities (authors, books, users) and their creation shapes.
//!
//! The column widths below mirror the relational schema; creation shapes are
//! checked against them before an insert is attempted. Referential integrity
//! (e.g. that `author_id` points at an existing author) is left to storage.

use serde::{Deserialize, Serialize};

use crate::entity::Entity;
use crate::error::{DomainError, DomainResult};
use crate::id::{AuthorId, BookId, LanguageId, NationalityId, UserId};

pub const AUTHOR_NAME_MAX: usize = 100;
pub const BOOK_TITLE_MAX: usize = 255;
pub const BOOK_ISBN_MAX: usize = 20;
pub const USERNAME_MAX: usize = 50;
pub const EMAIL_MAX: usize = 100;
pub const PASSWORD_HASH_MAX: usize = 255;

/// A persisted author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub first_name: String,
    pub last_name: String,
    pub nationality_id: Option<NationalityId>,
}

impl Entity for Author {
    type Id = AuthorId;

    fn id(&self) -> AuthorId {
        self.id
    }
}

/// A persisted book.
///
/// `title` is nullable in the table even though every book created through
/// the API carries one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: Option<String>,
    pub author_id: Option<AuthorId>,
    pub language_id: Option<LanguageId>,
    pub published_year: Option<i32>,
    pub pages: Option<i32>,
    pub isbn: Option<String>,
    pub description: Option<String>,
}

impl Entity for Book {
    type Id = BookId;

    fn id(&self) -> BookId {
        self.id
    }
}

/// A persisted user. Never exposed over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Author fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
    pub nationality_id: Option<NationalityId>,
}

impl NewAuthor {
    pub fn validate(&self) -> DomainResult<()> {
        check_width("first_name", &self.first_name, AUTHOR_NAME_MAX)?;
        check_width("last_name", &self.last_name, AUTHOR_NAME_MAX)?;
        Ok(())
    }

    /// Attach a generated identity.
    pub fn into_author(self, id: AuthorId) -> Author {
        Author {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            nationality_id: self.nationality_id,
        }
    }
}

/// Book fields supplied on creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author_id: AuthorId,
    pub published_year: Option<i32>,
    pub language_id: Option<LanguageId>,
    pub pages: Option<i32>,
    pub isbn: Option<String>,
    pub description: Option<String>,
}

impl NewBook {
    /// Minimal book: title + author, everything else unset.
    pub fn new(title: impl Into<String>, author_id: AuthorId) -> Self {
        Self {
            title: title.into(),
            author_id,
            published_year: None,
            language_id: None,
            pages: None,
            isbn: None,
            description: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        check_width("title", &self.title, BOOK_TITLE_MAX)?;
        if let Some(isbn) = &self.isbn {
            check_width("isbn", isbn, BOOK_ISBN_MAX)?;
        }
        if let Some(pages) = self.pages {
            if pages < 0 {
                return Err(DomainError::validation("pages must not be negative"));
            }
        }
        Ok(())
    }

    /// Attach a generated identity.
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: Some(self.title),
            author_id: Some(self.author_id),
            language_id: self.language_id,
            published_year: self.published_year,
            pages: self.pages,
            isbn: self.isbn,
            description: self.description,
        }
    }
}

/// User fields supplied on creation. The password is expected to be hashed
/// already.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn validate(&self) -> DomainResult<()> {
        check_required("username", &self.username)?;
        check_width("username", &self.username, USERNAME_MAX)?;
        check_required("email", &self.email)?;
        check_width("email", &self.email, EMAIL_MAX)?;
        check_required("password_hash", &self.password_hash)?;
        check_width("password_hash", &self.password_hash, PASSWORD_HASH_MAX)?;
        Ok(())
    }

    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
        }
    }
}

fn check_width(field: &str, value: &str, max: usize) -> DomainResult<()> {
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters (got {len})"
        )));
    }
    Ok(())
}

fn check_required(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}
