//! `libcat-core` — catalog schema building blocks.
//!
//! Entities, typed identifiers and creation shapes. No storage or HTTP
//! concerns live here.

pub mod catalog;
pub mod entity;
pub mod error;
pub mod id;

pub use catalog::{Author, Book, NewAuthor, NewBook, NewUser, User};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AuthorId, BookId, LanguageId, NationalityId, UserId};
