//! Catalog storage seam.
//!
//! Route handlers talk to a [`LibraryStore`]; production wiring uses
//! [`PostgresLibraryStore`], dev/test wiring uses [`InMemoryLibraryStore`].
//! Each call is one unit of work against storage (one pooled connection, or
//! one transaction for inserts).

use async_trait::async_trait;
use thiserror::Error;

use libcat_core::{Author, AuthorId, Book, BookId, NewAuthor, NewBook, NewUser, User};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryLibraryStore;
pub use postgres::PostgresLibraryStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint rejected the write (e.g. duplicate username).
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign key pointed at a row that does not exist.
    #[error("foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// Storage could not be reached (pool closed, timeout, I/O).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Queries and inserts over the catalog tables.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// All books, ordered by id.
    async fn list_books(&self) -> StoreResult<Vec<Book>>;

    async fn get_book(&self, id: BookId) -> StoreResult<Option<Book>>;

    /// Books whose title contains `query` (case-insensitive). A blank query
    /// matches nothing.
    async fn search_books(&self, query: &str) -> StoreResult<Vec<Book>>;

    /// Insert a book and return the persisted row. `author_id` is not checked
    /// up front; a dangling reference surfaces as
    /// [`StoreError::ForeignKeyViolation`].
    async fn create_book(&self, book: NewBook) -> StoreResult<Book>;

    /// All authors, ordered by id.
    async fn list_authors(&self) -> StoreResult<Vec<Author>>;

    async fn get_author(&self, id: AuthorId) -> StoreResult<Option<Author>>;

    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author>;

    /// Insert a user. Username and email uniqueness is enforced here and
    /// nowhere else.
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Cheap liveness probe of the backing storage.
    async fn ping(&self) -> StoreResult<()>;
}
