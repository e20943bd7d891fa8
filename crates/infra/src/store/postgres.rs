//! Postgres-backed catalog store.
//!
//! ## Error Mapping
//!
//! | SQLx error | SQLSTATE | StoreError |
//! |------------|----------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation` |
//! | Database (other) | any | `Database` |
//! | PoolClosed / PoolTimedOut / Io / Tls | n/a | `Unavailable` |
//! | Other | n/a | `Database` |

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use libcat_core::{
    Author, AuthorId, Book, BookId, LanguageId, NationalityId, NewAuthor, NewBook, NewUser, User,
    UserId,
};

use super::{LibraryStore, StoreError, StoreResult};

const BOOK_COLUMNS: &str =
    "id, title, author_id, language_id, published_year, pages, isbn, description";
const AUTHOR_COLUMNS: &str = "id, first_name, last_name, nationality_id";
const USER_COLUMNS: &str = "id, username, email, password_hash";

/// Catalog store over a `PgPool`.
///
/// Every operation checks out one connection from the pool and returns it
/// when done; inserts run inside a transaction and read the generated row
/// back with `RETURNING`.
#[derive(Debug, Clone)]
pub struct PostgresLibraryStore {
    pool: PgPool,
}

impl PostgresLibraryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LibraryStore for PostgresLibraryStore {
    #[instrument(skip(self), err)]
    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;

        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY id ASC"
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_books", e))?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    #[instrument(skip(self), fields(book_id = %id), err)]
    async fn get_book(&self, id: BookId) -> StoreResult<Option<Book>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;

        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("get_book", e))?;

        Ok(row.map(Book::from))
    }

    #[instrument(skip(self), err)]
    async fn search_books(&self, query: &str) -> StoreResult<Vec<Book>> {
        let needle = query.trim();
        if needle.is_empty() {
            return Ok(vec![]);
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;

        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE title ILIKE '%' || $1 || '%' ORDER BY id ASC"
        ))
        .bind(escape_like(needle))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("search_books", e))?;

        Ok(rows.into_iter().map(Book::from).collect())
    }

    #[instrument(skip(self, book), fields(author_id = %book.author_id), err)]
    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query_as::<_, BookRow>(&format!(
            r#"
            INSERT INTO books (title, author_id, language_id, published_year, pages, isbn, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(&book.title)
        .bind(book.author_id.get())
        .bind(book.language_id.map(LanguageId::get))
        .bind(book.published_year)
        .bind(book.pages)
        .bind(&book.isbn)
        .bind(&book.description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_book", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;

        let rows = sqlx::query_as::<_, AuthorRow>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors ORDER BY id ASC"
        ))
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_authors", e))?;

        Ok(rows.into_iter().map(Author::from).collect())
    }

    #[instrument(skip(self), fields(author_id = %id), err)]
    async fn get_author(&self, id: AuthorId) -> StoreResult<Option<Author>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;

        let row = sqlx::query_as::<_, AuthorRow>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1"
        ))
        .bind(id.get())
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("get_author", e))?;

        Ok(row.map(Author::from))
    }

    #[instrument(skip(self, author), err)]
    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query_as::<_, AuthorRow>(&format!(
            r#"
            INSERT INTO authors (first_name, last_name, nationality_id)
            VALUES ($1, $2, $3)
            RETURNING {AUTHOR_COLUMNS}
            "#
        ))
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.nationality_id.map(NationalityId::get))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_author", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self, user), fields(username = %user.username), err)]
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(row.into())
    }

    #[instrument(skip(self), err)]
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| map_sqlx_error("acquire", e))?;

        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("find_user_by_username", e))?;

        Ok(row.map(User::from))
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("ping", e))?;
        Ok(())
    }
}

/// Escape `%`, `_` and `\` so user input matches literally inside `ILIKE`.
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Map SQLx errors to StoreError.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                Some("23503") => StoreError::ForeignKeyViolation(msg),
                _ => StoreError::Database(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("timed out acquiring a connection in {}", operation))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("i/o error in {}: {}", operation, e)),
        sqlx::Error::Tls(e) => StoreError::Unavailable(format!("tls error in {}: {}", operation, e)),
        _ => StoreError::Database(format!("sqlx error in {}: {}", operation, err)),
    }
}

// SQLx row types

#[derive(Debug)]
struct BookRow {
    id: i32,
    title: Option<String>,
    author_id: Option<i32>,
    language_id: Option<i32>,
    published_year: Option<i32>,
    pages: Option<i32>,
    isbn: Option<String>,
    description: Option<String>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for BookRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(BookRow {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            author_id: row.try_get("author_id")?,
            language_id: row.try_get("language_id")?,
            published_year: row.try_get("published_year")?,
            pages: row.try_get("pages")?,
            isbn: row.try_get("isbn")?,
            description: row.try_get("description")?,
        })
    }
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            id: BookId::new(row.id),
            title: row.title,
            author_id: row.author_id.map(AuthorId::new),
            language_id: row.language_id.map(LanguageId::new),
            published_year: row.published_year,
            pages: row.pages,
            isbn: row.isbn,
            description: row.description,
        }
    }
}

#[derive(Debug)]
struct AuthorRow {
    id: i32,
    first_name: String,
    last_name: String,
    nationality_id: Option<i32>,
}

impl<'r> sqlx::FromRow<'r, PgRow> for AuthorRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(AuthorRow {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            nationality_id: row.try_get("nationality_id")?,
        })
    }
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Author {
            id: AuthorId::new(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            nationality_id: row.nationality_id.map(NationalityId::new),
        }
    }
}

#[derive(Debug)]
struct UserRow {
    id: i32,
    username: String,
    email: String,
    password_hash: String,
}

impl<'r> sqlx::FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
        })
    }
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: UserId::new(row.id),
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
        }
    }
}
