//! In-memory catalog store for tests and local development.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use libcat_core::{Author, AuthorId, Book, BookId, Entity, NewAuthor, NewBook, NewUser, User, UserId};

use super::{LibraryStore, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    authors: BTreeMap<AuthorId, Author>,
    books: BTreeMap<BookId, Book>,
    users: BTreeMap<UserId, User>,
    last_author_id: i32,
    last_book_id: i32,
    last_user_id: i32,
}

fn next_id(last: &mut i32) -> i32 {
    *last += 1;
    *last
}

fn insert_row<E: Entity + Clone>(table: &mut BTreeMap<E::Id, E>, row: E) -> E {
    table.insert(row.id(), row.clone());
    row
}

/// In-memory catalog store.
///
/// Intended for tests/dev. Ids are sequential per table starting at 1, like
/// a `SERIAL` column. Enforces the book → author reference and user
/// uniqueness; the `languages`/`nationalities` references are not tracked.
#[derive(Debug, Default)]
pub struct InMemoryLibraryStore {
    tables: RwLock<Tables>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl LibraryStore for InMemoryLibraryStore {
    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        Ok(self.read()?.books.values().cloned().collect())
    }

    async fn get_book(&self, id: BookId) -> StoreResult<Option<Book>> {
        Ok(self.read()?.books.get(&id).cloned())
    }

    async fn search_books(&self, query: &str) -> StoreResult<Vec<Book>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(vec![]);
        }

        let tables = self.read()?;
        Ok(tables
            .books
            .values()
            .filter(|b| {
                b.title
                    .as_deref()
                    .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect())
    }

    async fn create_book(&self, book: NewBook) -> StoreResult<Book> {
        let mut tables = self.write()?;

        if !tables.authors.contains_key(&book.author_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "books.author_id={} is not present in authors",
                book.author_id
            )));
        }

        let id = BookId::new(next_id(&mut tables.last_book_id));
        Ok(insert_row(&mut tables.books, book.into_book(id)))
    }

    async fn list_authors(&self) -> StoreResult<Vec<Author>> {
        Ok(self.read()?.authors.values().cloned().collect())
    }

    async fn get_author(&self, id: AuthorId) -> StoreResult<Option<Author>> {
        Ok(self.read()?.authors.get(&id).cloned())
    }

    async fn create_author(&self, author: NewAuthor) -> StoreResult<Author> {
        let mut tables = self.write()?;
        let id = AuthorId::new(next_id(&mut tables.last_author_id));
        Ok(insert_row(&mut tables.authors, author.into_author(id)))
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.write()?;

        for existing in tables.users.values() {
            if existing.username == user.username {
                return Err(StoreError::UniqueViolation(format!(
                    "users.username={} already exists",
                    user.username
                )));
            }
            if existing.email == user.email {
                return Err(StoreError::UniqueViolation(format!(
                    "users.email={} already exists",
                    user.email
                )));
            }
        }

        let id = UserId::new(next_id(&mut tables.last_user_id));
        Ok(insert_row(&mut tables.users, user.into_user(id)))
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .read()?
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.read().map(|_| ())
    }
}
