//! Book persistence seam.
//!
//! The service only talks to [`BookRepository`]; a database-backed store is
//! expected to live outside this crate. [`InMemoryBookRepository`] backs the
//! server binary and the tests.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::Book;

#[async_trait]
pub trait BookRepository: Send + Sync {
    async fn find_all(&self) -> anyhow::Result<Vec<Book>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Book>>;

    /// Insert or replace by id, returning the stored record.
    async fn save(&self, book: Book) -> anyhow::Result<Book>;

    /// Returns false when nothing was stored under `id`.
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Insertion-ordered in-memory store.
#[derive(Debug, Default)]
pub struct InMemoryBookRepository {
    books: RwLock<Vec<Book>>,
}

impl InMemoryBookRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_books(books: Vec<Book>) -> Self {
        Self {
            books: RwLock::new(books),
        }
    }
}

#[async_trait]
impl BookRepository for InMemoryBookRepository {
    async fn find_all(&self) -> anyhow::Result<Vec<Book>> {
        Ok(self.books.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Book>> {
        Ok(self
            .books
            .read()
            .await
            .iter()
            .find(|book| book.id == id)
            .cloned())
    }

    async fn save(&self, book: Book) -> anyhow::Result<Book> {
        let mut books = self.books.write().await;
        match books.iter_mut().find(|stored| stored.id == book.id) {
            Some(stored) => *stored = book.clone(),
            None => books.push(book.clone()),
        }
        Ok(book)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let mut books = self.books.write().await;
        let before = books.len();
        books.retain(|book| book.id != id);
        Ok(books.len() != before)
    }
}
