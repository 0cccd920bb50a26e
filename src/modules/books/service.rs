//! Repository-backed book operations.
//!
//! Each operation loads the records it needs, applies [`LendingRules`] and
//! saves the outcome. "Today" comes from the injected [`Clock`].

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use super::error::{LendingError, ServiceError, ServiceResult};
use super::models::{Book, BookDto};
use super::repository::BookRepository;
use super::rules::LendingRules;
use crate::modules::users::models::User;
use crate::modules::users::repository::UserRepository;
use crate::utils::Clock;

/// Total and highest cost over the whole catalogue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub total: Decimal,
    pub max: Decimal,
}

pub struct BookService {
    books: Arc<dyn BookRepository>,
    users: Arc<dyn UserRepository>,
    rules: LendingRules,
    clock: Arc<dyn Clock>,
}

impl BookService {
    pub fn new(
        books: Arc<dyn BookRepository>,
        users: Arc<dyn UserRepository>,
        rules: LendingRules,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            books,
            users,
            rules,
            clock,
        }
    }

    pub fn rules(&self) -> &LendingRules {
        &self.rules
    }

    async fn load_book(&self, id: Uuid) -> ServiceResult<Book> {
        self.books
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(id))
    }

    async fn load_user(&self, id: Uuid) -> ServiceResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::not_found(id))
    }

    pub async fn verify_if_book_is_borrowed(&self, book_id: Uuid) -> ServiceResult<bool> {
        let book = self.load_book(book_id).await?;
        Ok(book.is_borrowed.unwrap_or(false))
    }

    pub async fn verify_if_possible_to_buy(&self, book_id: Uuid, value: Decimal) -> ServiceResult<bool> {
        let book = self.load_book(book_id).await?;
        Ok(self.rules.can_buy_with(&book, value)?)
    }

    pub async fn discount(&self, book_id: Uuid, percentage: Decimal) -> ServiceResult<Decimal> {
        let book = self.load_book(book_id).await?;
        Ok(self.rules.discount_for_percentage(&book, percentage)?)
    }

    pub async fn delete_book(&self, book_id: Uuid) -> ServiceResult<()> {
        let book = self.load_book(book_id).await?;
        self.books.delete(book.id).await?;
        tracing::info!(book_id = %book.id, "book deleted");
        Ok(())
    }

    /// Whether the user could borrow the book right now.
    pub async fn check_booking_possibility(&self, user_id: Uuid, book_id: Uuid) -> ServiceResult<bool> {
        let book = self.load_book(book_id).await?;
        let user = self.load_user(user_id).await?;
        Ok(self.rules.check_booking_possibility(&user, &book)?)
    }

    /// Lend a book, setting its devolution date from the loan period.
    pub async fn lend_book_to_user(&self, user_id: Uuid, book_id: Uuid) -> ServiceResult<Book> {
        let mut book = self.load_book(book_id).await?;
        let user = self.load_user(user_id).await?;
        self.rules.ensure_can_lend(&user, &book)?;

        let due = self.rules.devolution_date_from(self.clock.today());
        book.is_borrowed = Some(true);
        book.devolution_date = Some(due);
        book.user = Some(user);

        let book = self.books.save(book).await?;
        tracing::info!(book_id = %book.id, user_id = %user_id, %due, "book lent");
        Ok(book)
    }

    pub async fn return_book(&self, book_id: Uuid) -> ServiceResult<Book> {
        let mut book = self.load_book(book_id).await?;
        if book.is_borrowed != Some(true) {
            return Err(LendingError::BookNotLent.into());
        }

        book.clear_loan();
        let book = self.books.save(book).await?;
        tracing::info!(book_id = %book.id, "book returned");
        Ok(book)
    }

    /// Replace the book cost by its depreciated value.
    pub async fn update_price_according_year_edition(&self, book_id: Uuid) -> ServiceResult<Book> {
        let mut book = self.load_book(book_id).await?;
        let cost = self.rules.depreciated_cost(&book, self.clock.today())?;

        tracing::info!(book_id = %book.id, old_cost = ?book.cost, new_cost = %cost, "book repriced");
        book.cost = Some(cost);
        Ok(self.books.save(book).await?)
    }

    pub async fn insert_book(&self, dto: BookDto) -> ServiceResult<BookDto> {
        if !dto.is_valid() {
            return Err(ServiceError::InvalidParameters);
        }

        let book = self.books.save(dto.into_book()).await?;
        tracing::info!(book_id = %book.id, name = %book.name, "book inserted");
        Ok(BookDto::from(book))
    }

    pub async fn get_books(&self) -> ServiceResult<Vec<BookDto>> {
        let books = self.books.find_all().await?;
        Ok(books.iter().map(BookDto::from).collect())
    }

    pub async fn get_book_by_id(&self, book_id: Uuid) -> ServiceResult<BookDto> {
        Ok(BookDto::from(self.load_book(book_id).await?))
    }

    /// Overwrite editable fields; the payload is checked before the lookup.
    pub async fn update_book(&self, dto: BookDto, book_id: Uuid) -> ServiceResult<BookDto> {
        if !dto.is_valid() {
            return Err(ServiceError::InvalidParameters);
        }

        let mut book = self.load_book(book_id).await?;
        book.apply(&dto);
        let book = self.books.save(book).await?;
        tracing::info!(book_id = %book.id, "book updated");
        Ok(BookDto::from(book))
    }

    /// Clear every loan held by the user; returns how many books were freed.
    pub async fn remove_user_loans(&self, user_id: Uuid) -> ServiceResult<usize> {
        let user = self.load_user(user_id).await?;
        let held: Vec<Book> = self
            .books
            .find_all()
            .await?
            .into_iter()
            .filter(|book| book.is_held_by(&user))
            .collect();

        if held.is_empty() {
            return Err(LendingError::NoLoansForUser.into());
        }

        let freed = held.len();
        for mut book in held {
            book.clear_loan();
            self.books.save(book).await?;
        }

        tracing::info!(user_id = %user.id, freed, "user loans removed");
        Ok(freed)
    }

    /// Penalty owed by the user; unpunished users are not looked up further.
    pub async fn calculate_penalty(&self, user_id: Uuid) -> ServiceResult<Decimal> {
        let user = self.load_user(user_id).await?;
        if !user.is_punished {
            return Ok(Decimal::ZERO);
        }

        let books = self.books.find_all().await?;
        Ok(self.rules.penalty_for(&user, &books, self.clock.today())?)
    }

    pub async fn count_books_rented_by(&self, user_id: Uuid) -> ServiceResult<u64> {
        let user = self.load_user(user_id).await?;
        let books = self.books.find_all().await?;
        Ok(self.rules.count_books_rented_by(&books, &user))
    }

    pub async fn borrowed_count(&self) -> ServiceResult<u64> {
        let books = self.books.find_all().await?;
        Ok(self.rules.count_borrowed_books(&books)?)
    }

    pub async fn cost_summary(&self) -> ServiceResult<CostSummary> {
        let books = self.books.find_all().await?;
        Ok(CostSummary {
            total: self.rules.total_cost(&books)?,
            max: self.rules.max_cost(&books)?,
        })
    }

    /// Swap borrower snapshots for the stored user records.
    ///
    /// A user missing from the store keeps the snapshot taken at lend time.
    async fn refresh_users(&self, snapshots: Vec<User>) -> ServiceResult<Vec<User>> {
        let mut current = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let user = self.users.find_by_id(snapshot.id).await?.unwrap_or(snapshot);
            current.push(user);
        }
        Ok(current)
    }

    pub async fn responsible_users(&self) -> ServiceResult<Vec<User>> {
        let books = self.books.find_all().await?;
        let users = self.rules.users_responsible_for_borrowed(&books);
        self.refresh_users(users).await
    }

    pub async fn overdue_users(&self) -> ServiceResult<Vec<User>> {
        let books = self.books.find_all().await?;
        let users = self
            .rules
            .users_with_late_devolution(&books, self.clock.today())?;
        self.refresh_users(users).await
    }

    /// Exact-match search; with neither filter every book is returned.
    pub async fn search(&self, name: Option<&str>, author: Option<&str>) -> ServiceResult<Vec<BookDto>> {
        let books = self.books.find_all().await?;
        Ok(match (name, author) {
            (Some(name), Some(author)) => self.rules.books_same_author_and_name(&books, name, author),
            (Some(name), None) => self.rules.books_same_name(&books, name),
            (None, Some(author)) => self.rules.books_same_author(&books, author),
            (None, None) => books.iter().map(BookDto::from).collect(),
        })
    }
}
