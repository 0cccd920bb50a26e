use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::modules::users::models::User;

/// A book record as held by the repository.
///
/// Every field but the identity and the descriptive strings may be absent;
/// the lending rules report which absence they cannot work with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub year_edition: Option<Date>,
    #[serde(default)]
    pub is_borrowed: Option<bool>,
    #[serde(default)]
    pub devolution_date: Option<Date>,
    /// Borrower snapshot taken when the book was lent.
    #[serde(default)]
    pub user: Option<User>,
}

impl Book {
    pub fn new(name: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            author: author.into(),
            description: String::new(),
            cost: None,
            year_edition: None,
            is_borrowed: None,
            devolution_date: None,
            user: None,
        }
    }

    /// True when the book is lent to `user`.
    pub fn is_held_by(&self, user: &User) -> bool {
        self.user.as_ref().is_some_and(|holder| holder.same_as(user))
    }

    /// Drop the borrower and devolution date and mark the book available.
    pub fn clear_loan(&mut self) {
        self.user = None;
        self.devolution_date = None;
        self.is_borrowed = Some(false);
    }

    /// Overwrite the editable fields from a transport object.
    pub fn apply(&mut self, dto: &BookDto) {
        self.name = dto.name.clone();
        self.author = dto.author.clone();
        self.description = dto.description.clone();
        self.cost = dto.cost;
        self.year_edition = dto.year_edition;
    }
}

/// Transport view of a book; also the insert/update payload.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BookDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cost: Option<Decimal>,
    #[serde(default)]
    pub year_edition: Option<Date>,
}

impl BookDto {
    /// Name and author are both required.
    pub fn is_valid(&self) -> bool {
        !self.name.trim().is_empty() && !self.author.trim().is_empty()
    }

    /// Build a new, available book from this payload.
    pub fn into_book(self) -> Book {
        let mut book = Book::new(self.name.clone(), self.author.clone());
        book.apply(&self);
        book.is_borrowed = Some(false);
        book
    }
}

impl From<&Book> for BookDto {
    fn from(book: &Book) -> Self {
        Self {
            id: Some(book.id),
            name: book.name.clone(),
            author: book.author.clone(),
            description: book.description.clone(),
            cost: book.cost,
            year_edition: book.year_edition,
        }
    }
}

impl From<Book> for BookDto {
    fn from(book: Book) -> Self {
        Self::from(&book)
    }
}
