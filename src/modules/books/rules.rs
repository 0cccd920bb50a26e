//! Lending, penalty and eligibility rules.
//!
//! Every rule works on snapshots handed in by the caller and never touches a
//! repository or the clock: date-dependent rules take `today` explicitly.

use rust_decimal::Decimal;
use time::{Date, Duration};

use library_kernel::settings::LendingSettings;

use super::error::{LendingError, LendingResult};
use super::models::{Book, BookDto};
use crate::modules::users::models::User;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Whole calendar months from `from` to `to`.
///
/// A month only counts once its day-of-month is reached, so 2025-01-31 to
/// 2025-02-28 is zero months. Negative when `to` precedes `from`.
pub fn months_between(from: Date, to: Date) -> i32 {
    let months = (to.year() - from.year()) * 12 + i32::from(u8::from(to.month()))
        - i32::from(u8::from(from.month()));

    if months > 0 && to.day() < from.day() {
        months - 1
    } else if months < 0 && to.day() > from.day() {
        months + 1
    } else {
        months
    }
}

/// The lending rule set, parameterised by a [`LendingSettings`] policy.
#[derive(Debug, Clone, Default)]
pub struct LendingRules {
    policy: LendingSettings,
}

impl LendingRules {
    pub fn new(policy: LendingSettings) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LendingSettings {
        &self.policy
    }

    /// Whether `user` may borrow `book` right now.
    pub fn check_booking_possibility(&self, user: &User, book: &Book) -> LendingResult<bool> {
        let is_borrowed = book.is_borrowed.ok_or(LendingError::BorrowStateUnknown)?;
        Ok(!user.is_punished && !is_borrowed)
    }

    /// Like [`Self::check_booking_possibility`] but names the reason for a refusal.
    ///
    /// A book with no recorded borrow state counts as available.
    pub fn ensure_can_lend(&self, user: &User, book: &Book) -> LendingResult<()> {
        if book.is_borrowed == Some(true) {
            return Err(LendingError::AlreadyBorrowed);
        }
        if user.is_punished {
            return Err(LendingError::UserNotAuthorized);
        }
        Ok(())
    }

    /// Devolution date for a loan starting `today`.
    pub fn devolution_date_from(&self, today: Date) -> Date {
        today.saturating_add(Duration::days(self.policy.loan_period_days))
    }

    /// Amount taken off the book cost by a `percentage` discount.
    pub fn discount_for_percentage(&self, book: &Book, percentage: Decimal) -> LendingResult<Decimal> {
        let cost = book.cost.ok_or(LendingError::MissingCost)?;
        cost.checked_mul(percentage)
            .and_then(|amount| amount.checked_div(HUNDRED))
            .ok_or(LendingError::AmountOverflow)
    }

    /// Whether `value` is enough to buy the book.
    pub fn can_buy_with(&self, book: &Book, value: Decimal) -> LendingResult<bool> {
        let cost = book.cost.ok_or(LendingError::MissingCost)?;
        Ok(cost <= value)
    }

    /// Users holding a borrowed book. Borrowed books without a user are skipped.
    pub fn users_responsible_for_borrowed(&self, books: &[Book]) -> Vec<User> {
        books
            .iter()
            .filter(|book| book.is_borrowed == Some(true))
            .filter_map(|book| book.user.clone())
            .collect()
    }

    pub fn count_borrowed_books(&self, books: &[Book]) -> LendingResult<u64> {
        if books.is_empty() {
            return Err(LendingError::NoBooksFound);
        }
        Ok(books
            .iter()
            .filter(|book| book.is_borrowed == Some(true))
            .count() as u64)
    }

    /// Sum of all costs; every book must have one.
    pub fn total_cost(&self, books: &[Book]) -> LendingResult<Decimal> {
        if books.is_empty() {
            return Err(LendingError::NoBooksFound);
        }
        books.iter().try_fold(Decimal::ZERO, |total, book| {
            let cost = book.cost.ok_or(LendingError::BookWithoutPrice)?;
            total.checked_add(cost).ok_or(LendingError::AmountOverflow)
        })
    }

    /// Highest registered cost. Books without a cost are ignored.
    pub fn max_cost(&self, books: &[Book]) -> LendingResult<Decimal> {
        books
            .iter()
            .filter_map(|book| book.cost)
            .max()
            .filter(|max| *max > Decimal::ZERO)
            .ok_or(LendingError::NoPriceRegistered)
    }

    /// Calendar years between the edition and `today`.
    pub fn years_since_edition(&self, book: &Book, today: Date) -> LendingResult<i32> {
        let edition = book.year_edition.ok_or(LendingError::MissingYearEdition)?;
        if edition > today {
            return Err(LendingError::EditionInFuture);
        }
        Ok(today.year() - edition.year())
    }

    /// Cost after yearly depreciation, floored at zero and rounded to cents.
    pub fn depreciated_cost(&self, book: &Book, today: Date) -> LendingResult<Decimal> {
        let years = self.years_since_edition(book, today)?;
        let cost = book.cost.ok_or(LendingError::MissingCost)?;

        let factor = self
            .policy
            .depreciation_per_year
            .checked_mul(Decimal::from(years))
            .and_then(|lost| Decimal::ONE.checked_sub(lost))
            .ok_or(LendingError::AmountOverflow)?;
        let depreciated = cost
            .checked_mul(factor.max(Decimal::ZERO))
            .ok_or(LendingError::AmountOverflow)?;
        Ok(depreciated.round_dp(2))
    }

    /// Users of books whose devolution date has passed, each listed once.
    pub fn users_with_late_devolution(&self, books: &[Book], today: Date) -> LendingResult<Vec<User>> {
        let mut users: Vec<User> = Vec::new();

        for book in books {
            let Some(devolution) = book.devolution_date else {
                continue;
            };
            let user = book
                .user
                .as_ref()
                .ok_or_else(|| LendingError::DevolutionWithoutUser {
                    name: book.name.clone(),
                })?;

            if devolution < today && !users.iter().any(|known| known.same_as(user)) {
                users.push(user.clone());
            }
        }

        Ok(users)
    }

    /// Books currently associated with `user`.
    pub fn count_books_rented_by(&self, books: &[Book], user: &User) -> u64 {
        books.iter().filter(|book| book.is_held_by(user)).count() as u64
    }

    pub fn books_same_author_and_name(&self, books: &[Book], name: &str, author: &str) -> Vec<BookDto> {
        books
            .iter()
            .filter(|book| book.name == name && book.author == author)
            .map(BookDto::from)
            .collect()
    }

    pub fn books_same_name(&self, books: &[Book], name: &str) -> Vec<BookDto> {
        books
            .iter()
            .filter(|book| book.name == name)
            .map(BookDto::from)
            .collect()
    }

    pub fn books_same_author(&self, books: &[Book], author: &str) -> Vec<BookDto> {
        books
            .iter()
            .filter(|book| book.author == author)
            .map(BookDto::from)
            .collect()
    }

    /// Late-return penalty owed by `user` over every book they hold.
    ///
    /// Only punished users pay. Each late month beyond the grace period costs
    /// `penalty_monthly_rate` of the book cost.
    pub fn penalty_for(&self, user: &User, books: &[Book], today: Date) -> LendingResult<Decimal> {
        if !user.is_punished {
            return Ok(Decimal::ZERO);
        }

        let mut penalty = Decimal::ZERO;
        for book in books.iter().filter(|book| book.is_held_by(user)) {
            if book.is_borrowed != Some(true) {
                return Err(LendingError::NotBorrowed);
            }
            let devolution = book
                .devolution_date
                .ok_or(LendingError::MissingDevolutionDate)?;
            let cost = book.cost.ok_or(LendingError::MissingBookCost)?;

            let charged_months =
                months_between(devolution, today) - self.policy.penalty_grace_months;
            if charged_months > 0 {
                penalty = cost
                    .checked_mul(Decimal::from(charged_months))
                    .and_then(|amount| amount.checked_mul(self.policy.penalty_monthly_rate))
                    .and_then(|amount| penalty.checked_add(amount))
                    .ok_or(LendingError::AmountOverflow)?;
            }
        }

        tracing::debug!(user_id = %user.id, %penalty, "penalty computed");
        Ok(penalty)
    }
}
