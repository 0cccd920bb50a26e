//! Lending rule and service errors

use library_http::error::AppError;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

/// Result type alias for lending rules
pub type LendingResult<T> = Result<T, LendingError>;

/// Rule violations detected on in-memory book/user snapshots
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LendingError {
    #[error("Livro sem estado de empréstimo")]
    BorrowStateUnknown,

    #[error("Custo do livro não encontrado")]
    MissingCost,

    #[error("Nenhum livro foi encontrado")]
    NoBooksFound,

    #[error("Livro cadastrado sem preço")]
    BookWithoutPrice,

    #[error("Nenhum preço cadastrado")]
    NoPriceRegistered,

    #[error("Ano de lançamento não encontrado")]
    MissingYearEdition,

    #[error("Ano de lançamento depois de hoje")]
    EditionInFuture,

    #[error("O livro {name} possui data de devolução mas não tem usuário relacionado.")]
    DevolutionWithoutUser { name: String },

    #[error("Livro já foi emprestado")]
    AlreadyBorrowed,

    #[error("O usuário não está autorizado para pegar novos livros")]
    UserNotAuthorized,

    #[error("O livro está associado ao usuário, mas não está emprestado")]
    NotBorrowed,

    #[error("O livro está associado ao usuário, mas não tem data de devolução")]
    MissingDevolutionDate,

    #[error("O livro não possui custo")]
    MissingBookCost,

    #[error("Não há nenhum livro emprestado para esse usuário")]
    NoLoansForUser,

    #[error("Livro não está emprestado")]
    BookNotLent,

    #[error("Valor fora do intervalo suportado")]
    AmountOverflow,
}

/// Result type alias for repository-backed operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors raised by [`crate::modules::books::service::BookService`]
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("The object was not found")]
    NotFound { id: Uuid },

    #[error("The parameters are wrong")]
    InvalidParameters,

    #[error(transparent)]
    Rule(#[from] LendingError),

    #[error("repository failure: {0:#}")]
    Repository(#[from] anyhow::Error),
}

impl ServiceError {
    pub fn not_found(id: Uuid) -> Self {
        Self::NotFound { id }
    }
}

impl LendingError {
    /// Refusals caused by the current loan state rather than bad data.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            LendingError::AlreadyBorrowed
                | LendingError::UserNotAuthorized
                | LendingError::NoLoansForUser
                | LendingError::BookNotLent
        )
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { id } => {
                tracing::debug!(%id, "record not found");
                AppError::not_found(err.to_string())
            }
            ServiceError::InvalidParameters => AppError::validation(
                vec![
                    json!({"field": "name", "error": "required"}),
                    json!({"field": "author", "error": "required"}),
                ],
                err.to_string(),
            ),
            ServiceError::Rule(rule) if rule.is_state_conflict() => {
                AppError::conflict(vec![], rule.to_string())
            }
            ServiceError::Rule(rule) => AppError::validation(vec![], rule.to_string()),
            ServiceError::Repository(e) => AppError::Internal(e),
        }
    }
}
