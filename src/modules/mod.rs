pub mod books;
pub mod users;

use std::sync::Arc;

use library_kernel::{settings::Settings, ModuleRegistry};

use books::repository::{BookRepository, InMemoryBookRepository};
use books::rules::LendingRules;
use books::service::BookService;
use users::repository::{InMemoryUserRepository, UserRepository};
use users::routes::UsersState;

use crate::utils::Clock;

/// Shared services handed to the modules.
#[derive(Clone)]
pub struct LibraryServices {
    pub books: Arc<BookService>,
    pub users: Arc<dyn UserRepository>,
}

impl LibraryServices {
    pub fn new(
        books: Arc<dyn BookRepository>,
        users: Arc<dyn UserRepository>,
        settings: &Settings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rules = LendingRules::new(settings.lending.clone());
        let service = BookService::new(books, users.clone(), rules, clock);
        Self {
            books: Arc::new(service),
            users,
        }
    }

    /// Services over empty in-memory repositories.
    pub fn in_memory(settings: &Settings, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            Arc::new(InMemoryBookRepository::new()),
            Arc::new(InMemoryUserRepository::new()),
            settings,
            clock,
        )
    }
}

/// Register all project-specific modules with the registry
pub fn register_all(registry: &mut ModuleRegistry, services: &LibraryServices) -> anyhow::Result<()> {
    registry.register(users::create_module(UsersState {
        users: services.users.clone(),
        books: services.books.clone(),
    }))?;
    registry.register(books::create_module(services.books.clone()))?;
    Ok(())
}
