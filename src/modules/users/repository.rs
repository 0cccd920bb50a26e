//! User persistence seam, mirroring the book repository.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::User;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_all(&self) -> anyhow::Result<Vec<User>>;

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    /// Insert or replace by id, returning the stored record.
    async fn save(&self, user: User) -> anyhow::Result<User>;
}

#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: RwLock::new(users),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_all(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.users.read().await.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.id == id)
            .cloned())
    }

    async fn save(&self, user: User) -> anyhow::Result<User> {
        let mut users = self.users.write().await;
        match users.iter_mut().find(|stored| stored.same_as(&user)) {
            Some(stored) => *stored = user.clone(),
            None => users.push(user.clone()),
        }
        Ok(user)
    }
}
