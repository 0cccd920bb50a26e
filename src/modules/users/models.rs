use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A library patron.
///
/// Identity is the `id`; two snapshots with the same id are the same user
/// even if one of them is stale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Punished users may not borrow and are charged late-return penalties.
    #[serde(default)]
    pub is_punished: bool,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            is_punished: false,
        }
    }

    pub fn same_as(&self, other: &User) -> bool {
        self.id == other.id
    }
}

/// Request model for creating a new user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    pub username: String,
}

/// Request model for changing a user's punishment flag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetPunishment {
    pub is_punished: bool,
}
