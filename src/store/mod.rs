use std::fmt;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};
use crate::calculations::repo_types::Calculation;

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DuplicateField {
    Username,
    Email,
}

impl fmt::Display for DuplicateField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DuplicateField::Username => f.write_str("Username"),
            DuplicateField::Email => f.write_str("Email"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} already exists")]
    Duplicate(DuplicateField),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Persistence for users and their calculations.
///
/// Every calculation query is scoped by owner: a calculation that belongs to
/// another user behaves exactly like a missing one.
#[async_trait]
pub trait Store: Send + Sync {
    /// Looks a user up by username, or by email when `login` is one.
    async fn find_user_by_login(&self, login: &str) -> anyhow::Result<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>>;
    async fn create_user(&self, new: NewUser) -> Result<User, StoreError>;

    /// Newest first. `limit: None` returns everything after `offset`.
    async fn list_calculations(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> anyhow::Result<Vec<Calculation>>;
    async fn get_calculation(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Calculation>>;
    async fn insert_calculation(&self, calc: Calculation) -> anyhow::Result<Calculation>;
    /// Replaces type, inputs, result and `updated_at`; `None` when the row is gone.
    async fn update_calculation(&self, calc: Calculation) -> anyhow::Result<Option<Calculation>>;
    async fn delete_calculation(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool>;
}
