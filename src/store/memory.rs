use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DuplicateField, Store, StoreError};
use crate::auth::repo_types::{NewUser, User};
use crate::calculations::repo_types::Calculation;

/// Process-local store used when no database is configured.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    // insertion order doubles as creation order
    calculations: RwLock<Vec<Calculation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_login(&self, login: &str) -> anyhow::Result<Option<User>> {
        let email = login.to_lowercase();
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.username == login || u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.username == new.username) {
            return Err(StoreError::Duplicate(DuplicateField::Username));
        }
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Duplicate(DuplicateField::Email));
        }
        let user = User {
            id: Uuid::new_v4(),
            username: new.username,
            email: new.email,
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_calculations(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> anyhow::Result<Vec<Calculation>> {
        let calcs = self.calculations.read().await;
        let take = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(0));
        let skip = usize::try_from(offset).unwrap_or(0);
        Ok(calcs
            .iter()
            .rev()
            .filter(|c| c.user_id == user_id)
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn get_calculation(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Calculation>> {
        let calcs = self.calculations.read().await;
        Ok(calcs
            .iter()
            .find(|c| c.id == id && c.user_id == user_id)
            .cloned())
    }

    async fn insert_calculation(&self, calc: Calculation) -> anyhow::Result<Calculation> {
        let mut calcs = self.calculations.write().await;
        anyhow::ensure!(
            !calcs.iter().any(|c| c.id == calc.id),
            "calculation {} already exists",
            calc.id
        );
        calcs.push(calc.clone());
        Ok(calc)
    }

    async fn update_calculation(&self, calc: Calculation) -> anyhow::Result<Option<Calculation>> {
        let mut calcs = self.calculations.write().await;
        let Some(existing) = calcs
            .iter_mut()
            .find(|c| c.id == calc.id && c.user_id == calc.user_id)
        else {
            return Ok(None);
        };
        existing.kind = calc.kind;
        existing.inputs = calc.inputs;
        existing.result = calc.result;
        existing.updated_at = calc.updated_at;
        Ok(Some(existing.clone()))
    }

    async fn delete_calculation(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        let mut calcs = self.calculations.write().await;
        let before = calcs.len();
        calcs.retain(|c| !(c.id == id && c.user_id == user_id));
        Ok(calcs.len() < before)
    }
}
