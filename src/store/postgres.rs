use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use uuid::Uuid;

use super::{Store, StoreError};
use crate::auth::repo_types::{NewUser, User};
use crate::calculations::{repo, repo_types::Calculation};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_login(&self, login: &str) -> anyhow::Result<Option<User>> {
        User::find_by_login(&self.db, login).await
    }

    async fn find_user_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        User::find_by_id(&self.db, id).await
    }

    async fn create_user(&self, new: NewUser) -> Result<User, StoreError> {
        User::create(&self.db, &new).await
    }

    async fn list_calculations(
        &self,
        user_id: Uuid,
        limit: Option<i64>,
        offset: i64,
    ) -> anyhow::Result<Vec<Calculation>> {
        repo::list_by_user(&self.db, user_id, limit, offset).await
    }

    async fn get_calculation(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<Option<Calculation>> {
        repo::get_by_id(&self.db, user_id, id).await
    }

    async fn insert_calculation(&self, calc: Calculation) -> anyhow::Result<Calculation> {
        repo::insert(&self.db, &calc).await
    }

    async fn update_calculation(&self, calc: Calculation) -> anyhow::Result<Option<Calculation>> {
        repo::update(&self.db, &calc).await
    }

    async fn delete_calculation(&self, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
        repo::delete(&self.db, user_id, id).await
    }
}
