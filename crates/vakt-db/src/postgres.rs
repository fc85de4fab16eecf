use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::store::{NewUser, ProfileChanges, UserRecord, UserStore};

/// PostgreSQL-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, username, password_hash, email, address, phone, role, created_at FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by id")?;
        Ok(row)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"SELECT id, username, password_hash, email, address, phone, role, created_at FROM users WHERE username = $1"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get user by username")?;
        Ok(row)
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"INSERT INTO users (id, username, password_hash, email, address, phone, role) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING id, username, password_hash, email, address, phone, role, created_at"#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.address)
        .bind(&user.phone)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await
        .context("Failed to create user")?;
        Ok(row)
    }

    async fn update_profile(
        &self,
        username: &str,
        changes: ProfileChanges,
    ) -> Result<Option<UserRecord>> {
        let row = sqlx::query_as::<_, UserRecord>(
            r#"UPDATE users SET email = COALESCE($2, email), address = COALESCE($3, address), phone = COALESCE($4, phone) WHERE username = $1 RETURNING id, username, password_hash, email, address, phone, role, created_at"#,
        )
        .bind(username)
        .bind(&changes.email)
        .bind(&changes.address)
        .bind(&changes.phone)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update user profile")?;
        Ok(row)
    }
}
