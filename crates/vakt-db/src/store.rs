use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// A user row as persisted, password hash included. Never serialize this
/// type into a response; convert to a client-facing view first.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Fields required to insert a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub role: String,
}

/// Partial profile update. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

/// Storage interface for user accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;

    /// Insert a new user. Fails if the username or id is already taken.
    async fn create(&self, user: NewUser) -> Result<UserRecord>;

    /// Apply a partial profile update, returning the updated row or `None`
    /// if no user with that username exists.
    async fn update_profile(
        &self,
        username: &str,
        changes: ProfileChanges,
    ) -> Result<Option<UserRecord>>;
}
