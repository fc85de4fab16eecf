use std::collections::HashMap;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::store::{NewUser, ProfileChanges, UserRecord, UserStore};

/// In-memory user store for tests and local development. Enforces the same
/// uniqueness rules as the PostgreSQL store.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<UserRecord> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            bail!("user id already exists: {}", user.id);
        }
        if users.values().any(|u| u.username == user.username) {
            bail!("username already exists: {}", user.username);
        }
        let record = UserRecord {
            id: user.id.clone(),
            username: user.username,
            password_hash: user.password_hash,
            email: user.email,
            address: user.address,
            phone: user.phone,
            role: user.role,
            created_at: Utc::now(),
        };
        users.insert(user.id, record.clone());
        Ok(record)
    }

    async fn update_profile(
        &self,
        username: &str,
        changes: ProfileChanges,
    ) -> Result<Option<UserRecord>> {
        let mut users = self.users.write().await;
        let record = users.values_mut().find(|u| u.username == username);
        Ok(record.map(|u| {
            if let Some(email) = changes.email {
                u.email = Some(email);
            }
            if let Some(address) = changes.address {
                u.address = Some(address);
            }
            if let Some(phone) = changes.phone {
                u.phone = Some(phone);
            }
            u.clone()
        }))
    }
}
