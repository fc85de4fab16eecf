use std::sync::Arc;

use anyhow::{Context, Result};
use uuid::Uuid;
use vakt_common::models::auth::Verdict;
use vakt_common::models::user::{Role, UserProfile};
use vakt_db::{NewUser, ProfileChanges, UserRecord, UserStore};

use crate::auth::{hash_password, verify_password};

/// Core identity operations shared by the REST and gRPC surfaces. The
/// transport adapters stay thin: they translate requests into these calls
/// and map the outcomes onto their own wire conventions.
#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn UserStore>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Run the credential validation protocol for a username/password pair.
    ///
    /// Every verdict branch returns normally; only store or hash-parsing
    /// failures propagate as errors, which callers surface as internal.
    pub async fn validate_credentials(&self, username: &str, password: &str) -> Result<Verdict> {
        let record = match self.store.find_by_username(username).await? {
            Some(record) => record,
            None => return Ok(Verdict::rejected("user not found")),
        };

        if verify_password(password, &record.password_hash)? {
            Ok(Verdict::accepted(record.id, record.username))
        } else {
            Ok(Verdict::rejected("incorrect credential"))
        }
    }

    pub async fn profile_by_id(&self, id: &str) -> Result<Option<UserProfile>> {
        let record = self.store.find_by_id(id).await?;
        Ok(record.map(profile_of))
    }

    pub async fn profile_by_username(&self, username: &str) -> Result<Option<UserProfile>> {
        let record = self.store.find_by_username(username).await?;
        Ok(record.map(profile_of))
    }

    /// Resolve the role granted to a subject. Roles live on the user record,
    /// not in tokens, so gated handlers call this per request.
    pub async fn role_of(&self, username: &str) -> Result<Option<Role>> {
        let record = self.store.find_by_username(username).await?;
        Ok(record.map(|r| Role::parse_lossy(&r.role)))
    }

    /// Create a new account with a freshly hashed password. Public
    /// registrations always start as plain users.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        email: Option<String>,
        address: Option<String>,
        phone: Option<String>,
    ) -> Result<UserProfile> {
        let password_hash = hash_password(password).context("Failed to hash password")?;
        let record = self
            .store
            .create(NewUser {
                id: Uuid::new_v4().to_string(),
                username: username.to_string(),
                password_hash,
                email,
                address,
                phone,
                role: Role::User.as_str().to_string(),
            })
            .await?;
        Ok(profile_of(record))
    }

    /// Apply a partial profile update, returning `None` when no record
    /// exists for the subject.
    pub async fn update_profile(
        &self,
        username: &str,
        changes: ProfileChanges,
    ) -> Result<Option<UserProfile>> {
        let record = self.store.update_profile(username, changes).await?;
        Ok(record.map(profile_of))
    }
}

/// The single place where a stored record becomes a client-facing view.
/// The password hash does not survive this conversion.
fn profile_of(record: UserRecord) -> UserProfile {
    UserProfile {
        id: record.id,
        username: record.username,
        email: record.email,
        address: record.address,
        phone: record.phone,
        role: Role::parse_lossy(&record.role),
    }
}
