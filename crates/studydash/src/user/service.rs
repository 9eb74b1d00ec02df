//! Account registration and credential checks.

use anyhow::{Result, bail};
use log::info;
use uuid::Uuid;

use super::models::{ProfileUpdate, User};
use super::repository::UserRepository;

/// Account service on top of the user repository.
#[derive(Debug, Clone)]
pub struct UserService {
    repo: UserRepository,
}

impl UserService {
    pub fn new(repo: UserRepository) -> Self {
        Self { repo }
    }

    /// Create an account with a bcrypt-hashed password.
    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let username = username.trim();
        if username.len() < 3 {
            bail!("Username must be at least 3 characters");
        }
        if password.len() < 6 {
            bail!("Password must be at least 6 characters");
        }
        if self.repo.by_username(username).await?.is_some() {
            bail!("Username '{username}' is already taken");
        }

        let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)?;
        let id = Uuid::new_v4().to_string();
        let user = self.repo.insert(&id, username, &hash).await?;

        info!("registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Check a username/password pair. Returns None for an unknown user or a
    /// wrong password; callers must not distinguish the two.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> Result<Option<User>> {
        let Some(user) = self.repo.by_username(username.trim()).await? else {
            return Ok(None);
        };

        if bcrypt::verify(password, &user.password_hash).unwrap_or(false) {
            Ok(Some(user))
        } else {
            Ok(None)
        }
    }

    pub async fn profile(&self, id: &str) -> Result<Option<User>> {
        self.repo.by_id(id).await
    }

    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<Option<User>> {
        self.repo.update_profile(id, update).await
    }
}
