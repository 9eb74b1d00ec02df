//! SQLite-backed user store.

use anyhow::{Context, Result, anyhow};
use log::debug;
use sqlx::SqlitePool;

use super::models::{ProfileUpdate, User};

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new account. A uniqueness violation on the username surfaces
    /// as an "already taken" error so races lose cleanly.
    pub async fn insert(&self, id: &str, username: &str, password_hash: &str) -> Result<User> {
        debug!("creating user {username} ({id})");

        sqlx::query("INSERT INTO users (id, username, password_hash) VALUES (?, ?, ?)")
            .bind(id)
            .bind(username)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|err| {
                if err.to_string().contains("UNIQUE constraint failed") {
                    anyhow!("Username '{username}' is already taken")
                } else {
                    anyhow!(err).context("inserting user")
                }
            })?;

        self.by_id(id)
            .await?
            .context("user row missing immediately after insert")
    }

    pub async fn by_username(&self, username: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .context("querying user by username")
    }

    pub async fn by_id(&self, id: &str) -> Result<Option<User>> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("querying user by id")
    }

    /// Overwrite the dashboard profile fields. Returns None for an unknown id.
    pub async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> Result<Option<User>> {
        let affected = sqlx::query(
            "UPDATE users
             SET leetcode = ?, gfg = ?, profile_picture = ?, updated_at = datetime('now')
             WHERE id = ?",
        )
        .bind(&update.leetcode)
        .bind(&update.gfg)
        .bind(&update.profile_picture)
        .bind(id)
        .execute(&self.pool)
        .await
        .context("updating profile")?
        .rows_affected();

        if affected == 0 {
            return Ok(None);
        }
        self.by_id(id).await
    }
}
