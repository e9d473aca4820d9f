// Login sessions
//
// The cookie carries a random 256-bit token. The database only ever sees the
// SHA-256 digest of that token.

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};
use sha2::{Digest, Sha256};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::time::Duration;
use tracing::{debug, info};

use super::users::user_from_row;
use crate::models::User;
use crate::{ForumError, Result};

/// Random bytes per session token
pub const TOKEN_BYTES: usize = 32;

/// A freshly created session; `token` is the only copy of the raw cookie value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Generate a URL-safe session token from the system CSPRNG
pub fn generate_session_token() -> Result<String> {
    let rng = SystemRandom::new();
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.fill(&mut bytes)
        .map_err(|_| ForumError::Internal("Error generating session token".to_string()))?;
    Ok(general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Digest stored in `sessions.token_hash`
pub fn hash_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// Direct SQL access to the `sessions` table
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Issue a new session for `user_id` lasting `ttl`
    pub async fn create(&self, user_id: i64, ttl: Duration) -> Result<IssuedSession> {
        let token = generate_session_token()?;
        let now = Utc::now();
        let expires_at = expiry_after(now, ttl)?;

        sqlx::query(
            "INSERT INTO sessions (user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at.timestamp())
        .bind(now)
        .execute(&self.pool)
        .await?;

        debug!("Issued session for user {} until {}", user_id, expires_at);
        Ok(IssuedSession {
            token,
            user_id,
            expires_at,
        })
    }

    /// Revoke every session of `user_id` and issue a new one, atomically
    pub async fn replace_for_user(&self, user_id: i64, ttl: Duration) -> Result<IssuedSession> {
        let token = generate_session_token()?;
        let now = Utc::now();
        let expires_at = expiry_after(now, ttl)?;

        let mut tx = self.pool.begin().await?;

        let revoked = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query(
            "INSERT INTO sessions (user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(hash_token(&token))
        .bind(expires_at.timestamp())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if revoked > 0 {
            info!("🔁 Replaced {} earlier session(s) for user {}", revoked, user_id);
        }
        Ok(IssuedSession {
            token,
            user_id,
            expires_at,
        })
    }

    /// Resolve a cookie token to its user.
    ///
    /// Unknown tokens yield `None`. Expired sessions are deleted and also yield `None`.
    pub async fn resolve(&self, token: &str) -> Result<Option<User>> {
        if token.is_empty() {
            return Ok(None);
        }

        let row = sqlx::query(
            r#"
            SELECT s.id AS session_id, s.expires_at, u.id, u.username, u.email, u.password
            FROM sessions s
            JOIN users u ON s.user_id = u.id
            WHERE s.token_hash = ?
            "#,
        )
        .bind(hash_token(token))
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let expires_at: i64 = row.try_get("expires_at")?;
        if expires_at <= Utc::now().timestamp() {
            let session_id: i64 = row.try_get("session_id")?;
            sqlx::query("DELETE FROM sessions WHERE id = ?")
                .bind(session_id)
                .execute(&self.pool)
                .await?;
            debug!("Dropped expired session {}", session_id);
            return Ok(None);
        }

        Ok(Some(user_from_row(&row)?))
    }

    /// Delete the session for a raw token; returns whether one existed
    pub async fn revoke(&self, token: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Delete every expired session; returns the number removed
    pub async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// `now + ttl`, or an error when the result does not fit a timestamp
fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> Result<DateTime<Utc>> {
    chrono::Duration::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| ForumError::Internal("Session lifetime out of range".to_string()))
}
