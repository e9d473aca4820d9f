// User account rows

use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::debug;

use crate::models::User;
use crate::{ForumError, Result};

/// Direct SQL access to the `users` table
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user whose password has already been hashed
    pub async fn create_user(&self, username: &str, email: &str, password_hash: &str) -> Result<User> {
        let result = sqlx::query("INSERT INTO users (username, email, password) VALUES (?, ?, ?)")
            .bind(username)
            .bind(email)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    ForumError::Conflict("Username or email already exists".to_string())
                }
                other => ForumError::Database(other),
            })?;

        let id = result.last_insert_rowid();
        debug!("Created user {} ({})", id, username);

        Ok(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    pub async fn username_or_email_taken(&self, username: &str, email: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ? OR email = ?)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, username, email, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|row| user_from_row(&row)).transpose()
    }
}

/// Build a [`User`] from a row selecting `id, username, email, password`
pub(crate) fn user_from_row(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Database;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();

        let created = users.create_user("alice", "alice@example.com", "hash").await.unwrap();
        assert_eq!(created.username, "alice");

        let by_name = users.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name, created);

        assert_eq!(by_name.email, "alice@example.com");

        assert!(users.find_by_username("bob").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_is_conflict() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();

        users.create_user("alice", "alice@example.com", "hash").await.unwrap();

        let dup_name = users.create_user("alice", "other@example.com", "hash").await;
        assert!(matches!(dup_name, Err(ForumError::Conflict(_))));

        let dup_email = users.create_user("alicia", "alice@example.com", "hash").await;
        assert!(matches!(dup_email, Err(ForumError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_username_or_email_taken() {
        let db = Database::in_memory().await.unwrap();
        let users = db.users();
        users.create_user("alice", "alice@example.com", "hash").await.unwrap();

        assert!(users.username_or_email_taken("alice", "new@example.com").await.unwrap());
        assert!(users.username_or_email_taken("new", "alice@example.com").await.unwrap());
        assert!(!users.username_or_email_taken("new", "new@example.com").await.unwrap());
    }
}
