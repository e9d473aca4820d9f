// Comments on posts

use chrono::Utc;
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::info;

use crate::models::Comment;
use crate::{ForumError, Result};

#[derive(Debug, Clone)]
pub struct CommentRepository {
    pool: SqlitePool,
}

impl CommentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a comment to an existing post; returns the comment id.
    ///
    /// The `comments.post_id` foreign key is the existence check, so a post
    /// deleted concurrently still yields `NotFound`.
    pub async fn add_comment(&self, user_id: i64, post_id: i64, content: &str) -> Result<i64> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ForumError::Validation(
                "Comment content cannot be empty".to_string(),
            ));
        }

        let comment_id = sqlx::query(
            "INSERT INTO comments (user_id, post_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(post_id)
        .bind(content)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                ForumError::NotFound(format!("post {}", post_id))
            }
            other => ForumError::Database(other),
        })?
        .last_insert_rowid();

        info!("💬 User {} commented on post {}", user_id, post_id);
        Ok(comment_id)
    }

    /// Comments of a post, oldest first, with author and reaction totals
    pub async fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.post_id, c.user_id, c.content, u.username AS author, c.created_at,
                   COALESCE(SUM(CASE WHEN l.is_like = 1 THEN 1 ELSE 0 END), 0) AS likes,
                   COALESCE(SUM(CASE WHEN l.is_like = 0 THEN 1 ELSE 0 END), 0) AS dislikes
            FROM comments c
            JOIN users u ON c.user_id = u.id
            LEFT JOIN likes l ON l.comment_id = c.id
            WHERE c.post_id = ?
            GROUP BY c.id
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Comment {
                    id: row.try_get("id")?,
                    post_id: row.try_get("post_id")?,
                    user_id: row.try_get("user_id")?,
                    content: row.try_get("content")?,
                    author: row.try_get("author")?,
                    created_at: row.try_get("created_at")?,
                    likes: row.try_get("likes")?,
                    dislikes: row.try_get("dislikes")?,
                })
            })
            .collect()
    }
}
