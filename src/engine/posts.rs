// Posts and their category links
//
// Creating, editing and deleting a post each touch several tables. All three
// run inside one transaction so a failure never leaves half a post behind.
// The first statement of each transaction is a write: SQLite then takes the
// write lock up front and a concurrent writer waits out the busy timeout
// instead of failing to upgrade a read lock.

use chrono::Utc;
use serde::Deserialize;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info};

use super::categories::{self, CategoryRepository};
use crate::models::Post;
use crate::{ForumError, Result};

/// Columns shared by every post query: the post, its author and reaction totals
const POST_SELECT: &str = r#"
    SELECT p.id, p.user_id, p.title, p.content, u.username AS author,
           p.created_at, p.updated_at,
           COALESCE(SUM(CASE WHEN l.is_like = 1 THEN 1 ELSE 0 END), 0) AS likes,
           COALESCE(SUM(CASE WHEN l.is_like = 0 THEN 1 ELSE 0 END), 0) AS dislikes
    FROM posts p
    JOIN users u ON p.user_id = u.id
    LEFT JOIN likes l ON l.post_id = p.id
"#;

/// Title, body and category ids of a post being created or edited
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub category_ids: Vec<i64>,
}

impl NewPost {
    pub fn new(title: impl Into<String>, content: impl Into<String>, category_ids: Vec<i64>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            category_ids,
        }
    }

    /// Trimmed title/content and de-duplicated category ids
    fn normalized(&self) -> Result<(String, String, Vec<i64>)> {
        let title = self.title.trim();
        let content = self.content.trim();
        if title.is_empty() || content.is_empty() {
            return Err(ForumError::Validation(
                "Title and content are required".to_string(),
            ));
        }

        let mut ids = self.category_ids.clone();
        ids.sort_unstable();
        ids.dedup();

        Ok((title.to_string(), content.to_string(), ids))
    }
}

/// Direct SQL access to `posts` and `post_categories`
#[derive(Debug, Clone)]
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    /// Insert a post and its category links in one transaction; returns the new id
    pub async fn create_post(&self, user_id: i64, post: &NewPost) -> Result<i64> {
        let (title, content, category_ids) = post.normalized()?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let post_id = sqlx::query(
            "INSERT INTO posts (user_id, title, content, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(&title)
        .bind(&content)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        link_categories(&mut tx, post_id, &category_ids).await?;

        tx.commit().await?;

        info!("📝 User {} created post {}", user_id, post_id);
        Ok(post_id)
    }

    /// A post with author, reaction totals and category names
    pub async fn get_post(&self, post_id: i64) -> Result<Option<Post>> {
        let sql = format!("{} WHERE p.id = ? GROUP BY p.id", POST_SELECT);
        let row = sqlx::query(&sql)
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let categories = self.categories().categories_for_post(post_id).await?;
                Ok(Some(post_from_row(&row, categories)?))
            }
            None => Ok(None),
        }
    }

    /// Newest posts first, optionally only those tagged with `category_id`
    pub async fn recent_posts(&self, limit: u32, category_id: Option<i64>) -> Result<Vec<Post>> {
        let sql = format!(
            r#"{}
            WHERE (? IS NULL OR EXISTS (
                SELECT 1 FROM post_categories pc
                WHERE pc.post_id = p.id AND pc.category_id = ?
            ))
            GROUP BY p.id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT ?"#,
            POST_SELECT
        );

        let rows = sqlx::query(&sql)
            .bind(category_id)
            .bind(category_id)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let categories = self.categories();
        let mut posts = Vec::with_capacity(rows.len());
        for row in &rows {
            let post_id: i64 = row.try_get("id")?;
            let names = categories.categories_for_post(post_id).await?;
            posts.push(post_from_row(row, names)?);
        }

        debug!("Loaded {} recent posts (category filter: {:?})", posts.len(), category_id);
        Ok(posts)
    }

    /// Author id of a post, `None` when the post does not exist
    pub async fn author_of(&self, post_id: i64) -> Result<Option<i64>> {
        let author = sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    /// Replace title, content and categories of a post in one transaction.
    ///
    /// `user_id` must be the post's author.
    pub async fn update_post(&self, user_id: i64, post_id: i64, post: &NewPost) -> Result<()> {
        let (title, content, category_ids) = post.normalized()?;

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE posts SET title = ?, content = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(&title)
        .bind(&content)
        .bind(Utc::now())
        .bind(post_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();
        if updated == 0 {
            return Err(not_author(&mut tx, post_id, "edit").await);
        }

        sqlx::query("DELETE FROM post_categories WHERE post_id = ?")
            .bind(post_id)
            .execute(&mut *tx)
            .await?;
        link_categories(&mut tx, post_id, &category_ids).await?;

        tx.commit().await?;

        info!("✏️  User {} updated post {}", user_id, post_id);
        Ok(())
    }

    /// Delete a post together with its category links, comments and every
    /// reaction on the post or its comments. Returns whether the post existed.
    pub async fn delete_post(&self, post_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let deleted = delete_in_tx(&mut tx, post_id).await?;
        tx.commit().await?;

        if deleted {
            info!("🗑️  Post {} deleted", post_id);
        }
        Ok(deleted)
    }

    /// Delete a post on behalf of `user_id`, who must be its author
    pub async fn delete_post_by_author(&self, user_id: i64, post_id: i64) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        // Touches only the author's row; doubles as the transaction's opening write
        let claimed = sqlx::query("UPDATE posts SET updated_at = updated_at WHERE id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if claimed == 0 {
            return Err(not_author(&mut tx, post_id, "delete").await);
        }

        delete_in_tx(&mut tx, post_id).await?;
        tx.commit().await?;

        info!("🗑️  User {} deleted post {}", user_id, post_id);
        Ok(())
    }
}

fn post_from_row(row: &SqliteRow, categories: Vec<String>) -> Result<Post> {
    Ok(Post {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author: row.try_get("author")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        likes: row.try_get("likes")?,
        dislikes: row.try_get("dislikes")?,
        categories,
    })
}

/// Insert `post_categories` rows; every id must name an existing category
async fn link_categories(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: i64,
    category_ids: &[i64],
) -> Result<()> {
    let known = categories::existing_ids(&mut **tx, category_ids).await?;
    if known.len() != category_ids.len() {
        return Err(ForumError::Validation("Invalid category ID".to_string()));
    }

    for category_id in &known {
        sqlx::query("INSERT INTO post_categories (post_id, category_id) VALUES (?, ?)")
            .bind(post_id)
            .bind(category_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

/// Why an author-only write matched no row: the post is missing or belongs to someone else
async fn not_author(tx: &mut Transaction<'_, Sqlite>, post_id: i64, action: &str) -> ForumError {
    let author = sqlx::query_scalar::<_, i64>("SELECT user_id FROM posts WHERE id = ?")
        .bind(post_id)
        .fetch_optional(&mut **tx)
        .await;

    match author {
        Ok(None) => ForumError::NotFound(format!("post {}", post_id)),
        Ok(Some(_)) => ForumError::Forbidden(format!(
            "You are not authorized to {} this post",
            action
        )),
        Err(e) => ForumError::Database(e),
    }
}

async fn delete_in_tx(tx: &mut Transaction<'_, Sqlite>, post_id: i64) -> Result<bool> {
    sqlx::query("DELETE FROM post_categories WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM likes WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM likes WHERE comment_id IN (SELECT id FROM comments WHERE post_id = ?)")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(post_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    Ok(deleted > 0)
}
