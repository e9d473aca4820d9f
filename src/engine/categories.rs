// Category listing and lookups

use sqlx::sqlite::SqlitePool;
use sqlx::{Executor, Row, Sqlite};

use crate::models::Category;
use crate::{ForumError, Result};

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn all_categories(&self) -> Result<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        rows.iter()
            .map(|row| {
                Ok(Category {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    pub async fn find(&self, id: i64) -> Result<Option<Category>> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Category {
                id: row.try_get("id")?,
                name: row.try_get("name")?,
            })),
            None => Ok(None),
        }
    }

    /// Names of the categories a post is tagged with, alphabetically
    pub async fn categories_for_post(&self, post_id: i64) -> Result<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>(
            r#"
            SELECT c.name
            FROM categories c
            JOIN post_categories pc ON c.id = pc.category_id
            WHERE pc.post_id = ?
            ORDER BY c.name
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    /// Ids of the categories a post is tagged with
    pub async fn category_ids_for_post(&self, post_id: i64) -> Result<Vec<i64>> {
        let ids = sqlx::query_scalar::<_, i64>(
            "SELECT category_id FROM post_categories WHERE post_id = ? ORDER BY category_id",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    pub async fn create(&self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ForumError::Validation("Category name is required".to_string()));
        }

        let result = sqlx::query("INSERT INTO categories (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    ForumError::Conflict(format!("Category '{}' already exists", name))
                }
                other => ForumError::Database(other),
            })?;

        Ok(Category {
            id: result.last_insert_rowid(),
            name: name.to_string(),
        })
    }
}

/// The subset of `ids` naming existing categories, ascending and without duplicates.
///
/// Takes any executor so post writes can check inside their own transaction.
pub async fn existing_ids<'e, E>(executor: E, ids: &[i64]) -> Result<Vec<i64>>
where
    E: Executor<'e, Database = Sqlite>,
{
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!(
        "SELECT id FROM categories WHERE id IN ({}) ORDER BY id",
        placeholders
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql);
    for id in ids {
        query = query.bind(*id);
    }
    Ok(query.fetch_all(executor).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Database;

    #[tokio::test]
    async fn test_create_and_list() {
        let db = Database::in_memory().await.unwrap();
        let categories = db.categories();

        let general = categories.create("General").await.unwrap();
        categories.create("Rust").await.unwrap();

        let all = categories.all_categories().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], general);

        assert_eq!(categories.find(general.id).await.unwrap(), Some(general));
        assert!(categories.find(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_existing_ids() {
        let db = Database::in_memory().await.unwrap();
        let categories = db.categories();
        let a = categories.create("A").await.unwrap().id;
        let b = categories.create("B").await.unwrap().id;

        assert_eq!(
            existing_ids(db.pool(), &[b, 999, a, b]).await.unwrap(),
            vec![a, b]
        );
        assert!(existing_ids(db.pool(), &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_duplicates_and_blanks() {
        let db = Database::in_memory().await.unwrap();
        let categories = db.categories();

        categories.create("General").await.unwrap();
        assert!(matches!(
            categories.create("General").await,
            Err(ForumError::Conflict(_))
        ));
        assert!(matches!(
            categories.create("   ").await,
            Err(ForumError::Validation(_))
        ));
    }
}
