// Likes and dislikes
//
// Reacting runs in one transaction whose first statement is a write, so the
// connection holds SQLite's write lock before it reads anything and a
// concurrent reactor waits out the busy timeout instead of failing:
//   row, same value    -> delete (second click undoes the first)
//   row, other value   -> flip is_like
//   no row             -> insert

use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use tracing::debug;

use crate::models::{Reaction, ReactionCounts, ReactionTarget};
use crate::{ForumError, Result};

#[derive(Debug, Clone)]
pub struct ReactionRepository {
    pool: SqlitePool,
}

impl ReactionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply `reaction` from `user_id` to `target` and return the fresh totals
    pub async fn react(
        &self,
        user_id: i64,
        target: ReactionTarget,
        reaction: Reaction,
    ) -> Result<ReactionCounts> {
        let column = target.likes_column();
        let mut tx = self.pool.begin().await?;

        let delete_sql = format!(
            "DELETE FROM likes WHERE user_id = ? AND {} = ? AND is_like = ?",
            column
        );
        let removed = sqlx::query(&delete_sql)
            .bind(user_id)
            .bind(target.id())
            .bind(reaction.is_like())
            .execute(&mut *tx)
            .await?
            .rows_affected();

        if removed > 0 {
            debug!("User {} removed {:?} on {}", user_id, reaction, target);
        } else {
            let exists_sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = ?)", target.table());
            let exists = sqlx::query_scalar::<_, i64>(&exists_sql)
                .bind(target.id())
                .fetch_one(&mut *tx)
                .await?;
            if exists == 0 {
                return Err(ForumError::NotFound(target.to_string()));
            }

            // Conflicts on the partial unique index for this target kind
            let upsert_sql = format!(
                r#"
                INSERT INTO likes (user_id, {column}, is_like) VALUES (?, ?, ?)
                ON CONFLICT (user_id, {column}) WHERE {column} IS NOT NULL
                DO UPDATE SET is_like = excluded.is_like
                "#,
                column = column
            );
            sqlx::query(&upsert_sql)
                .bind(user_id)
                .bind(target.id())
                .bind(reaction.is_like())
                .execute(&mut *tx)
                .await?;
            debug!("User {} set {:?} on {}", user_id, reaction, target);
        }

        tx.commit().await?;
        self.counts(target).await
    }

    /// Likes and dislikes currently recorded for `target`
    pub async fn counts(&self, target: ReactionTarget) -> Result<ReactionCounts> {
        let sql = format!(
            r#"
            SELECT COALESCE(SUM(CASE WHEN is_like = 1 THEN 1 ELSE 0 END), 0) AS likes,
                   COALESCE(SUM(CASE WHEN is_like = 0 THEN 1 ELSE 0 END), 0) AS dislikes
            FROM likes
            WHERE {} = ?
            "#,
            target.likes_column()
        );
        let row = sqlx::query(&sql)
            .bind(target.id())
            .fetch_one(&self.pool)
            .await?;

        Ok(ReactionCounts {
            likes: row.try_get("likes")?,
            dislikes: row.try_get("dislikes")?,
        })
    }

    /// The reaction `user_id` currently has on `target`, if any
    pub async fn user_reaction(&self, user_id: i64, target: ReactionTarget) -> Result<Option<Reaction>> {
        let sql = format!(
            "SELECT is_like FROM likes WHERE user_id = ? AND {} = ?",
            target.likes_column()
        );
        let is_like = sqlx::query_scalar::<_, bool>(&sql)
            .bind(user_id)
            .bind(target.id())
            .fetch_optional(&self.pool)
            .await?;
        Ok(is_like.map(Reaction::from_is_like))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::engine::{Database, NewPost};

    async fn setup() -> (Database, i64, i64, i64) {
        let db = Database::in_memory().await.unwrap();
        let alice = db.users().create_user("alice", "a@example.com", "h").await.unwrap().id;
        let bob = db.users().create_user("bob", "b@example.com", "h").await.unwrap().id;
        let post = db
            .posts()
            .create_post(alice, &NewPost::new("Title", "Body", vec![]))
            .await
            .unwrap();
        (db, alice, bob, post)
    }

    fn counts(likes: i64, dislikes: i64) -> ReactionCounts {
        ReactionCounts { likes, dislikes }
    }

    #[tokio::test]
    async fn test_like_switch_and_toggle_off() {
        let (db, alice, bob, post) = setup().await;
        let reactions = db.reactions();
        let target = ReactionTarget::Post(post);

        assert_eq!(reactions.react(alice, target, Reaction::Like).await.unwrap(), counts(1, 0));
        assert_eq!(reactions.react(bob, target, Reaction::Like).await.unwrap(), counts(2, 0));
        assert_eq!(reactions.react(bob, target, Reaction::Dislike).await.unwrap(), counts(1, 1));
        assert_eq!(
            reactions.user_reaction(bob, target).await.unwrap(),
            Some(Reaction::Dislike)
        );

        assert_eq!(reactions.react(bob, target, Reaction::Dislike).await.unwrap(), counts(1, 0));
        assert_eq!(reactions.user_reaction(bob, target).await.unwrap(), None);

        let post = db.posts().get_post(post).await.unwrap().unwrap();
        assert_eq!((post.likes, post.dislikes), (1, 0));
    }

    #[tokio::test]
    async fn test_post_and_comment_reactions_are_separate() {
        let (db, alice, _bob, post) = setup().await;
        let reactions = db.reactions();
        let comment = db.comments().add_comment(alice, post, "hi").await.unwrap();

        reactions
            .react(alice, ReactionTarget::Comment(comment), Reaction::Dislike)
            .await
            .unwrap();

        assert_eq!(reactions.counts(ReactionTarget::Post(post)).await.unwrap(), counts(0, 0));
        assert_eq!(
            reactions.counts(ReactionTarget::Comment(comment)).await.unwrap(),
            counts(0, 1)
        );
    }

    #[tokio::test]
    async fn test_missing_target_is_not_found() {
        let (db, alice, _bob, post) = setup().await;
        let reactions = db.reactions();

        let result = reactions
            .react(alice, ReactionTarget::Post(post + 10), Reaction::Like)
            .await;
        assert!(matches!(result, Err(ForumError::NotFound(_))));

        let result = reactions
            .react(alice, ReactionTarget::Comment(42), Reaction::Like)
            .await;
        assert!(matches!(result, Err(ForumError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_reactions_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            url: format!("sqlite://{}", dir.path().join("forum.db").display()),
            max_connections: 5,
            ..DatabaseConfig::default()
        };
        let db = Database::connect(&config).await.unwrap();
        db.migrate().await.unwrap();

        let author = db.users().create_user("author", "author@example.com", "h").await.unwrap().id;
        let post = db
            .posts()
            .create_post(author, &NewPost::new("Busy", "Everyone likes this", vec![]))
            .await
            .unwrap();
        let target = ReactionTarget::Post(post);

        let mut users = Vec::new();
        for i in 0..20 {
            let user = db
                .users()
                .create_user(&format!("user{}", i), &format!("user{}@example.com", i), "h")
                .await
                .unwrap();
            users.push(user.id);
        }

        let handles: Vec<_> = users
            .into_iter()
            .map(|user| {
                let reactions = db.reactions();
                tokio::spawn(async move { reactions.react(user, target, Reaction::Like).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(db.reactions().counts(target).await.unwrap(), counts(20, 0));
        db.close().await;
    }
}
