// Forum posts

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Display format for post and comment timestamps, e.g. "January 2, 2006 at 3:04 PM"
pub const DISPLAY_TIME_FORMAT: &str = "%B %-d, %Y at %-I:%M %p";

/// A post joined with its author, reaction totals and category names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    /// Author's username
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub likes: i64,
    pub dislikes: i64,
    pub categories: Vec<String>,
}

impl Post {
    pub fn formatted_created_at(&self) -> String {
        self.created_at.format(DISPLAY_TIME_FORMAT).to_string()
    }

    pub fn was_edited(&self) -> bool {
        self.updated_at > self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_formatted_created_at() {
        let created = Utc.with_ymd_and_hms(2006, 1, 2, 15, 4, 5).unwrap();
        let post = Post {
            id: 1,
            user_id: 1,
            title: "Hello".to_string(),
            content: "World".to_string(),
            author: "alice".to_string(),
            created_at: created,
            updated_at: created,
            likes: 0,
            dislikes: 0,
            categories: vec![],
        };

        assert_eq!(post.formatted_created_at(), "January 2, 2006 at 3:04 PM");
        assert!(!post.was_edited());
    }
}
