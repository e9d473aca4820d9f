use chrono::{DateTime, Utc};
use serde::Serialize;

use super::post::DISPLAY_TIME_FORMAT;

/// A comment joined with its author and reaction totals
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub user_id: i64,
    pub content: String,
    pub author: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    pub dislikes: i64,
}

impl Comment {
    pub fn formatted_created_at(&self) -> String {
        self.created_at.format(DISPLAY_TIME_FORMAT).to_string()
    }
}
