// Likes and dislikes
//
// One row in `likes` per (user, target). The row carries `is_like`, so a
// user's reaction to a target is always exactly one of: none, like, dislike.

use serde::{Deserialize, Serialize};
use std::fmt;

/// What a reaction points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReactionTarget {
    Post(i64),
    Comment(i64),
}

impl ReactionTarget {
    pub fn id(&self) -> i64 {
        match self {
            ReactionTarget::Post(id) | ReactionTarget::Comment(id) => *id,
        }
    }

    /// Column of the `likes` table referencing this target
    pub(crate) fn likes_column(&self) -> &'static str {
        match self {
            ReactionTarget::Post(_) => "post_id",
            ReactionTarget::Comment(_) => "comment_id",
        }
    }

    /// Table holding the target rows
    pub(crate) fn table(&self) -> &'static str {
        match self {
            ReactionTarget::Post(_) => "posts",
            ReactionTarget::Comment(_) => "comments",
        }
    }
}

impl fmt::Display for ReactionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReactionTarget::Post(id) => write!(f, "post {}", id),
            ReactionTarget::Comment(id) => write!(f, "comment {}", id),
        }
    }
}

/// Like or dislike
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
}

impl Reaction {
    pub fn from_is_like(is_like: bool) -> Self {
        if is_like {
            Reaction::Like
        } else {
            Reaction::Dislike
        }
    }

    pub fn is_like(&self) -> bool {
        matches!(self, Reaction::Like)
    }

    /// Parse an `is_like` form value.
    ///
    /// Accepts the usual boolean spellings: `1`, `t`, `true` (any case) and
    /// `0`, `f`, `false`.
    pub fn parse_is_like(value: &str) -> Option<Self> {
        match value.trim() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(Reaction::Like),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(Reaction::Dislike),
            _ => None,
        }
    }
}

/// Aggregated reactions for one target, serialized as `{"likes": n, "dislikes": m}`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    pub likes: i64,
    pub dislikes: i64,
}
