// Core domain models for the forum
// Plain data carried between the SQL layer and the HTML layer

//! # Domain Models Module
//!
//! Row and value types shared by every layer. None of these types talk to the
//! database themselves; the repositories in [`crate::engine`] build them from
//! query results.
//!
//! ## Reactions
//!
//! Likes and dislikes live in one `likes` table whose rows point at either a
//! post or a comment. [`ReactionTarget`] names which one, so the counting and
//! toggling code is written once for both.

// Registered accounts
pub mod user;

// Posts and their category tags
pub mod post;

// Comments on posts
pub mod comment;

// Topics used to tag posts
pub mod category;

// Likes/dislikes on posts and comments
pub mod reaction;

/// Re-export account types
/// - User: a registered account (password hash included, never rendered)
pub use user::User;

/// Re-export post types
pub use post::Post;

/// Re-export comment types
pub use comment::Comment;

/// Re-export category types
pub use category::Category;

/// Re-export reaction types
/// - ReactionTarget: post or comment being reacted to
/// - Reaction: like or dislike
/// - ReactionCounts: aggregated totals for one target
pub use reaction::{Reaction, ReactionCounts, ReactionTarget};
