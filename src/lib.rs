// Great Forums - Rust Edition
// A server-rendered discussion forum backed by a single SQLite database

//! # Great Forums Library
//!
//! This is the library crate behind the `server` and `admin` binaries. It
//! defines the domain models, the data-access layer and the HTTP glue that
//! ties them together.
//!
//! ## Core Components
//!
//! ### Domain Models
//! - [`User`]: registered accounts
//! - [`Post`] / [`Comment`] / [`Category`]: the discussion content
//! - [`ReactionTarget`] / [`Reaction`] / [`ReactionCounts`]: likes and dislikes
//!
//! ### Engine
//! Direct SQL against SQLite through `sqlx`, one repository per table family:
//! - [`Database`]: pool, schema migration and seeding
//! - [`AuthService`]: registration, login, logout, password hashing
//! - `posts`, `comments`, `categories`, `reactions`, `sessions`, `users`
//!
//! Multi-table writes (creating, editing and deleting a post, toggling a
//! reaction) each run inside a single database transaction.
//!
//! ### API
//! Axum handlers for the HTML pages and the two JSON like endpoints, plus the
//! session cookie extractors and the [`TemplateRenderer`] seam.
//!
//! ### Server
//! [`ForumServerBuilder`] wires configuration, database and router together.
//!
//! ## Request Flow
//! ```text
//! HTTP request
//!   ↓ axum router
//! handler (api module)
//!   ↓ repository call
//! direct SQL (engine module)
//!   ↓ rows → models
//! TemplateRenderer → HTML response
//! ```

// Core domain models
pub mod models;

// Data-access layer and account logic
pub mod engine;

// HTTP handlers, extractors and rendering
pub mod api;

// Server assembly
pub mod server;

// Layered configuration
pub mod config;

// Re-export core domain types for easy access
pub use models::{
    Category,       // Topic used to tag posts
    Comment,        // Reply attached to a post
    Post,           // Forum post with aggregated reaction counts
    Reaction,       // Like or dislike
    ReactionCounts, // Aggregated likes/dislikes of one target
    ReactionTarget, // A post or a comment
    User,           // Registered account
};

// Re-export engine types for convenience
pub use engine::{
    auth::{AuthService, PasswordHasher, RegisterForm},
    database::{Database, ForumStats},
    sessions::IssuedSession,
};

pub use api::{
    create_router,
    views::{BuiltinRenderer, TemplateRenderer},
    ForumState,
};

pub use config::ForumConfig;
pub use server::{ForumServer, ForumServerBuilder};

use thiserror::Error;

/// Errors produced by forum operations
///
/// Every variant maps onto one HTTP status in the API layer, so handlers can
/// propagate with `?` and still answer with the right code.
#[derive(Error, Debug)]
pub enum ForumError {
    /// Input rejected before touching the database
    #[error("{0}")]
    Validation(String),

    /// No valid session for an operation that needs one
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not allowed to touch this resource
    #[error("{0}")]
    Forbidden(String),

    /// Referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint hit (duplicate username or email)
    #[error("{0}")]
    Conflict(String),

    /// Any failure reported by sqlx
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Configuration could not be loaded or deserialized
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// Rendering failed or the template is unknown
    #[error("Template error: {0}")]
    Template(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for ForumError {
    fn from(err: std::io::Error) -> Self {
        ForumError::Internal(err.to_string())
    }
}

/// Type alias for Results that use the forum error type
pub type Result<T> = std::result::Result<T, ForumError>;
