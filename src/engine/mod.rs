// Forum Engine
// Data-access layer and account logic sitting between the HTTP handlers and SQLite

//! # Forum Engine Module
//!
//! Everything that touches the database lives here. Each submodule owns the
//! SQL for one table family and hands back the plain types from
//! [`crate::models`].
//!
//! ## Architecture Overview
//!
//! - **Models**: plain data (in `models/`)
//! - **Engine Layer**: direct SQL and account rules (this module)
//! - **API Layer**: axum handlers and rendering (in `api/`)
//!
//! ## Engine Components
//!
//! ### Database (`database` module)
//! - SQLite pool setup through sqlx
//! - Idempotent schema creation and category seeding
//! - Repository accessors
//!
//! ### Accounts (`users`, `sessions`, `auth` modules)
//! - User rows and uniqueness checks
//! - Session tokens: random, stored as digests, expiring
//! - PBKDF2 password hashing and the register/login/logout flows
//!
//! ### Content (`posts`, `comments`, `categories`, `reactions` modules)
//! - Transactional post creation, editing and deletion
//! - Comments with per-comment reaction totals
//! - One reaction per user per target, toggled in one write-first transaction
//!
//! ## Rust Learning Notes:
//!
//! ### Repositories Over a Shared Pool
//! `SqlitePool` is an `Arc` internally, so every repository simply holds its
//! own clone. Cloning a repository never opens a new connection.
//!
//! ### Transactions
//! `pool.begin()` returns a `Transaction` that rolls back when dropped. The
//! `?` operator therefore leaves the database untouched on any error; only an
//! explicit `commit()` makes the writes visible.
//!
//! SQLite's `BEGIN` is deferred: a transaction that reads first and writes
//! later cannot upgrade its lock while another connection writes, and fails
//! with "database is locked" without waiting. Every write transaction here
//! therefore opens with a write statement, which waits out the connection's
//! busy timeout instead.

/// Pool, schema and seeding
pub mod database;

/// User account rows
pub mod users;

/// Login sessions
pub mod sessions;

/// Password hashing and account flows
pub mod auth;

/// Posts and their category links
pub mod posts;

/// Comments on posts
pub mod comments;

/// Category listing and lookups
pub mod categories;

/// Likes and dislikes
pub mod reactions;

pub use auth::{AuthService, PasswordHasher, RegisterForm};
pub use categories::CategoryRepository;
pub use comments::CommentRepository;
pub use database::{Database, ForumStats};
pub use posts::{NewPost, PostRepository};
pub use reactions::ReactionRepository;
pub use sessions::{IssuedSession, SessionRepository};
pub use users::UserRepository;
