// Forum server assembly
// Wires configuration, database and router into a running HTTP server

//! # Server Module
//!
//! The server layer owns process-level concerns: opening the database,
//! running the schema migration, seeding default categories and binding the
//! listen socket. Everything request-specific lives in [`crate::api`].
//!
//! ```text
//! Browser
//!        ↓ HTTP
//! Server Layer (this module) ← tracing, CORS, static files
//!        ↓ axum router
//! API Layer ← handlers, extractors, rendering
//!        ↓ function calls
//! Engine Layer ← direct SQL against SQLite
//! ```
//!
//! ## Rust Learning Notes:
//!
//! This module demonstrates:
//! - The builder pattern for optional dependencies (database, renderer)
//! - Layering tower middleware onto an axum `Router`
//! - Graceful shutdown with `tokio::signal`

/// HTTP server and its builder
pub mod http;

/// Re-export server types
/// - ForumServer: a built server ready to run
/// - ForumServerBuilder: configures and builds a ForumServer
pub use http::{ForumServer, ForumServerBuilder};
