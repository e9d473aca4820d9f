// HTTP layer of the forum
// Routes, extractors, form parsing and page rendering on top of axum

//! # API Module
//!
//! Every page is an axum handler that reads the request, calls one or two
//! repository methods and renders the result through a [`TemplateRenderer`].
//! The like endpoints answer with JSON so the page can update counts in place.
//!
//! ## Routes
//! ```text
//! GET       /                 home page, ?category=<id> filter
//! GET|POST  /register         account creation
//! GET|POST  /login            session creation
//! GET|POST  /logout           session removal
//! GET|POST  /create-post      new post form
//! GET       /post/:id         post with comments
//! GET|POST  /edit-post/:id    author-only edit form
//! POST      /delete-post/:id  author-only delete
//! POST      /comment          new comment
//! POST      /like-post        toggle like/dislike on a post (JSON)
//! POST      /like-comment     toggle like/dislike on a comment (JSON)
//! GET       /health           liveness check (JSON)
//! ```
//!
//! ## Rust Learning Notes:
//!
//! ### Errors as Responses
//! [`ForumError`] implements `IntoResponse`, so handlers return
//! `Result<impl IntoResponse>` and use `?` everywhere. The status code is
//! chosen from the error variant in one place below.
//!
//! ### Shared State
//! [`ForumState`] is cloned into every handler by axum. Everything inside is
//! either a pool handle or an `Arc`, so the clone is a handful of reference
//! count bumps.

pub mod auth;
pub mod comments;
pub mod forms;
pub mod handlers;
pub mod middleware;
pub mod posts;
pub mod views;

#[cfg(test)]
mod tests;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::error;

use crate::config::ForumConfig;
use crate::engine::{AuthService, Database};
use crate::ForumError;
use views::{BuiltinRenderer, TemplateRenderer};

/// State shared by all handlers
#[derive(Clone)]
pub struct ForumState {
    pub db: Database,
    pub auth: Arc<AuthService>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub config: Arc<ForumConfig>,
}

impl ForumState {
    pub fn new(db: Database, config: ForumConfig, renderer: Arc<dyn TemplateRenderer>) -> Self {
        let auth = AuthService::new(db.clone(), config.auth.clone());
        Self {
            db,
            auth: Arc::new(auth),
            renderer,
            config: Arc::new(config),
        }
    }

    /// State using the built-in HTML pages
    pub fn with_builtin_renderer(db: Database, config: ForumConfig) -> Self {
        Self::new(db, config, Arc::new(BuiltinRenderer::new()))
    }
}

/// Build the router with every forum route
///
/// Static files, tracing and CORS are layered on by the server.
pub fn create_router(state: ForumState) -> Router {
    Router::new()
        .route("/", get(handlers::home))
        .route("/health", get(handlers::health_check))
        // Accounts
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout).post(auth::logout))
        // Posts
        .route(
            "/create-post",
            get(posts::create_post_page).post(posts::create_post),
        )
        .route("/post/:id", get(posts::view_post))
        .route(
            "/edit-post/:id",
            get(posts::edit_post_page).post(posts::edit_post),
        )
        .route("/delete-post/:id", post(posts::delete_post))
        // Comments and reactions
        .route("/comment", post(comments::add_comment))
        .route("/like-post", post(comments::like_post))
        .route("/like-comment", post(comments::like_comment))
        .fallback(handlers::not_found)
        .with_state(state)
}

impl IntoResponse for ForumError {
    fn into_response(self) -> Response {
        let status = match &self {
            ForumError::Validation(_) => StatusCode::BAD_REQUEST,
            ForumError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ForumError::Forbidden(_) => StatusCode::FORBIDDEN,
            ForumError::NotFound(_) => StatusCode::NOT_FOUND,
            ForumError::Conflict(_) => StatusCode::CONFLICT,
            ForumError::Database(_)
            | ForumError::Config(_)
            | ForumError::Template(_)
            | ForumError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            error!("❌ Request failed: {}", self);
            return (status, "Internal Server Error").into_response();
        }

        (status, self.to_string()).into_response()
    }
}
