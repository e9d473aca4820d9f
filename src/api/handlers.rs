// Home page, health check and shared rendering helpers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error};

use super::middleware::MaybeUser;
use super::ForumState;
use crate::models::{Comment, Post, User};
use crate::{ForumError, Result};

/// Query string of the home page
#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    pub category: Option<String>,
}

/// Home page - GET /
pub async fn home(
    State(state): State<ForumState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<HomeQuery>,
) -> Result<Html<String>> {
    let category = match query.category.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| ForumError::Validation("Invalid category ID".to_string()))?,
        ),
    };

    let selected = match category {
        Some(id) => Some(
            state
                .db
                .categories()
                .find(id)
                .await?
                .ok_or_else(|| ForumError::NotFound(format!("category {}", id)))?,
        ),
        None => None,
    };

    let posts = state
        .db
        .posts()
        .recent_posts(state.config.forum.recent_posts_limit, category)
        .await?;
    let categories = state.db.categories().all_categories().await?;

    debug!("Rendering home page with {} posts", posts.len());

    let data = json!({
        "user": user_json(user.as_ref()),
        "posts": posts.iter().map(post_json).collect::<Vec<_>>(),
        "categories": categories,
        "selected_category": category,
        "selected_category_name": selected.map(|c| c.name),
    });
    render(&state, "home.html", &data)
}

/// Health check endpoint - GET /health
pub async fn health_check(State(state): State<ForumState>) -> impl IntoResponse {
    let database = match sqlx::query("SELECT 1").execute(state.db.pool()).await {
        Ok(_) => "ok",
        Err(e) => {
            error!("Health check could not reach the database: {}", e);
            "unavailable"
        }
    };

    let status = if database == "ok" {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(json!({
            "status": if status == StatusCode::OK { "ok" } else { "degraded" },
            "service": "great-forums",
            "version": env!("CARGO_PKG_VERSION"),
            "database": database,
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Fallback for unknown routes
pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 page not found")
}

/// Render `template` with the configured renderer
pub(crate) fn render(state: &ForumState, template: &str, data: &Value) -> Result<Html<String>> {
    Ok(Html(state.renderer.render(template, data)?))
}

/// Render `template` with a non-200 status, used when a form is shown again with an error
pub(crate) fn render_with_status(
    state: &ForumState,
    status: StatusCode,
    template: &str,
    data: &Value,
) -> Result<Response> {
    Ok((status, render(state, template, data)?).into_response())
}

/// Status for an error that should be shown back on the form that caused it.
/// `None` means the error is not the user's to fix and should propagate.
pub(crate) fn form_error_status(err: &ForumError) -> Option<StatusCode> {
    match err {
        ForumError::Validation(_) => Some(StatusCode::BAD_REQUEST),
        ForumError::Unauthorized(_) => Some(StatusCode::UNAUTHORIZED),
        ForumError::Conflict(_) => Some(StatusCode::CONFLICT),
        _ => None,
    }
}

pub(crate) fn user_json(user: Option<&User>) -> Value {
    match user {
        Some(user) => json!({ "id": user.id, "username": user.username }),
        None => Value::Null,
    }
}

pub(crate) fn post_json(post: &Post) -> Value {
    let mut value = json!(post);
    value["formatted_created_at"] = json!(post.formatted_created_at());
    value["was_edited"] = json!(post.was_edited());
    value
}

pub(crate) fn comment_json(comment: &Comment) -> Value {
    let mut value = json!(comment);
    value["formatted_created_at"] = json!(comment.formatted_created_at());
    value
}
