// Comments and like/dislike endpoints

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Json,
};

use super::forms::FormData;
use super::middleware::CurrentUser;
use super::ForumState;
use crate::models::{Reaction, ReactionCounts, ReactionTarget};
use crate::{ForumError, Result};

/// POST /comment
pub async fn add_comment(
    State(state): State<ForumState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<Response> {
    let post_id = form.id("post_id", "Invalid post ID")?;
    let content = form.value("content");

    state
        .db
        .comments()
        .add_comment(user.id, post_id, &content)
        .await?;

    Ok(Redirect::to(&format!("/post/{}", post_id)).into_response())
}

fn reaction_from_form(form: &FormData) -> Result<Reaction> {
    form.get("is_like")
        .and_then(Reaction::parse_is_like)
        .ok_or_else(|| ForumError::Validation("Invalid is_like value".to_string()))
}

/// POST /like-post
pub async fn like_post(
    State(state): State<ForumState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<Json<ReactionCounts>> {
    let post_id = form.id("post_id", "Invalid post ID")?;
    let reaction = reaction_from_form(&form)?;

    let counts = state
        .db
        .reactions()
        .react(user.id, ReactionTarget::Post(post_id), reaction)
        .await?;
    Ok(Json(counts))
}

/// POST /like-comment
pub async fn like_comment(
    State(state): State<ForumState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<Json<ReactionCounts>> {
    let comment_id = form.id("comment_id", "Invalid comment ID")?;
    let reaction = reaction_from_form(&form)?;

    let counts = state
        .db
        .reactions()
        .react(user.id, ReactionTarget::Comment(comment_id), reaction)
        .await?;
    Ok(Json(counts))
}
