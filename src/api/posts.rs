// Post pages: create, view, edit, delete

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde_json::{json, Value};

use super::forms::FormData;
use super::handlers::{comment_json, post_json, render, render_with_status, user_json};
use super::middleware::{CurrentUser, MaybeUser};
use super::ForumState;
use crate::engine::NewPost;
use crate::models::{Category, ReactionTarget};
use crate::{ForumError, Result};

/// Parse the `:id` path segment
fn parse_post_id(raw: &str) -> Result<i64> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ForumError::Validation("Invalid post ID".to_string()))
}

/// Read title, content and the repeated `categories` field
fn post_from_form(form: &FormData) -> Result<NewPost> {
    let category_ids = form.ids("categories", "Invalid category ID")?;
    Ok(NewPost::new(
        form.value("title"),
        form.value("content"),
        category_ids,
    ))
}

/// Categories for a checkbox list, marking the ones already chosen
fn category_options(categories: &[Category], selected: &[i64]) -> Vec<Value> {
    categories
        .iter()
        .map(|category| {
            json!({
                "id": category.id,
                "name": category.name,
                "selected": selected.contains(&category.id),
            })
        })
        .collect()
}

/// GET /create-post
pub async fn create_post_page(
    State(state): State<ForumState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response> {
    let Some(user) = user else {
        return Ok(Redirect::to("/login").into_response());
    };

    let categories = state.db.categories().all_categories().await?;
    let data = json!({
        "user": user_json(Some(&user)),
        "categories": category_options(&categories, &[]),
        "title": "",
        "content": "",
        "error": null,
    });
    Ok(render(&state, "create-post.html", &data)?.into_response())
}

/// POST /create-post
pub async fn create_post(
    State(state): State<ForumState>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<Response> {
    let result = match post_from_form(&form) {
        Ok(post) => state.db.posts().create_post(user.id, &post).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(post_id) => Ok(Redirect::to(&format!("/post/{}", post_id)).into_response()),
        Err(ForumError::Validation(message)) => {
            let categories = state.db.categories().all_categories().await?;
            let selected = form.ids("categories", "").unwrap_or_default();
            let data = json!({
                "user": user_json(Some(&user)),
                "categories": category_options(&categories, &selected),
                "title": form.value("title"),
                "content": form.value("content"),
                "error": message,
            });
            render_with_status(&state, StatusCode::BAD_REQUEST, "create-post.html", &data)
        }
        Err(err) => Err(err),
    }
}

/// GET /post/:id
pub async fn view_post(
    State(state): State<ForumState>,
    Path(raw_id): Path<String>,
    MaybeUser(user): MaybeUser,
) -> Result<Response> {
    let post_id = parse_post_id(&raw_id)?;

    let post = state
        .db
        .posts()
        .get_post(post_id)
        .await?
        .ok_or_else(|| ForumError::NotFound(format!("post {}", post_id)))?;
    let comments = state.db.comments().comments_for_post(post_id).await?;

    let mut post_data = post_json(&post);
    let mut comment_data: Vec<Value> = comments.iter().map(comment_json).collect();

    // Marks the buttons the viewer has already pressed
    if let Some(viewer) = &user {
        let reactions = state.db.reactions();
        post_data["user_reaction"] = json!(
            reactions
                .user_reaction(viewer.id, ReactionTarget::Post(post_id))
                .await?
        );
        for (comment, data) in comments.iter().zip(comment_data.iter_mut()) {
            data["user_reaction"] = json!(
                reactions
                    .user_reaction(viewer.id, ReactionTarget::Comment(comment.id))
                    .await?
            );
        }
    }

    let is_author = user.as_ref().map_or(false, |u| u.id == post.user_id);
    let data = json!({
        "user": user_json(user.as_ref()),
        "post": post_data,
        "comments": comment_data,
        "is_author": is_author,
    });
    Ok(render(&state, "view-post.html", &data)?.into_response())
}

/// GET /edit-post/:id
pub async fn edit_post_page(
    State(state): State<ForumState>,
    Path(raw_id): Path<String>,
    MaybeUser(user): MaybeUser,
) -> Result<Response> {
    let post_id = parse_post_id(&raw_id)?;
    let Some(user) = user else {
        return Ok(Redirect::to("/login").into_response());
    };

    let post = state
        .db
        .posts()
        .get_post(post_id)
        .await?
        .ok_or_else(|| ForumError::NotFound(format!("post {}", post_id)))?;
    if post.user_id != user.id {
        return Err(ForumError::Forbidden(
            "You are not authorized to edit this post".to_string(),
        ));
    }

    let categories = state.db.categories();
    let all = categories.all_categories().await?;
    let selected = categories.category_ids_for_post(post_id).await?;

    let data = json!({
        "user": user_json(Some(&user)),
        "post_id": post_id,
        "title": post.title,
        "content": post.content,
        "categories": category_options(&all, &selected),
        "error": null,
    });
    Ok(render(&state, "edit-post.html", &data)?.into_response())
}

/// POST /edit-post/:id
pub async fn edit_post(
    State(state): State<ForumState>,
    Path(raw_id): Path<String>,
    CurrentUser(user): CurrentUser,
    form: FormData,
) -> Result<Response> {
    let post_id = parse_post_id(&raw_id)?;

    let result = match post_from_form(&form) {
        Ok(post) => {
            state
                .db
                .posts()
                .update_post(user.id, post_id, &post)
                .await
        }
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => Ok(Redirect::to(&format!("/post/{}", post_id)).into_response()),
        Err(ForumError::Validation(message)) => {
            // Only the author gets to see the form again
            match state.db.posts().author_of(post_id).await? {
                None => return Err(ForumError::NotFound(format!("post {}", post_id))),
                Some(author) if author != user.id => {
                    return Err(ForumError::Forbidden(
                        "You are not authorized to edit this post".to_string(),
                    ))
                }
                Some(_) => {}
            }

            let all = state.db.categories().all_categories().await?;
            let selected = form.ids("categories", "").unwrap_or_default();
            let data = json!({
                "user": user_json(Some(&user)),
                "post_id": post_id,
                "title": form.value("title"),
                "content": form.value("content"),
                "categories": category_options(&all, &selected),
                "error": message,
            });
            render_with_status(&state, StatusCode::BAD_REQUEST, "edit-post.html", &data)
        }
        Err(err) => Err(err),
    }
}

/// POST /delete-post/:id
pub async fn delete_post(
    State(state): State<ForumState>,
    Path(raw_id): Path<String>,
    CurrentUser(user): CurrentUser,
) -> Result<Response> {
    let post_id = parse_post_id(&raw_id)?;
    state.db.posts().delete_post_by_author(user.id, post_id).await?;
    Ok(Redirect::to("/").into_response())
}
