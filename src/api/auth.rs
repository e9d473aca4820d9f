// Registration, login and logout pages

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::forms::FormData;
use super::handlers::{form_error_status, render, render_with_status};
use super::middleware::{cookie_value, expired_session_cookie, session_cookie};
use super::ForumState;
use crate::engine::RegisterForm;
use crate::Result;

const REGISTERED_MESSAGE: &str = "Registration successful. Please log in.";

/// GET /register
pub async fn register_page(State(state): State<ForumState>) -> Result<Response> {
    let data = json!({ "error": null, "username": "", "email": "" });
    Ok(render(&state, "register.html", &data)?.into_response())
}

/// POST /register
pub async fn register(State(state): State<ForumState>, form: FormData) -> Result<Response> {
    let registration = RegisterForm {
        username: form.value("username"),
        email: form.value("email"),
        password: form.value("password"),
    };

    match state.auth.register(&registration).await {
        Ok(_) => Ok(Redirect::to("/login?registered=true").into_response()),
        Err(err) => {
            let Some(status) = form_error_status(&err) else {
                return Err(err);
            };
            let data = json!({
                "error": err.to_string(),
                "username": registration.username,
                "email": registration.email,
            });
            render_with_status(&state, status, "register.html", &data)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

/// GET /login
pub async fn login_page(
    State(state): State<ForumState>,
    Query(query): Query<LoginQuery>,
) -> Result<Response> {
    let message = match query.registered.as_deref() {
        Some("true") => Some(REGISTERED_MESSAGE),
        _ => None,
    };
    let data = json!({ "error": null, "message": message, "username": "" });
    Ok(render(&state, "login.html", &data)?.into_response())
}

/// POST /login
pub async fn login(State(state): State<ForumState>, form: FormData) -> Result<Response> {
    let username = form.value("username");
    let password = form.value("password");

    match state.auth.login(&username, &password).await {
        Ok(session) => {
            let cookie = session_cookie(&state.config.auth, &session.token);
            Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
        }
        Err(err) => {
            let Some(status) = form_error_status(&err) else {
                return Err(err);
            };
            let data = json!({
                "error": err.to_string(),
                "message": null,
                "username": username,
            });
            render_with_status(&state, status, "login.html", &data)
        }
    }
}

/// GET|POST /logout
///
/// Always clears the cookie, even when the session was already gone.
pub async fn logout(State(state): State<ForumState>, headers: HeaderMap) -> Result<Response> {
    if let Some(token) = cookie_value(&headers, &state.config.auth.cookie_name) {
        if !state.auth.logout(&token).await? {
            info!("Logout with a session that was already gone");
        }
    }

    let cookie = expired_session_cookie(&state.config.auth);
    Ok(([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response())
}
