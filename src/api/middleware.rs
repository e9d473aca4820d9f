// Session cookie handling and user extractors

use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use tracing::debug;

use super::ForumState;
use crate::config::AuthConfig;
use crate::models::User;
use crate::ForumError;

/// Value of the cookie called `name`, if the request carries one
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value carrying a freshly issued session token
pub fn session_cookie(config: &AuthConfig, token: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        config.cookie_name,
        token,
        config.session_ttl().as_secs()
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that makes the browser drop the session cookie
pub fn expired_session_cookie(config: &AuthConfig) -> String {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        config.cookie_name
    );
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// The logged-in user, if any. Never rejects an anonymous request.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<ForumState> for MaybeUser {
    type Rejection = ForumError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ForumState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = cookie_value(&parts.headers, &state.config.auth.cookie_name) else {
            return Ok(MaybeUser(None));
        };

        let user = state.auth.current_user(&token).await?;
        if user.is_none() {
            debug!("Request carried an unknown or expired session cookie");
        }
        Ok(MaybeUser(user))
    }
}

/// The logged-in user; anonymous requests are rejected with 401
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<ForumState> for CurrentUser {
    type Rejection = ForumError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ForumState,
    ) -> Result<Self, Self::Rejection> {
        match MaybeUser::from_request_parts(parts, state).await? {
            MaybeUser(Some(user)) => Ok(CurrentUser(user)),
            MaybeUser(None) => Err(ForumError::Unauthorized(
                "You must be logged in".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_value() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_token=abc123; other=1"),
        );

        assert_eq!(cookie_value(&headers, "session_token"), Some("abc123".to_string()));
        assert_eq!(cookie_value(&headers, "theme"), Some("dark".to_string()));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn test_empty_cookie_is_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("session_token="));
        assert_eq!(cookie_value(&headers, "session_token"), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let mut config = AuthConfig::default();
        let cookie = session_cookie(&config, "tok");
        assert_eq!(
            cookie,
            "session_token=tok; Path=/; HttpOnly; SameSite=Lax; Max-Age=86400"
        );

        config.cookie_secure = true;
        assert!(session_cookie(&config, "tok").ends_with("; Secure"));
        assert!(expired_session_cookie(&config).contains("Max-Age=0"));
    }
}
