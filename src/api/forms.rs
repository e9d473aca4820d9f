// URL-encoded form bodies
//
// `axum::Form` deserializes into a struct and cannot express a field that
// repeats (`categories=1&categories=3`), so form bodies are kept as ordered
// key/value pairs instead.

use async_trait::async_trait;
use axum::{
    body::Bytes,
    extract::FromRequest,
    http::Request,
    response::{IntoResponse, Response},
};

use crate::{ForumError, Result};

/// Decoded `application/x-www-form-urlencoded` body
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn parse(body: &[u8]) -> Self {
        let pairs = url::form_urlencoded::parse(body)
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect();
        Self { pairs }
    }

    /// First value submitted for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// First value for `name`, or the empty string when absent
    pub fn value(&self, name: &str) -> String {
        self.get(name).unwrap_or_default().to_string()
    }

    /// Every value submitted for `name`, in order
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Required numeric id field
    pub fn id(&self, name: &str, message: &str) -> Result<i64> {
        self.get(name)
            .and_then(|value| value.trim().parse::<i64>().ok())
            .ok_or_else(|| ForumError::Validation(message.to_string()))
    }

    /// Every value of a repeated numeric field; blank entries are skipped
    pub fn ids(&self, name: &str, message: &str) -> Result<Vec<i64>> {
        self.all(name)
            .into_iter()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| {
                value
                    .parse::<i64>()
                    .map_err(|_| ForumError::Validation(message.to_string()))
            })
            .collect()
    }
}

#[async_trait]
impl<S, B> FromRequest<S, B> for FormData
where
    Bytes: FromRequest<S, B>,
    B: Send + 'static,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request<B>, state: &S) -> std::result::Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(FormData::parse(&body))
    }
}
