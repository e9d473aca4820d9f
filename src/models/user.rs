// Accounts

use serde::Serialize;

/// A registered forum account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    /// Encoded PBKDF2 hash; skipped when serialized into page data
    #[serde(skip_serializing)]
    pub password_hash: String,
}
