// Password hashing and account flows
// Register, login and logout on top of the users and sessions repositories

//! # Authentication
//!
//! Passwords are stored as PBKDF2-HMAC-SHA256 digests with a per-user random
//! salt, encoded as a self-describing string:
//!
//! ```text
//! pbkdf2-sha256$<iterations>$<salt, base64>$<digest, base64>
//! ```
//!
//! Because the iteration count travels with each hash, raising
//! `auth.pbkdf2_iterations` only affects new passwords; existing ones keep
//! verifying.
//!
//! ## Rust Learning Notes:
//!
//! ### Constant-Time Comparison
//! `ring::pbkdf2::verify` recomputes the digest and compares it without
//! short-circuiting, so response time does not leak how many leading bytes of
//! a guess were right.
//!
//! ### Uniform Login Errors
//! An unknown username and a wrong password both produce the same
//! `Unauthorized("Invalid username or password")`. An unknown username is
//! still checked against a placeholder hash, so both failures take one
//! PBKDF2 run and the login form cannot be used to discover which usernames
//! exist.

use base64::{engine::general_purpose, Engine as _};
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use serde::Deserialize;
use std::num::NonZeroU32;
use tracing::{info, warn};

use super::database::Database;
use super::sessions::IssuedSession;
use crate::config::AuthConfig;
use crate::models::User;
use crate::{ForumError, Result};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = ring::digest::SHA256_OUTPUT_LEN;

/// Salted PBKDF2 password hashing
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    iterations: NonZeroU32,
    rng: SystemRandom,
}

impl PasswordHasher {
    /// `iterations` below 1 are raised to 1
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: NonZeroU32::new(iterations).unwrap_or(NonZeroU32::MIN),
            rng: SystemRandom::new(),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }

    /// Hash `password` with a fresh random salt
    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        self.rng
            .fill(&mut salt)
            .map_err(|_| ForumError::Internal("Error generating password salt".to_string()))?;
        Ok(self.encode(password, &salt))
    }

    fn encode(&self, password: &str, salt: &[u8]) -> String {
        let mut credential = [0u8; CREDENTIAL_LEN];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt,
            password.as_bytes(),
            &mut credential,
        );

        format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            general_purpose::STANDARD_NO_PAD.encode(salt),
            general_purpose::STANDARD_NO_PAD.encode(credential)
        )
    }

    /// Check `password` against an encoded hash. Malformed encodings never verify.
    pub fn verify(&self, password: &str, encoded: &str) -> bool {
        let mut parts = encoded.split('$');
        let (Some(scheme), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return false;
        };

        if scheme != SCHEME {
            return false;
        }
        let Some(iterations) = iterations.parse::<u32>().ok().and_then(NonZeroU32::new) else {
            return false;
        };
        let (Ok(salt), Ok(expected)) = (
            general_purpose::STANDARD_NO_PAD.decode(salt),
            general_purpose::STANDARD_NO_PAD.decode(expected),
        ) else {
            return false;
        };

        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            iterations,
            &salt,
            password.as_bytes(),
            &expected,
        )
        .is_ok()
    }
}

/// Fields submitted by the registration form
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Registration, login and logout
#[derive(Debug, Clone)]
pub struct AuthService {
    db: Database,
    hasher: PasswordHasher,
    /// Verified against when the username is unknown, so both failures cost one PBKDF2 run
    dummy_hash: String,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(db: Database, config: AuthConfig) -> Self {
        let hasher = PasswordHasher::new(config.pbkdf2_iterations);
        let dummy_hash = hasher.encode("", &[0u8; SALT_LEN]);
        Self {
            hasher,
            dummy_hash,
            db,
            config,
        }
    }

    /// Validate the form and create the account
    pub async fn register(&self, form: &RegisterForm) -> Result<User> {
        let username = form.username.trim();
        let email = form.email.trim();

        if username.is_empty() || email.is_empty() || form.password.is_empty() {
            return Err(ForumError::Validation("All fields are required".to_string()));
        }
        if !looks_like_email(email) {
            return Err(ForumError::Validation("Invalid email address".to_string()));
        }
        if form.password.chars().count() < self.config.min_password_length {
            return Err(ForumError::Validation(format!(
                "Password must be at least {} characters",
                self.config.min_password_length
            )));
        }

        let users = self.db.users();
        if users.username_or_email_taken(username, email).await? {
            warn!("Registration rejected: username or email in use");
            return Err(ForumError::Conflict(
                "Username or email already exists".to_string(),
            ));
        }

        let password_hash = self.hasher.hash(&form.password)?;
        let user = users.create_user(username, email, &password_hash).await?;

        info!("👤 Registered user {} ({})", user.id, user.username);
        Ok(user)
    }

    /// Check credentials and issue a session
    pub async fn login(&self, username: &str, password: &str) -> Result<IssuedSession> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(ForumError::Validation(
                "Username and password are required".to_string(),
            ));
        }

        let invalid = || ForumError::Unauthorized("Invalid username or password".to_string());

        let user = match self.db.users().find_by_username(username).await? {
            Some(user) => user,
            None => {
                self.hasher.verify(password, &self.dummy_hash);
                warn!("Login failed: unknown username");
                return Err(invalid());
            }
        };

        if !self.hasher.verify(password, &user.password_hash) {
            warn!("Login failed for user {}", user.id);
            return Err(invalid());
        }

        let sessions = self.db.sessions();
        let ttl = self.config.session_ttl();
        let session = if self.config.single_session {
            sessions.replace_for_user(user.id, ttl).await?
        } else {
            sessions.create(user.id, ttl).await?
        };

        info!("🔑 User {} logged in", user.id);
        Ok(session)
    }

    /// End the session behind `token`; returns whether one was active
    pub async fn logout(&self, token: &str) -> Result<bool> {
        let revoked = self.db.sessions().revoke(token).await?;
        if revoked {
            info!("👋 Session ended");
        }
        Ok(revoked)
    }

    /// User owning the session `token`, if it is live
    pub async fn current_user(&self, token: &str) -> Result<Option<User>> {
        self.db.sessions().resolve(token).await
    }
}

/// Minimal shape check: something before and after a single `@`, a dot in the domain
fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
