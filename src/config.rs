// Forum configuration
// Defaults, optional TOML file and FORUM__* environment variables, in that order

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

use crate::Result;

/// Path of the optional configuration file when `FORUM_CONFIG` is unset
pub const DEFAULT_CONFIG_FILE: &str = "forum.toml";

/// Top-level configuration for the forum
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ForumConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub forum: ContentConfig,
    pub logging: LoggingConfig,
}

/// HTTP listener settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`
    pub static_dir: String,
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: "static".to_string(),
            cors_enabled: false,
        }
    }
}

/// Database connection settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// sqlx SQLite URL, e.g. `sqlite://forum.db` or `sqlite::memory:`
    pub url: String,
    pub max_connections: u32,
    /// How long a connection waits for another writer before failing with "database is locked"
    pub busy_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://forum.db".to_string(),
            max_connections: 5,
            busy_timeout_secs: 5,
        }
    }
}

impl DatabaseConfig {
    /// In-memory configuration used by tests and throwaway runs
    pub fn in_memory() -> Self {
        Self {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            ..Self::default()
        }
    }

    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    pub fn is_in_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}

/// Authentication and session cookie settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    /// Adds the `Secure` attribute; enable when served over HTTPS
    pub cookie_secure: bool,
    pub session_ttl_hours: u32,
    pub pbkdf2_iterations: u32,
    pub min_password_length: usize,
    /// A new login revokes the user's other sessions
    pub single_session: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "session_token".to_string(),
            cookie_secure: false,
            session_ttl_hours: 24,
            pbkdf2_iterations: 100_000,
            min_password_length: 6,
            single_session: true,
        }
    }
}

impl AuthConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.session_ttl_hours) * 3600)
    }
}

/// Content settings
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Number of posts listed on the home page
    pub recent_posts_limit: u32,
    /// Categories created at startup when missing
    pub default_categories: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            recent_posts_limit: 10,
            default_categories: vec![
                "General".to_string(),
                "Technology".to_string(),
                "Sports".to_string(),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl ForumConfig {
    /// Load configuration from the default file location and the environment
    pub fn load() -> Result<Self> {
        let path = env::var("FORUM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&path)
    }

    /// Load configuration layering defaults, `path` (if present) and `FORUM__*` variables
    ///
    /// Environment keys use `__` between levels, e.g. `FORUM__SERVER__PORT=3000`.
    pub fn load_from(path: &str) -> Result<Self> {
        let defaults = Config::try_from(&ForumConfig::default())?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("FORUM")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Configuration for tests: in-memory database and cheap password hashing
    pub fn for_testing() -> Self {
        let mut config = Self::default();
        config.database = DatabaseConfig::in_memory();
        config.auth.pbkdf2_iterations = 1_000;
        config
    }
}
