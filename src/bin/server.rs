// Great Forums - HTTP Server
// Run with: cargo run --bin server

//! # Forum Server Binary
//!
//! Starts the forum on the configured host and port.
//!
//! ```text
//! main() function
//!   ↓ loads
//! .env + forum.toml + FORUM__* variables
//!   ↓ builds
//! ForumServerBuilder
//!   ↓ connects + migrates
//! SQLite database
//!   ↓ serves
//! axum Router
//! ```
//!
//! ## Configuration
//!
//! Every setting has a default, so the server starts with no configuration at
//! all (SQLite file `forum.db` in the working directory, port 8080). Override
//! with a `forum.toml` file (path in `FORUM_CONFIG`) or environment variables
//! such as `FORUM__SERVER__PORT=3000` and `FORUM__DATABASE__URL=sqlite://data/forum.db`.
//!
//! ## Rust Learning Notes:
//!
//! ### Binary vs Library
//! All forum logic lives in the `great_forums` library crate; this file only
//! assembles it. The admin CLI reuses the same library.
//!
//! ### anyhow in Binaries
//! The library returns its own `ForumError`. At the top of a binary the only
//! thing left to do with an error is report it, which is what `anyhow::Result`
//! is for.

use anyhow::Result;
use dotenv::dotenv;
use great_forums::{ForumConfig, ForumServerBuilder};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real deployments set variables directly
    if let Err(e) = dotenv() {
        eprintln!("Note: no .env file loaded ({})", e);
    }

    let config = ForumConfig::load()?;

    // RUST_LOG wins over logging.level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("🚀 Starting Great Forums...");
    info!("=====================================");
    info!("Server: {}:{}", config.server.host, config.server.port);
    info!("Database: {}", config.database.url);
    info!("Recent posts on home page: {}", config.forum.recent_posts_limit);
    if !config.auth.cookie_secure {
        info!("⚠️  Session cookie is not marked Secure; enable auth.cookie_secure behind HTTPS");
    }

    ForumServerBuilder::new()
        .with_config(config)
        .build_and_run()
        .await?;

    Ok(())
}
