//! Great Forums Admin CLI
//!
//! Maintenance commands that operate directly on the forum database: schema
//! migration, category management, session cleanup and revocation,
//! statistics and post removal.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use great_forums::{Database, ForumConfig};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "great-forums-admin")]
#[command(about = "Great Forums Admin CLI - database maintenance and moderation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Database URL; defaults to database.url from the configuration
    #[arg(long, env = "FORUM__DATABASE__URL")]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing tables and indexes
    Migrate,

    /// Insert categories that do not exist yet
    SeedCategories {
        /// Category names; the configured defaults when omitted
        names: Vec<String>,
    },

    /// Create a single category
    AddCategory {
        /// Category name
        name: String,
    },

    /// Delete expired sessions
    PurgeSessions,

    /// Sign a user out everywhere
    RevokeSessions {
        /// Username
        username: String,
    },

    /// Show row counts
    Stats,

    /// Delete a post with its comments, reactions and category links
    DeletePost {
        /// Post ID
        id: i64,

        /// Confirm the delete operation
        #[arg(long)]
        confirm: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenv();
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(log_level))
        .init();

    let mut config = ForumConfig::load()?;
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }

    let db = Database::connect(&config.database).await?;

    let result = match cli.command {
        Commands::Migrate => {
            db.migrate().await?;
            info!("✅ Schema is up to date");
            Ok(())
        }

        Commands::SeedCategories { names } => {
            let names = if names.is_empty() {
                config.forum.default_categories.clone()
            } else {
                names
            };
            db.migrate().await?;
            let added = db.seed_default_categories(&names).await?;
            info!("🏷️  Added {} of {} categories", added, names.len());
            Ok(())
        }

        Commands::AddCategory { name } => {
            db.migrate().await?;
            let category = db.categories().create(&name).await?;
            info!("🏷️  Created category {} ({})", category.name, category.id);
            Ok(())
        }

        Commands::PurgeSessions => {
            let purged = db.sessions().purge_expired().await?;
            info!("🧹 Removed {} expired sessions", purged);
            Ok(())
        }

        Commands::RevokeSessions { username } => revoke_sessions(&db, &username).await,

        Commands::Stats => show_stats(&db).await,

        Commands::DeletePost { id, confirm } => delete_post(&db, id, confirm).await,
    };

    db.close().await;
    result
}

async fn show_stats(db: &Database) -> Result<()> {
    let stats = db.stats().await?;

    info!("📊 Forum Statistics");
    info!("===================");
    info!("👤 Users: {}", stats.users);
    info!("🔑 Active sessions: {}", stats.active_sessions);
    info!("📝 Posts: {}", stats.posts);
    info!("💬 Comments: {}", stats.comments);
    info!("🏷️  Categories: {}", stats.categories);
    Ok(())
}

async fn revoke_sessions(db: &Database, username: &str) -> Result<()> {
    let Some(user) = db.users().find_by_username(username).await? else {
        warn!("⚠️  User {} not found", username);
        bail!("user {} does not exist", username);
    };

    let revoked = db.sessions().revoke_all_for_user(user.id).await?;
    info!("🔒 Revoked {} session(s) for {}", revoked, user.username);
    Ok(())
}

async fn delete_post(db: &Database, id: i64, confirm: bool) -> Result<()> {
    if !confirm {
        error!("❌ Delete operation requires --confirm flag for safety");
        return Ok(());
    }

    let Some(post) = db.posts().get_post(id).await? else {
        warn!("⚠️  Post {} not found", id);
        bail!("post {} does not exist", id);
    };

    if db.posts().delete_post(id).await? {
        info!("🗑️  Deleted post {} \"{}\" by {}", post.id, post.title, post.author);
    }
    Ok(())
}
