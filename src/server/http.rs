// HTTP server for the forum
// Connects the database, prepares the schema and serves the router

use axum::{Router, Server};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

use crate::api::{create_router, views::TemplateRenderer, ForumState};
use crate::config::ForumConfig;
use crate::engine::Database;
use crate::{BuiltinRenderer, ForumError, Result};

/// A ready-to-serve forum: migrated database plus shared handler state
pub struct ForumServer {
    config: ForumConfig,
    state: ForumState,
}

impl ForumServer {
    pub fn config(&self) -> &ForumConfig {
        &self.config
    }

    pub fn state(&self) -> &ForumState {
        &self.state
    }

    /// Forum routes plus static files, request tracing and optional CORS
    pub fn build_router(&self) -> Router {
        let mut app = create_router(self.state.clone())
            .nest_service("/static", ServeDir::new(&self.config.server.static_dir))
            .layer(TraceLayer::new_for_http());

        if self.config.server.cors_enabled {
            app = app.layer(CorsLayer::permissive());
        }
        app
    }

    fn address(&self) -> Result<SocketAddr> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        addr.parse()
            .map_err(|e| ForumError::Internal(format!("Invalid listen address {}: {}", addr, e)))
    }

    /// Serve until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let app = self.build_router();
        let addr = self.address()?;

        info!("🚀 Forum server running on http://{}", addr);
        info!("📁 Static files from {}", self.config.server.static_dir);
        info!("🔐 Session cookie: {}", self.config.auth.cookie_name);
        info!("🌐 CORS enabled: {}", self.config.server.cors_enabled);

        Server::bind(&addr)
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| ForumError::Internal(format!("Server error: {}", e)))?;

        self.state.db.close().await;
        info!("👋 Forum server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("🛑 Shutdown signal received");
    }
}

/// Builder pattern for the forum server
pub struct ForumServerBuilder {
    config: ForumConfig,
    database: Option<Database>,
    renderer: Option<Arc<dyn TemplateRenderer>>,
}

impl ForumServerBuilder {
    pub fn new() -> Self {
        Self {
            config: ForumConfig::default(),
            database: None,
            renderer: None,
        }
    }

    pub fn with_config(mut self, config: ForumConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Use an already open database instead of connecting to `database.url`
    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_renderer(mut self, renderer: Arc<dyn TemplateRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    /// Connect, migrate and seed the default categories
    pub async fn build(self) -> Result<ForumServer> {
        let db = match self.database {
            Some(db) => db,
            None => Database::connect(&self.config.database).await?,
        };
        db.migrate().await?;

        let seeded = db
            .seed_default_categories(&self.config.forum.default_categories)
            .await?;
        if seeded > 0 {
            info!("🏷️  Seeded {} default categories", seeded);
        }

        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(BuiltinRenderer::new()));
        let state = ForumState::new(db, self.config.clone(), renderer);

        Ok(ForumServer {
            config: self.config,
            state,
        })
    }

    pub async fn build_and_run(self) -> Result<()> {
        self.build().await?.run().await
    }
}

impl Default for ForumServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    async fn test_server() -> ForumServer {
        let db = Database::in_memory().await.unwrap();
        ForumServerBuilder::new()
            .with_config(ForumConfig::for_testing())
            .with_database(db)
            .build()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_build_seeds_categories() {
        let server = test_server().await;
        let categories = server.state().db.categories().all_categories().await.unwrap();
        let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["General", "Technology", "Sports"]);
    }

    #[tokio::test]
    async fn test_builder_pattern() {
        let builder = ForumServerBuilder::new().with_port(3000).with_host("127.0.0.1");
        assert_eq!(builder.config.server.port, 3000);
        assert_eq!(builder.config.server.host, "127.0.0.1");
    }

    #[tokio::test]
    async fn test_router_serves_health_and_static_fallback() {
        let app = test_server().await.build_router();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/static/does-not-exist.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    struct TitleOnly;

    impl TemplateRenderer for TitleOnly {
        fn render(&self, template: &str, _data: &serde_json::Value) -> Result<String> {
            Ok(format!("<p>{}</p>", template))
        }
    }

    #[tokio::test]
    async fn test_custom_renderer() {
        let db = Database::in_memory().await.unwrap();
        let app = ForumServerBuilder::new()
            .with_config(ForumConfig::for_testing())
            .with_database(db)
            .with_renderer(Arc::new(TitleOnly))
            .build()
            .await
            .unwrap()
            .build_router();

        let response = app
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = hyper::body::to_bytes(response.into_body()).await.unwrap();
        assert_eq!(&body[..], b"<p>login.html</p>");
    }

    #[tokio::test]
    async fn test_invalid_address() {
        let mut config = ForumConfig::for_testing();
        config.server.host = "not a host".to_string();
        let db = Database::in_memory().await.unwrap();
        let server = ForumServerBuilder::new()
            .with_config(config)
            .with_database(db)
            .build()
            .await
            .unwrap();
        assert!(matches!(server.address(), Err(ForumError::Internal(_))));
    }
}
