//! # HTTP Server
//!
//! Combines the API, frontend and static routers into one axum app.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use super::routes::{api_routes, frontend_routes, health_routes};
use crate::app::App;

/// HTTP server for Shelfmark.
pub struct HttpServer {
    app: Arc<App>,
    router: Router,
}

impl HttpServer {
    /// Creates a server around the shared application state.
    pub fn new(app: App) -> Self {
        let app = Arc::new(app);
        let router = Self::build_router(Arc::clone(&app));
        Self { app, router }
    }

    fn build_router(app: Arc<App>) -> Router {
        let static_files = ServeDir::new(&app.settings.static_dir);
        Router::new()
            .merge(health_routes())
            .merge(api_routes(Arc::clone(&app)))
            .merge(frontend_routes(app))
            .nest_service("/static", static_files)
            .layer(TraceLayer::new_for_http())
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.app.settings.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Binds the configured address and serves until Ctrl-C.
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("invalid socket address {}: {}", self.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "shelfmark listening");
        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
