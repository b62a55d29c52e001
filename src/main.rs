//! Shelfmark — a self-hosted bookmark manager.
//!
//! Entry point: resolves settings, opens the database and serves the HTTP API
//! together with the static frontend.

use shelfmark::app::App;
use shelfmark::http_server::HttpServer;
use shelfmark::services::settings_engine::{SettingsEngine, SettingsEngineTrait};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut engine = SettingsEngine::from_process_env();
    let settings = engine.load()?;
    if let Some(path) = engine.get_config_path() {
        tracing::info!(config = %path.display(), "loaded settings file");
    }
    tracing::info!(
        data_dir = %settings.data_dir.display(),
        static_dir = %settings.static_dir.display(),
        cache = %settings.cache.cache_name(),
        "starting shelfmark v{}",
        env!("CARGO_PKG_VERSION")
    );

    let app = App::new(settings)?;
    HttpServer::new(app).start().await?;
    Ok(())
}
