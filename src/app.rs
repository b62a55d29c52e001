//! App Core for Shelfmark.
//!
//! Central struct holding the database, the favicon fetcher and the resolved
//! settings. Shared by every HTTP handler behind an `Arc`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::database::Database;
use crate::managers::bookmark_manager::BookmarkManager;
use crate::managers::favicon_manager::FaviconManager;
use crate::services::favicon_service::{self, FaviconService};
use crate::types::errors::BookmarkError;
use crate::types::settings::ServerSettings;

/// Central application state.
///
/// `BookmarkManager` and `FaviconManager` borrow the connection with a lifetime,
/// so they are created per call inside [`App::with_bookmarks`] and
/// [`App::with_favicons`] while the database lock is held.
pub struct App {
    pub db: Arc<Mutex<Database>>,
    pub favicons: Arc<FaviconService>,
    pub settings: Arc<ServerSettings>,
}

impl App {
    /// Opens the database under `settings.data_dir` and builds the services.
    pub fn new(settings: ServerSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let path = settings.database_path();
        let db = Database::open(&path)
            .map_err(|e| format!("failed to open database {}: {}", path.display(), e))?;
        tracing::info!(path = %path.display(), "opened database");
        Self::with_database(db, settings)
    }

    /// Builds the app around an already opened database (tests use `open_in_memory`).
    pub fn with_database(db: Database, settings: ServerSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let favicons = FaviconService::new(Duration::from_secs(settings.favicon_timeout_secs))
            .map_err(|e| format!("FaviconService init failed: {}", e))?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            favicons: Arc::new(favicons),
            settings: Arc::new(settings),
        })
    }

    /// Runs `f` against a `BookmarkManager` while holding the database lock.
    pub fn with_bookmarks<T>(
        &self,
        f: impl FnOnce(&mut BookmarkManager<'_>) -> Result<T, BookmarkError>,
    ) -> Result<T, BookmarkError> {
        let guard = self
            .db
            .lock()
            .map_err(|e| BookmarkError::Storage(format!("database lock poisoned: {}", e)))?;
        let mut manager = BookmarkManager::new(guard.connection());
        f(&mut manager)
    }

    /// Runs `f` against a `FaviconManager` while holding the database lock.
    pub fn with_favicons<T>(
        &self,
        f: impl FnOnce(&mut FaviconManager<'_>) -> Result<T, BookmarkError>,
    ) -> Result<T, BookmarkError> {
        let guard = self
            .db
            .lock()
            .map_err(|e| BookmarkError::Storage(format!("database lock poisoned: {}", e)))?;
        let mut manager = FaviconManager::new(guard.connection());
        f(&mut manager)
    }

    /// Queues a background icon fetch for a freshly written bookmark.
    ///
    /// No-op when favicon fetching is disabled in the settings.
    pub fn schedule_favicon(&self, bookmark_id: i64, url: &str) {
        if !self.settings.fetch_favicons {
            return;
        }
        favicon_service::spawn_refresh(
            Arc::clone(&self.db),
            Arc::clone(&self.favicons),
            bookmark_id,
            url.to_string(),
        );
    }
}
