use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::cache::CacheConfig;

/// Top-level server settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory holding the database file.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_database_file")]
    pub database_file: String,
    /// Directory of the static frontend.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_favicon_timeout_secs")]
    pub favicon_timeout_secs: u64,
    /// Fetch icons in the background after bookmark writes.
    #[serde(default = "default_fetch_favicons")]
    pub fetch_favicons: bool,
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// `data/` when it exists (the container mount), otherwise the working directory.
fn default_data_dir() -> PathBuf {
    if Path::new("data").is_dir() {
        PathBuf::from("data")
    } else {
        PathBuf::from(".")
    }
}

fn default_database_file() -> String {
    "bookmarks.db".to_string()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_favicon_timeout_secs() -> u64 {
    5
}

fn default_fetch_favicons() -> bool {
    true
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            database_file: default_database_file(),
            static_dir: default_static_dir(),
            favicon_timeout_secs: default_favicon_timeout_secs(),
            fetch_favicons: default_fetch_favicons(),
            cache: CacheConfig::default(),
        }
    }
}

impl ServerSettings {
    /// Full path of the SQLite database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.database_file)
    }

    /// Socket address string to bind.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
