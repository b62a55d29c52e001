// Shelfmark Settings Engine
// Resolves server settings from built-in defaults, an optional JSON file and
// SHELFMARK_* environment variables. Later sources win.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::errors::SettingsError;
use crate::types::settings::ServerSettings;

pub const ENV_CONFIG: &str = "SHELFMARK_CONFIG";
pub const ENV_HOST: &str = "SHELFMARK_HOST";
pub const ENV_PORT: &str = "SHELFMARK_PORT";
pub const ENV_DATA_DIR: &str = "SHELFMARK_DATA_DIR";
pub const ENV_STATIC_DIR: &str = "SHELFMARK_STATIC_DIR";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<ServerSettings, SettingsError>;
    fn get_settings(&self) -> &ServerSettings;
    fn get_config_path(&self) -> Option<&Path>;
}

/// Settings engine reading a JSON file plus environment overrides.
pub struct SettingsEngine {
    config_path: Option<PathBuf>,
    env: HashMap<String, String>,
    settings: ServerSettings,
}

impl SettingsEngine {
    /// Creates an engine over the process environment.
    ///
    /// The config file path comes from `SHELFMARK_CONFIG` when set.
    pub fn from_process_env() -> Self {
        let env: HashMap<String, String> = std::env::vars()
            .filter(|(key, _)| key.starts_with("SHELFMARK_"))
            .collect();
        let config_path = env.get(ENV_CONFIG).map(PathBuf::from);
        Self::new(config_path, env)
    }

    /// Creates an engine over an explicit file path and variable set.
    pub fn new(config_path: Option<PathBuf>, env: HashMap<String, String>) -> Self {
        Self {
            config_path,
            env,
            settings: ServerSettings::default(),
        }
    }

    fn read_file(path: &Path) -> Result<ServerSettings, SettingsError> {
        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;
        serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })
    }

    fn apply_env(&self, settings: &mut ServerSettings) -> Result<(), SettingsError> {
        if let Some(host) = self.env.get(ENV_HOST) {
            if host.trim().is_empty() {
                return Err(SettingsError::InvalidValue(format!("{} must not be empty", ENV_HOST)));
            }
            settings.host = host.trim().to_string();
        }
        if let Some(port) = self.env.get(ENV_PORT) {
            settings.port = port.trim().parse::<u16>().map_err(|_| {
                SettingsError::InvalidValue(format!("{}='{}' is not a valid port", ENV_PORT, port))
            })?;
        }
        if let Some(dir) = self.env.get(ENV_DATA_DIR) {
            settings.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = self.env.get(ENV_STATIC_DIR) {
            settings.static_dir = PathBuf::from(dir);
        }
        Ok(())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Resolves settings. A configured file that does not exist is an error.
    fn load(&mut self) -> Result<ServerSettings, SettingsError> {
        let mut settings = match &self.config_path {
            Some(path) => Self::read_file(path)?,
            None => ServerSettings::default(),
        };
        self.apply_env(&mut settings)?;
        if settings.favicon_timeout_secs == 0 {
            return Err(SettingsError::InvalidValue(
                "favicon_timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.settings = settings;
        Ok(self.settings.clone())
    }

    fn get_settings(&self) -> &ServerSettings {
        &self.settings
    }

    fn get_config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}
