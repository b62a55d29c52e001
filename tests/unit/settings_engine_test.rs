//! Integration-level unit tests for the SettingsEngine public API.
//!
//! These tests exercise the SettingsEngine through its public trait interface,
//! validating default loading, file parsing and environment precedence.

use std::collections::HashMap;
use std::path::PathBuf;

use rstest::rstest;
use shelfmark::services::settings_engine::{
    SettingsEngine, SettingsEngineTrait, ENV_DATA_DIR, ENV_HOST, ENV_PORT, ENV_STATIC_DIR,
};
use shelfmark::types::cache::InstallPolicy;
use shelfmark::types::errors::SettingsError;
use shelfmark::types::settings::ServerSettings;
use tempfile::TempDir;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn write_config(dir: &TempDir, json: &str) -> PathBuf {
    let path = dir.path().join("shelfmark.json");
    std::fs::write(&path, json).unwrap();
    path
}

#[test]
fn test_load_defaults_without_file_or_env() {
    let mut engine = SettingsEngine::new(None, HashMap::new());

    let settings = engine.load().unwrap();

    assert_eq!(settings, ServerSettings::default());
    assert_eq!(settings.port, 8000);
    assert_eq!(settings.host, "0.0.0.0");
    assert_eq!(settings.cache.install_policy, InstallPolicy::Versioned);
    assert!(engine.get_config_path().is_none());
}

#[test]
fn test_file_values_override_defaults() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"{"port": 9100, "database_file": "marks.db", "cache": {"version": 3, "install_policy": "always_purge"}}"#,
    );
    let mut engine = SettingsEngine::new(Some(path.clone()), HashMap::new());

    let settings = engine.load().unwrap();

    assert_eq!(settings.port, 9100);
    assert_eq!(settings.database_file, "marks.db");
    assert_eq!(settings.cache.version, 3);
    assert_eq!(settings.cache.install_policy, InstallPolicy::AlwaysPurge);
    // Fields absent from the file keep their defaults.
    assert_eq!(settings.host, "0.0.0.0");
    assert_eq!(settings.cache.base_name, "shelfmark");
    assert_eq!(engine.get_config_path(), Some(path.as_path()));
    assert_eq!(engine.get_settings(), &settings);
}

#[test]
fn test_env_overrides_file() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"host": "127.0.0.1", "port": 9100}"#);
    let vars = env(&[
        (ENV_PORT, "9200"),
        (ENV_DATA_DIR, "/srv/shelfmark"),
        (ENV_STATIC_DIR, "/srv/static"),
    ]);
    let mut engine = SettingsEngine::new(Some(path), vars);

    let settings = engine.load().unwrap();

    assert_eq!(settings.host, "127.0.0.1");
    assert_eq!(settings.port, 9200);
    assert_eq!(settings.data_dir, PathBuf::from("/srv/shelfmark"));
    assert_eq!(settings.static_dir, PathBuf::from("/srv/static"));
    assert_eq!(settings.database_path(), PathBuf::from("/srv/shelfmark/bookmarks.db"));
    assert_eq!(settings.socket_addr(), "127.0.0.1:9200");
}

#[rstest]
#[case::not_a_number(ENV_PORT, "eighty")]
#[case::out_of_range(ENV_PORT, "70000")]
#[case::empty_host(ENV_HOST, "  ")]
fn test_invalid_env_value_is_rejected(#[case] key: &str, #[case] value: &str) {
    let mut engine = SettingsEngine::new(None, env(&[(key, value)]));
    assert!(matches!(engine.load(), Err(SettingsError::InvalidValue(_))));
}

#[test]
fn test_zero_favicon_timeout_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, r#"{"favicon_timeout_secs": 0}"#);
    let mut engine = SettingsEngine::new(Some(path), HashMap::new());
    assert!(matches!(engine.load(), Err(SettingsError::InvalidValue(_))));
}

#[test]
fn test_missing_config_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let mut engine = SettingsEngine::new(Some(dir.path().join("absent.json")), HashMap::new());
    assert!(matches!(engine.load(), Err(SettingsError::IoError(_))));
}

#[test]
fn test_malformed_config_file_is_serialization_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "{ port: ");
    let mut engine = SettingsEngine::new(Some(path), HashMap::new());
    assert!(matches!(engine.load(), Err(SettingsError::SerializationError(_))));
}
