use shelfmark::types::errors::*;

// === BookmarkError Tests ===

#[test]
fn bookmark_error_display_variants() {
    assert_eq!(
        BookmarkError::Validation("name must not be empty".to_string()).to_string(),
        "Validation failed: name must not be empty"
    );
    assert_eq!(
        BookmarkError::NotFound("bookmark 7".to_string()).to_string(),
        "Not found: bookmark 7"
    );
    assert_eq!(
        BookmarkError::Conflict("folder 3 listed more than once".to_string()).to_string(),
        "Ordering conflict: folder 3 listed more than once"
    );
    assert_eq!(
        BookmarkError::Storage("disk I/O error".to_string()).to_string(),
        "Storage error: disk I/O error"
    );
}

#[test]
fn bookmark_error_from_rusqlite_is_storage() {
    let err: BookmarkError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, BookmarkError::Storage(_)));
}

#[test]
fn bookmark_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(BookmarkError::NotFound("folder 1".to_string()));
    assert!(err.source().is_none());
}

// === FaviconError Tests ===

#[test]
fn favicon_error_display_variants() {
    assert_eq!(
        FaviconError::InvalidUrl("nope".to_string()).to_string(),
        "Invalid favicon URL: nope"
    );
    assert_eq!(
        FaviconError::Network("timed out".to_string()).to_string(),
        "Favicon network error: timed out"
    );
    assert_eq!(
        FaviconError::NoIcon("https://example.com/".to_string()).to_string(),
        "No favicon found for: https://example.com/"
    );
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("missing".to_string()).to_string(),
        "Settings I/O error: missing"
    );
    assert_eq!(
        SettingsError::SerializationError("bad json".to_string()).to_string(),
        "Settings serialization error: bad json"
    );
    assert_eq!(
        SettingsError::InvalidValue("port".to_string()).to_string(),
        "Invalid settings value: port"
    );
}

// === CacheError Tests ===

#[test]
fn cache_error_display_variants() {
    assert_eq!(
        CacheError::Network("offline".to_string()).to_string(),
        "Cache network error: offline"
    );
    assert_eq!(CacheError::AlreadyInstalled.to_string(), "Cache worker already installed");
    assert_eq!(CacheError::NotInstalled.to_string(), "Cache worker not installed");
}
