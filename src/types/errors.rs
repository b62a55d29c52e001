use std::fmt;

// === BookmarkError ===

/// Errors related to bookmark and folder operations.
#[derive(Debug, PartialEq, Eq)]
pub enum BookmarkError {
    /// Malformed input: bad URL, empty name, unknown parent, cyclic move.
    Validation(String),
    /// The referenced bookmark or folder does not exist.
    NotFound(String),
    /// The requested ordering collides with itself or with another parent.
    Conflict(String),
    /// The underlying database operation failed.
    Storage(String),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::Validation(msg) => write!(f, "Validation failed: {}", msg),
            BookmarkError::NotFound(what) => write!(f, "Not found: {}", what),
            BookmarkError::Conflict(msg) => write!(f, "Ordering conflict: {}", msg),
            BookmarkError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for BookmarkError {}

impl From<rusqlite::Error> for BookmarkError {
    fn from(err: rusqlite::Error) -> Self {
        BookmarkError::Storage(err.to_string())
    }
}

// === FaviconError ===

/// Errors related to fetching site icons.
#[derive(Debug)]
pub enum FaviconError {
    /// The bookmark URL could not be parsed or has no host.
    InvalidUrl(String),
    /// A network request failed or returned a non-success status.
    Network(String),
    /// Neither the page nor the fallback service yielded an icon.
    NoIcon(String),
}

impl fmt::Display for FaviconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaviconError::InvalidUrl(url) => write!(f, "Invalid favicon URL: {}", url),
            FaviconError::Network(msg) => write!(f, "Favicon network error: {}", msg),
            FaviconError::NoIcon(url) => write!(f, "No favicon found for: {}", url),
        }
    }
}

impl std::error::Error for FaviconError {}

impl From<reqwest::Error> for FaviconError {
    fn from(err: reqwest::Error) -> Self {
        FaviconError::Network(err.to_string())
    }
}

// === SettingsError ===

/// Errors related to loading server settings.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading the settings file.
    IoError(String),
    /// Failed to parse the settings file.
    SerializationError(String),
    /// A settings value is out of range or malformed.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === CacheError ===

/// Errors surfaced by the offline cache worker.
#[derive(Debug, PartialEq, Eq)]
pub enum CacheError {
    /// The network request failed and no cached copy was available.
    Network(String),
    /// Install was requested on a worker that already ran it.
    AlreadyInstalled,
    /// Activation was requested before install completed.
    NotInstalled,
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::Network(msg) => write!(f, "Cache network error: {}", msg),
            CacheError::AlreadyInstalled => write!(f, "Cache worker already installed"),
            CacheError::NotInstalled => write!(f, "Cache worker not installed"),
        }
    }
}

impl std::error::Error for CacheError {}
