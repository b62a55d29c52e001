use serde::{Deserialize, Serialize};

/// How the install phase treats caches left behind by earlier deployments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallPolicy {
    /// Drop every cache under the base name, current one included, then refill.
    AlwaysPurge,
    /// Keep the current cache if it exists; only drop stale versions.
    Versioned,
}

/// Configuration handed to the offline cache worker at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Cache name prefix shared by every version.
    #[serde(default = "default_base_name")]
    pub base_name: String,
    /// Bump to force a clean refill even when the manifest is unchanged.
    #[serde(default = "default_version")]
    pub version: u32,
    /// Asset paths pre-populated on install.
    #[serde(default = "default_assets")]
    pub assets: Vec<String>,
    /// Path prefix served cache-first.
    #[serde(default = "default_static_prefix")]
    pub static_prefix: String,
    /// Path of the worker script itself, never intercepted.
    #[serde(default = "default_worker_path")]
    pub worker_path: String,
    #[serde(default = "default_install_policy")]
    pub install_policy: InstallPolicy,
}

fn default_base_name() -> String {
    "shelfmark".to_string()
}

fn default_version() -> u32 {
    1
}

fn default_assets() -> Vec<String> {
    [
        "/",
        "/static/index.html",
        "/static/style.css",
        "/static/app.js",
        "/static/favicon.svg",
        "/static/weblink.svg",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_static_prefix() -> String {
    "/static/".to_string()
}

fn default_worker_path() -> String {
    "/sw.js".to_string()
}

fn default_install_policy() -> InstallPolicy {
    InstallPolicy::Versioned
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            base_name: default_base_name(),
            version: default_version(),
            assets: default_assets(),
            static_prefix: default_static_prefix(),
            worker_path: default_worker_path(),
            install_policy: default_install_policy(),
        }
    }
}

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    /// Only GET requests are ever read from or written to the cache.
    pub fn is_read(self) -> bool {
        matches!(self, HttpMethod::Get)
    }
}

/// A request seen by the worker's fetch handler.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheRequest {
    pub method: HttpMethod,
    pub url: String,
}

impl CacheRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.to_string(),
        }
    }

    pub fn new(method: HttpMethod, url: &str) -> Self {
        Self {
            method,
            url: url.to_string(),
        }
    }
}

/// A response as stored in (or returned from) the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl CacheResponse {
    pub fn ok(content_type: &str, body: &[u8]) -> Self {
        Self {
            status: 200,
            content_type: Some(content_type.to_string()),
            body: body.to_vec(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Strategy chosen for a single intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStrategy {
    /// Not intercepted; the browser's default network handling applies.
    Passthrough,
    CacheFirst,
    NetworkFirst,
}

/// Where an intercepted response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Cache,
    Network,
}

/// Result of running the fetch handler on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    Passthrough,
    Response {
        response: CacheResponse,
        source: ResponseSource,
    },
}

/// What install must do to the cache storage before the worker is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Cache names to delete, in order.
    pub drop: Vec<String>,
    /// Whether the current cache must be filled from the manifest.
    pub populate: bool,
}

/// Lifecycle phase of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Parsed,
    Installed,
    Activated,
}
