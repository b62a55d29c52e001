//! Offline cache worker policy for Shelfmark.
//!
//! Models the browser service worker as a small state machine:
//!
//! * **install**: apply an [`InstallPlan`] derived from the caches already
//!   present, then (if needed) pre-populate the current cache from the manifest.
//! * **activate**: become the controller; no data is touched.
//! * **fetch**: pick a [`FetchStrategy`] per request. The worker script and
//!   every non-GET request are passed through untouched. GETs under the static
//!   prefix are served cache-first. All other GETs are network-first and fall
//!   back to the last cached copy when the network fails.
//!
//! Storage and network are abstracted behind [`CacheStore`] and [`Network`] so
//! the same policy drives tests and the generated `sw.js` header.

use std::collections::HashMap;

use reqwest::Url;
use ring::digest;

use crate::types::cache::{
    CacheConfig, CacheRequest, CacheResponse, FetchOutcome, FetchStrategy, InstallPlan,
    InstallPolicy, ResponseSource, WorkerPhase,
};
use crate::types::errors::CacheError;

/// Named response caches, as exposed by the browser's `caches` object.
pub trait CacheStore {
    fn cache_names(&self) -> Vec<String>;
    /// Returns true if a cache was removed.
    fn delete_cache(&mut self, name: &str) -> bool;
    fn put(&mut self, cache: &str, request: &CacheRequest, response: CacheResponse);
    fn match_request(&self, cache: &str, request: &CacheRequest) -> Option<CacheResponse>;
}

/// One network round trip. `Err` means the request failed outright; HTTP error
/// statuses are returned as `Ok` responses.
pub trait Network {
    fn fetch(&mut self, request: &CacheRequest) -> Result<CacheResponse, CacheError>;
}

/// In-process [`CacheStore`] keyed by cache name, then by request URL.
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    caches: HashMap<String, HashMap<String, CacheResponse>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held by `cache` (0 when absent).
    pub fn len(&self, cache: &str) -> usize {
        self.caches.get(cache).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self, cache: &str) -> bool {
        self.len(cache) == 0
    }
}

impl CacheStore for MemoryCacheStore {
    fn cache_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.keys().cloned().collect();
        names.sort();
        names
    }

    fn delete_cache(&mut self, name: &str) -> bool {
        self.caches.remove(name).is_some()
    }

    fn put(&mut self, cache: &str, request: &CacheRequest, response: CacheResponse) {
        self.caches
            .entry(cache.to_string())
            .or_default()
            .insert(request.url.clone(), response);
    }

    fn match_request(&self, cache: &str, request: &CacheRequest) -> Option<CacheResponse> {
        self.caches.get(cache)?.get(&request.url).cloned()
    }
}

impl CacheConfig {
    /// First 8 hex chars of the SHA-256 of the asset manifest.
    pub fn manifest_digest(&self) -> String {
        let joined = self.assets.join("\n");
        let hash = digest::digest(&digest::SHA256, joined.as_bytes());
        hex_encode(&hash.as_ref()[..4])
    }

    /// Full cache name: `{base}-v{version}-{manifest digest}`.
    pub fn cache_name(&self) -> String {
        format!("{}-v{}-{}", self.base_name, self.version, self.manifest_digest())
    }

    fn family_prefix(&self) -> String {
        format!("{}-v", self.base_name)
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Decides what install must do given the cache names already present.
pub fn plan_install(existing: &[String], config: &CacheConfig) -> InstallPlan {
    let current = config.cache_name();
    let prefix = config.family_prefix();
    let family = existing.iter().filter(|name| name.starts_with(&prefix));

    match config.install_policy {
        InstallPolicy::AlwaysPurge => InstallPlan {
            drop: family.cloned().collect(),
            populate: true,
        },
        InstallPolicy::Versioned => InstallPlan {
            drop: family.filter(|name| **name != current).cloned().collect(),
            populate: !existing.contains(&current),
        },
    }
}

/// Path component of a request URL, always with a leading `/`.
pub fn request_path(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url) {
        return parsed.path().to_string();
    }
    let end = url.find(['?', '#']).unwrap_or(url.len());
    let path = &url[..end];
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

/// Renders the configuration preamble prepended to the static `sw.js` body.
pub fn render_worker_header(config: &CacheConfig) -> String {
    let js_string = |s: &str| serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string());
    let assets = serde_json::to_string(&config.assets).unwrap_or_else(|_| "[]".to_string());
    format!(
        "// generated by shelfmark {version}\n\
         const CACHE_NAME = {name};\n\
         const CACHE_FAMILY = {family};\n\
         const STATIC_PREFIX = {prefix};\n\
         const WORKER_PATH = {worker};\n\
         const ALWAYS_PURGE = {purge};\n\
         const ASSETS = {assets};\n",
        version = env!("CARGO_PKG_VERSION"),
        name = js_string(&config.cache_name()),
        family = js_string(&config.family_prefix()),
        prefix = js_string(&config.static_prefix),
        worker = js_string(&config.worker_path),
        purge = config.install_policy == InstallPolicy::AlwaysPurge,
        assets = assets,
    )
}

/// The offline cache worker.
pub struct OfflineCacheWorker<S: CacheStore> {
    config: CacheConfig,
    cache_name: String,
    store: S,
    phase: WorkerPhase,
}

impl<S: CacheStore> OfflineCacheWorker<S> {
    pub fn new(config: CacheConfig, store: S) -> Self {
        let cache_name = config.cache_name();
        Self {
            config,
            cache_name,
            store,
            phase: WorkerPhase::Parsed,
        }
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Runs the install phase. On a network failure the worker stays unparsed
    /// and the current cache is left unfilled, matching `cache.addAll`.
    pub fn install<N: Network>(&mut self, network: &mut N) -> Result<InstallPlan, CacheError> {
        if self.phase != WorkerPhase::Parsed {
            return Err(CacheError::AlreadyInstalled);
        }

        let plan = plan_install(&self.store.cache_names(), &self.config);
        for name in &plan.drop {
            self.store.delete_cache(name);
            tracing::debug!(cache = %name, "dropped cache");
        }

        if plan.populate {
            let mut fetched = Vec::with_capacity(self.config.assets.len());
            for asset in &self.config.assets {
                let request = CacheRequest::get(asset);
                let response = network.fetch(&request)?;
                if !response.is_success() {
                    return Err(CacheError::Network(format!(
                        "asset {} returned status {}",
                        asset, response.status
                    )));
                }
                fetched.push((request, response));
            }
            for (request, response) in fetched {
                self.store.put(&self.cache_name, &request, response);
            }
            tracing::info!(cache = %self.cache_name, assets = self.config.assets.len(), "populated cache");
        }

        self.phase = WorkerPhase::Installed;
        Ok(plan)
    }

    /// Takes control of the scope. No cache data is touched.
    pub fn activate(&mut self) -> Result<(), CacheError> {
        match self.phase {
            WorkerPhase::Parsed => Err(CacheError::NotInstalled),
            _ => {
                self.phase = WorkerPhase::Activated;
                Ok(())
            }
        }
    }

    /// Pure routing decision for one request.
    pub fn strategy_for(&self, request: &CacheRequest) -> FetchStrategy {
        if self.phase != WorkerPhase::Activated || !request.method.is_read() {
            return FetchStrategy::Passthrough;
        }
        let path = request_path(&request.url);
        if path == request_path(&self.config.worker_path) {
            FetchStrategy::Passthrough
        } else if path.starts_with(&request_path(&self.config.static_prefix)) {
            FetchStrategy::CacheFirst
        } else {
            FetchStrategy::NetworkFirst
        }
    }

    /// Intercepts one request.
    pub fn handle_fetch<N: Network>(
        &mut self,
        request: &CacheRequest,
        network: &mut N,
    ) -> Result<FetchOutcome, CacheError> {
        match self.strategy_for(request) {
            FetchStrategy::Passthrough => Ok(FetchOutcome::Passthrough),
            FetchStrategy::CacheFirst => self.cache_first(request, network),
            FetchStrategy::NetworkFirst => self.network_first(request, network),
        }
    }

    fn cache_first<N: Network>(
        &mut self,
        request: &CacheRequest,
        network: &mut N,
    ) -> Result<FetchOutcome, CacheError> {
        if let Some(response) = self.store.match_request(&self.cache_name, request) {
            return Ok(FetchOutcome::Response {
                response,
                source: ResponseSource::Cache,
            });
        }
        let response = network.fetch(request)?;
        if response.is_success() {
            self.store.put(&self.cache_name, request, response.clone());
        }
        Ok(FetchOutcome::Response {
            response,
            source: ResponseSource::Network,
        })
    }

    fn network_first<N: Network>(
        &mut self,
        request: &CacheRequest,
        network: &mut N,
    ) -> Result<FetchOutcome, CacheError> {
        match network.fetch(request) {
            Ok(response) => {
                if response.is_success() {
                    self.store.put(&self.cache_name, request, response.clone());
                }
                Ok(FetchOutcome::Response {
                    response,
                    source: ResponseSource::Network,
                })
            }
            Err(err) => match self.store.match_request(&self.cache_name, request) {
                Some(response) => {
                    tracing::debug!(url = %request.url, "network failed, serving cached copy");
                    Ok(FetchOutcome::Response {
                        response,
                        source: ResponseSource::Cache,
                    })
                }
                None => Err(err),
            },
        }
    }
}
