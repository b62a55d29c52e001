//! Favicon fetching for Shelfmark.
//!
//! Best effort only: the page is fetched and scanned for `<link rel="icon">`.
//! If that yields nothing, a public favicon service is asked for the host's
//! icon. Every failure ends up as a `FaviconError` that callers log and drop;
//! the API then serves a placeholder.

use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use regex::Regex;
use reqwest::{header, Client, Url};

use crate::database::Database;
use crate::managers::favicon_manager::{FaviconManager, FaviconManagerTrait};
use crate::types::bookmark::Favicon;
use crate::types::errors::FaviconError;

/// Default fallback service; `{host}` is substituted.
pub const DEFAULT_FALLBACK: &str = "https://www.google.com/s2/favicons?domain={host}&sz=48";

static ICON_LINK: OnceLock<Option<Regex>> = OnceLock::new();
static HREF_ATTR: OnceLock<Option<Regex>> = OnceLock::new();

/// Returns the raw `href` of the first icon `<link>` in `html`.
pub fn extract_icon_href(html: &str) -> Option<String> {
    let link = ICON_LINK
        .get_or_init(|| {
            Regex::new(r#"(?i)<link[^>]*\brel\s*=\s*["'](?:shortcut\s+icon|icon)["'][^>]*>"#).ok()
        })
        .as_ref()?;
    let href = HREF_ATTR
        .get_or_init(|| Regex::new(r#"(?i)\bhref\s*=\s*["']([^"']*)["']"#).ok())
        .as_ref()?;

    let tag = link.find(html)?;
    let value = href.captures(tag.as_str())?.get(1)?.as_str().trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Resolves an icon href (possibly relative) against the page it came from.
pub fn resolve_icon_url(page: &Url, href: &str) -> Option<Url> {
    let resolved = page.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Fetches site icons over HTTP.
pub struct FaviconService {
    http: Client,
    fallback_template: String,
}

impl FaviconService {
    /// Builds a client whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FaviconError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("shelfmark/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            fallback_template: DEFAULT_FALLBACK.to_string(),
        })
    }

    /// Replaces the fallback service URL template (must contain `{host}`).
    pub fn with_fallback(mut self, template: &str) -> Self {
        self.fallback_template = template.to_string();
        self
    }

    /// URL of the fallback icon for `page`, if it has a host.
    pub fn fallback_url(&self, page: &Url) -> Option<String> {
        let host = page.host_str()?;
        Some(self.fallback_template.replace("{host}", host))
    }

    /// Fetches the icon for the page at `page_url`.
    pub async fn fetch(&self, page_url: &str) -> Result<Favicon, FaviconError> {
        let page = Url::parse(page_url).map_err(|_| FaviconError::InvalidUrl(page_url.to_string()))?;

        match self.fetch_from_page(&page).await {
            Ok(icon) => return Ok(icon),
            Err(e) => tracing::debug!(url = %page, error = %e, "page icon lookup failed, using fallback"),
        }

        let fallback = self
            .fallback_url(&page)
            .ok_or_else(|| FaviconError::InvalidUrl(page_url.to_string()))?;
        let icon = self.download(&fallback).await?;
        tracing::info!(url = %page, "retrieved favicon from fallback service");
        Ok(icon)
    }

    async fn fetch_from_page(&self, page: &Url) -> Result<Favicon, FaviconError> {
        let html = self
            .http
            .get(page.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        let href = extract_icon_href(&html).ok_or_else(|| FaviconError::NoIcon(page.to_string()))?;
        let icon_url = resolve_icon_url(page, &href).ok_or_else(|| FaviconError::InvalidUrl(href.clone()))?;
        let icon = self.download(icon_url.as_str()).await?;
        tracing::info!(url = %page, content_type = %icon.content_type, "retrieved favicon");
        Ok(icon)
    }

    async fn download(&self, url: &str) -> Result<Favicon, FaviconError> {
        let response = self.http.get(url).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/x-icon")
            .to_string();
        let data = response.bytes().await?.to_vec();
        if data.is_empty() {
            return Err(FaviconError::NoIcon(url.to_string()));
        }
        Ok(Favicon { content_type, data })
    }
}

/// Fetches and stores the icon for one bookmark. Never fails: errors are logged.
pub async fn refresh_favicon(
    db: Arc<Mutex<Database>>,
    service: Arc<FaviconService>,
    bookmark_id: i64,
    url: String,
) {
    let icon = match service.fetch(&url).await {
        Ok(icon) => icon,
        Err(e) => {
            tracing::debug!(bookmark_id, error = %e, "favicon fetch failed");
            return;
        }
    };

    let stored = match db.lock() {
        Ok(guard) => FaviconManager::new(guard.connection()).store_favicon(bookmark_id, &url, &icon),
        Err(e) => {
            tracing::error!(error = %e, "database lock poisoned while storing favicon");
            return;
        }
    };
    match stored {
        Ok(true) => {}
        Ok(false) => tracing::debug!(bookmark_id, "bookmark url changed during fetch, icon dropped"),
        Err(e) => tracing::debug!(bookmark_id, error = %e, "favicon not stored"),
    }
}

/// Spawns [`refresh_favicon`] on the runtime so the caller never waits on it.
pub fn spawn_refresh(
    db: Arc<Mutex<Database>>,
    service: Arc<FaviconService>,
    bookmark_id: i64,
    url: String,
) {
    tokio::spawn(refresh_favicon(db, service, bookmark_id, url));
}
