//! Unit tests for favicon discovery, resolution and fetching.
//!
//! Parsing helpers are tested directly. Fetches run against a small axum
//! server bound to `127.0.0.1:0`, with the fallback template pointed at it.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Path;
use axum::http::header;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use reqwest::Url;
use rstest::rstest;
use shelfmark::database::Database;
use shelfmark::managers::bookmark_manager::{BookmarkManager, BookmarkManagerTrait};
use shelfmark::managers::favicon_manager::{FaviconManager, FaviconManagerTrait};
use shelfmark::services::favicon_service::{
    extract_icon_href, refresh_favicon, resolve_icon_url, FaviconService, DEFAULT_FALLBACK,
};
use shelfmark::types::bookmark::NewBookmark;

const PNG_BYTES: &[u8] = b"\x89PNG\r\n\x1a\nicon";

/// Serves a page with an icon link, a page without one, a page whose icon is
/// missing, the icon itself and a fallback endpoint keyed by host.
async fn icon_server() -> SocketAddr {
    let router = Router::new()
        .route(
            "/page",
            get(|| async { Html(r#"<html><head><link rel="icon" href="/icons/site.png"></head></html>"#) }),
        )
        .route("/plain", get(|| async { Html("<html><head><title>none</title></head></html>") }))
        .route(
            "/broken",
            get(|| async { Html(r#"<html><head><link rel="icon" href="/icons/missing.png"></head></html>"#) }),
        )
        .route(
            "/icons/site.png",
            get(|| async { ([(header::CONTENT_TYPE, "image/png")], PNG_BYTES.to_vec()) }),
        )
        .route(
            "/fb/:host",
            get(|Path(host): Path<String>| async move {
                ([(header::CONTENT_TYPE, "image/x-icon")], format!("fallback:{}", host).into_bytes())
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

fn local_service(addr: SocketAddr) -> FaviconService {
    FaviconService::new(Duration::from_secs(5))
        .unwrap()
        .with_fallback(&format!("http://{}/fb/{{host}}", addr))
}

#[rstest]
#[case::plain_icon(r#"<link rel="icon" href="/favicon.png">"#, Some("/favicon.png"))]
#[case::shortcut_icon(r#"<LINK REL="shortcut icon" HREF="favicon.ico">"#, Some("favicon.ico"))]
#[case::single_quotes(r#"<link rel='icon' type='image/svg+xml' href='/i.svg'>"#, Some("/i.svg"))]
#[case::href_before_rel(r#"<link href="https://cdn.example/i.ico" rel="icon">"#, Some("https://cdn.example/i.ico"))]
#[case::stylesheet_only(r#"<link rel="stylesheet" href="/site.css">"#, None)]
#[case::empty_href(r#"<link rel="icon" href="">"#, None)]
#[case::no_links("<html><head><title>x</title></head></html>", None)]
fn test_extract_icon_href(#[case] html: &str, #[case] expected: Option<&str>) {
    assert_eq!(extract_icon_href(html).as_deref(), expected);
}

#[test]
fn test_first_icon_link_wins() {
    let html = r#"
        <link rel="stylesheet" href="/a.css">
        <link rel="icon" href="/first.png">
        <link rel="icon" href="/second.png">
    "#;
    assert_eq!(extract_icon_href(html).as_deref(), Some("/first.png"));
}

#[rstest]
#[case::absolute_path("https://example.com/blog/post", "/favicon.ico", Some("https://example.com/favicon.ico"))]
#[case::relative_path("https://example.com/blog/post", "icon.png", Some("https://example.com/blog/icon.png"))]
#[case::protocol_relative("https://example.com/", "//cdn.example.net/i.ico", Some("https://cdn.example.net/i.ico"))]
#[case::absolute_url("http://example.com/", "https://other.example/i.ico", Some("https://other.example/i.ico"))]
#[case::data_uri("https://example.com/", "data:image/png;base64,AAAA", None)]
fn test_resolve_icon_url(#[case] page: &str, #[case] href: &str, #[case] expected: Option<&str>) {
    let page = Url::parse(page).unwrap();
    let resolved = resolve_icon_url(&page, href);
    assert_eq!(resolved.as_ref().map(Url::as_str), expected);
}

#[test]
fn test_fallback_url_uses_host() {
    let service = FaviconService::new(Duration::from_secs(5)).unwrap();
    let page = Url::parse("https://docs.rs/axum/latest").unwrap();

    assert_eq!(
        service.fallback_url(&page).as_deref(),
        Some("https://www.google.com/s2/favicons?domain=docs.rs&sz=48")
    );
    assert!(DEFAULT_FALLBACK.contains("{host}"));
}

#[test]
fn test_custom_fallback_template() {
    let service = FaviconService::new(Duration::from_secs(1))
        .unwrap()
        .with_fallback("https://icons.example/{host}.ico");
    let page = Url::parse("http://example.org/").unwrap();

    assert_eq!(
        service.fallback_url(&page).as_deref(),
        Some("https://icons.example/example.org.ico")
    );
}

#[tokio::test]
async fn test_fetch_rejects_unparseable_url() {
    let service = FaviconService::new(Duration::from_secs(1)).unwrap();
    let err = service.fetch("not a url").await.unwrap_err();
    assert!(err.to_string().starts_with("Invalid favicon URL"));
}

#[tokio::test]
async fn test_fetch_downloads_linked_icon() {
    let addr = icon_server().await;
    let service = local_service(addr);

    let icon = service.fetch(&format!("http://{}/page", addr)).await.unwrap();
    assert_eq!(icon.content_type, "image/png");
    assert_eq!(icon.data, PNG_BYTES.to_vec());
}

#[rstest]
#[case::page_without_icon("/plain")]
#[case::icon_returns_404("/broken")]
#[case::page_returns_404("/nowhere")]
#[tokio::test]
async fn test_fetch_falls_back_to_service(#[case] path: &str) {
    let addr = icon_server().await;
    let service = local_service(addr);

    let icon = service.fetch(&format!("http://{}{}", addr, path)).await.unwrap();
    assert_eq!(icon.content_type, "image/x-icon");
    assert_eq!(icon.data, b"fallback:127.0.0.1".to_vec());
}

#[tokio::test]
async fn test_fetch_fails_when_fallback_is_not_found() {
    let addr = icon_server().await;
    let service = FaviconService::new(Duration::from_secs(5))
        .unwrap()
        .with_fallback(&format!("http://{}/gone/{{host}}", addr));

    assert!(service.fetch(&format!("http://{}/plain", addr)).await.is_err());
}

#[tokio::test]
async fn test_refresh_stores_fetched_icon() {
    let addr = icon_server().await;
    let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
    let url = format!("http://{}/page", addr);
    let id = {
        let guard = db.lock().unwrap();
        BookmarkManager::new(guard.connection())
            .add_bookmark(&NewBookmark {
                name: "local".to_string(),
                url: url.clone(),
                ..NewBookmark::default()
            })
            .unwrap()
            .id
    };

    refresh_favicon(Arc::clone(&db), Arc::new(local_service(addr)), id, url).await;

    let guard = db.lock().unwrap();
    let icon = FaviconManager::new(guard.connection()).get_favicon(id).unwrap().unwrap();
    assert_eq!(icon.content_type, "image/png");
    assert_eq!(icon.data, PNG_BYTES.to_vec());
}

#[tokio::test]
async fn test_refresh_skips_bookmark_whose_url_changed() {
    let addr = icon_server().await;
    let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
    let id = {
        let guard = db.lock().unwrap();
        BookmarkManager::new(guard.connection())
            .add_bookmark(&NewBookmark {
                name: "moved".to_string(),
                url: "https://elsewhere.example".to_string(),
                ..NewBookmark::default()
            })
            .unwrap()
            .id
    };

    let stale_url = format!("http://{}/page", addr);
    refresh_favicon(Arc::clone(&db), Arc::new(local_service(addr)), id, stale_url).await;

    let guard = db.lock().unwrap();
    assert_eq!(FaviconManager::new(guard.connection()).get_favicon(id).unwrap(), None);
}
