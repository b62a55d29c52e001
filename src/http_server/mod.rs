//! # Shelfmark HTTP Server Module
//!
//! axum-based JSON API plus the static frontend.
//!
//! # Endpoints
//!
//! - `/health` - Health check
//! - `/api/*` - Bookmark and folder operations, favicons
//! - `/sw.js` - Offline cache worker script
//! - `/static/*` - Frontend assets

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::HttpServer;
