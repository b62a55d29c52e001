//! Shelfmark — a self-hosted bookmark manager with a drag-and-drop folder tree.
//!
//! This library crate exposes all modules for use by the binary and integration tests.

pub mod app;
pub mod database;
pub mod http_server;
pub mod managers;
pub mod services;
pub mod types;
