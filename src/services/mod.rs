// Shelfmark services
// Services hold logic that is not plain SQL: favicon fetching, the offline cache policy, settings.

pub mod favicon_service;
pub mod offline_cache;
pub mod settings_engine;
