// Shelfmark state managers
// Managers own all SQL: bookmarks and folders, and the per-bookmark favicon cache.

pub mod bookmark_manager;
pub mod favicon_manager;
