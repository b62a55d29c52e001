use serde::{Deserialize, Serialize};

/// Represents a saved bookmark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub folder_id: Option<i64>,
    pub position: i64,
}

/// Represents a folder for organizing bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: i64,
    pub name: String,
    pub parent_id: Option<i64>,
    pub is_open: bool,
    pub position: i64,
}

/// Every folder and bookmark, ordered by parent then position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    pub folders: Vec<Folder>,
    pub bookmarks: Vec<Bookmark>,
}

/// The two kinds of node in the tree. Each kind keeps its own sibling sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Folder,
    Bookmark,
}

impl ItemKind {
    /// Parses the plural path segment used by the HTTP API.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "folders" => Some(ItemKind::Folder),
            "bookmarks" => Some(ItemKind::Bookmark),
            _ => None,
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            ItemKind::Folder => "folders",
            ItemKind::Bookmark => "bookmarks",
        }
    }

    pub fn parent_column(self) -> &'static str {
        match self {
            ItemKind::Folder => "parent_id",
            ItemKind::Bookmark => "folder_id",
        }
    }

    /// Singular name used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Folder => "folder",
            ItemKind::Bookmark => "bookmark",
        }
    }
}

/// Input for creating a bookmark.
#[derive(Debug, Clone, Default)]
pub struct NewBookmark {
    pub name: String,
    pub url: String,
    pub folder_id: Option<i64>,
    /// Requested slot among siblings; appended last when `None`.
    pub position: Option<i64>,
}

/// Input for creating a folder.
#[derive(Debug, Clone, Default)]
pub struct NewFolder {
    pub name: String,
    pub parent_id: Option<i64>,
    pub position: Option<i64>,
}

/// Partial bookmark update. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct BookmarkUpdate {
    pub name: Option<String>,
    pub url: Option<String>,
    /// `Some(parent)` moves the bookmark to the end of `parent` (`None` = root).
    pub folder_id: Option<Option<i64>>,
}

/// Partial folder update.
#[derive(Debug, Clone, Default)]
pub struct FolderUpdate {
    pub name: Option<String>,
    pub is_open: Option<bool>,
    /// `Some(parent)` moves the folder to the end of `parent` (`None` = root).
    pub parent_id: Option<Option<i64>>,
}

/// A stored site icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Favicon {
    pub content_type: String,
    pub data: Vec<u8>,
}
