//! Bookmark Manager for Shelfmark.
//!
//! Implements `BookmarkManagerTrait`: CRUD, move and reorder for bookmarks and
//! folders, backed by SQLite via `rusqlite`.
//!
//! Every write runs inside a single transaction and re-derives the affected
//! sibling sequences as `0..n-1`, so no two siblings of the same kind ever share
//! a position. Deleting a folder cascades to every descendant folder, bookmark
//! and favicon.

use std::collections::HashSet;

use reqwest::Url;
use rusqlite::{params, Connection, OptionalExtension};

use crate::types::bookmark::{
    Bookmark, BookmarkUpdate, Folder, FolderUpdate, ItemKind, NewBookmark, NewFolder, Tree,
};
use crate::types::errors::BookmarkError;

/// Trait defining bookmark and folder management operations.
pub trait BookmarkManagerTrait {
    fn list_tree(&self) -> Result<Tree, BookmarkError>;
    fn get_bookmark(&self, id: i64) -> Result<Bookmark, BookmarkError>;
    fn get_folder(&self, id: i64) -> Result<Folder, BookmarkError>;
    fn add_bookmark(&mut self, new: &NewBookmark) -> Result<Bookmark, BookmarkError>;
    fn create_folder(&mut self, new: &NewFolder) -> Result<Folder, BookmarkError>;
    fn update_bookmark(&mut self, id: i64, update: &BookmarkUpdate) -> Result<Bookmark, BookmarkError>;
    fn update_folder(&mut self, id: i64, update: &FolderUpdate) -> Result<Folder, BookmarkError>;
    fn delete_bookmark(&mut self, id: i64) -> Result<(), BookmarkError>;
    /// Deletes the folder together with its whole subtree.
    fn delete_folder(&mut self, id: i64) -> Result<(), BookmarkError>;
    fn move_bookmark(&mut self, id: i64, folder_id: Option<i64>, position: Option<i64>) -> Result<Bookmark, BookmarkError>;
    fn move_folder(&mut self, id: i64, parent_id: Option<i64>, position: Option<i64>) -> Result<Folder, BookmarkError>;
    /// Puts `ids` first, in the given order, among their siblings.
    fn reorder(&mut self, kind: ItemKind, ids: &[i64]) -> Result<(), BookmarkError>;
}

/// Selects the ids of folder `?1` and all of its descendants.
const SUBTREE_CTE: &str = "WITH RECURSIVE subtree(id) AS (
         SELECT ?1
         UNION
         SELECT f.id FROM folders f JOIN subtree s ON f.parent_id = s.id
     )";

/// Bookmark manager backed by a SQLite connection.
pub struct BookmarkManager<'a> {
    conn: &'a Connection,
}

impl<'a> BookmarkManager<'a> {
    /// Creates a new `BookmarkManager` using the provided database connection.
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        Ok(Bookmark {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            folder_id: row.get(3)?,
            position: row.get(4)?,
        })
    }

    /// Reads a single `Folder` row into a struct.
    fn row_to_folder(row: &rusqlite::Row) -> rusqlite::Result<Folder> {
        Ok(Folder {
            id: row.get(0)?,
            name: row.get(1)?,
            parent_id: row.get(2)?,
            is_open: row.get(3)?,
            position: row.get(4)?,
        })
    }

    fn find_bookmark(conn: &Connection, id: i64) -> Result<Bookmark, BookmarkError> {
        conn.query_row(
            "SELECT id, name, url, folder_id, position FROM bookmarks WHERE id = ?1",
            params![id],
            Self::row_to_bookmark,
        )
        .optional()?
        .ok_or_else(|| BookmarkError::NotFound(format!("bookmark {}", id)))
    }

    fn find_folder(conn: &Connection, id: i64) -> Result<Folder, BookmarkError> {
        conn.query_row(
            "SELECT id, name, parent_id, is_open, position FROM folders WHERE id = ?1",
            params![id],
            Self::row_to_folder,
        )
        .optional()?
        .ok_or_else(|| BookmarkError::NotFound(format!("folder {}", id)))
    }

    /// Fails with `Validation` when a non-null parent does not reference a folder.
    fn ensure_parent_exists(conn: &Connection, parent_id: Option<i64>) -> Result<(), BookmarkError> {
        if let Some(pid) = parent_id {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM folders WHERE id = ?1",
                params![pid],
                |row| row.get(0),
            )?;
            if count == 0 {
                return Err(BookmarkError::Validation(format!(
                    "parent folder {} does not exist",
                    pid
                )));
            }
        }
        Ok(())
    }

    /// Returns true when `candidate` is `folder_id` itself or one of its descendants.
    fn is_in_subtree(conn: &Connection, folder_id: i64, candidate: i64) -> Result<bool, BookmarkError> {
        let count: i64 = conn.query_row(
            &format!("{SUBTREE_CTE} SELECT COUNT(*) FROM subtree WHERE id = ?2"),
            params![folder_id, candidate],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Sibling ids of `kind` under `parent_id`, in display order.
    fn sibling_ids(conn: &Connection, kind: ItemKind, parent_id: Option<i64>) -> Result<Vec<i64>, BookmarkError> {
        let mut stmt = conn.prepare(&format!(
            "SELECT id FROM {} WHERE {} IS ?1 ORDER BY position, id",
            kind.table(),
            kind.parent_column()
        ))?;
        let rows = stmt.query_map(params![parent_id], |row| row.get::<_, i64>(0))?;
        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    /// Writes `ids` back as positions `0..n-1`.
    fn write_order(conn: &Connection, kind: ItemKind, ids: &[i64]) -> Result<(), BookmarkError> {
        let mut stmt = conn.prepare(&format!(
            "UPDATE {} SET position = ?1 WHERE id = ?2",
            kind.table()
        ))?;
        for (position, id) in ids.iter().enumerate() {
            stmt.execute(params![position as i64, id])?;
        }
        Ok(())
    }

    fn renumber(conn: &Connection, kind: ItemKind, parent_id: Option<i64>) -> Result<(), BookmarkError> {
        let ids = Self::sibling_ids(conn, kind, parent_id)?;
        Self::write_order(conn, kind, &ids)
    }

    /// Places `id` among its siblings under `parent_id`, at `position` (clamped) or last.
    fn place(
        conn: &Connection,
        kind: ItemKind,
        id: i64,
        parent_id: Option<i64>,
        position: Option<i64>,
    ) -> Result<(), BookmarkError> {
        let mut ids = Self::sibling_ids(conn, kind, parent_id)?;
        ids.retain(|&sibling| sibling != id);
        let index = clamp_position(position, ids.len());
        ids.insert(index, id);
        Self::write_order(conn, kind, &ids)
    }

    /// Reparents and repositions a bookmark, closing the gap it leaves behind.
    fn relocate_bookmark(
        conn: &Connection,
        current: &Bookmark,
        folder_id: Option<i64>,
        position: Option<i64>,
    ) -> Result<(), BookmarkError> {
        Self::ensure_parent_exists(conn, folder_id)?;
        conn.execute(
            "UPDATE bookmarks SET folder_id = ?1 WHERE id = ?2",
            params![folder_id, current.id],
        )?;
        Self::place(conn, ItemKind::Bookmark, current.id, folder_id, position)?;
        if current.folder_id != folder_id {
            Self::renumber(conn, ItemKind::Bookmark, current.folder_id)?;
        }
        Ok(())
    }

    /// Reparents and repositions a folder. Rejects moves into its own subtree.
    fn relocate_folder(
        conn: &Connection,
        current: &Folder,
        parent_id: Option<i64>,
        position: Option<i64>,
    ) -> Result<(), BookmarkError> {
        Self::ensure_parent_exists(conn, parent_id)?;
        if let Some(pid) = parent_id {
            if Self::is_in_subtree(conn, current.id, pid)? {
                return Err(BookmarkError::Validation(format!(
                    "cannot move folder {} into itself or its descendant {}",
                    current.id, pid
                )));
            }
        }
        conn.execute(
            "UPDATE folders SET parent_id = ?1 WHERE id = ?2",
            params![parent_id, current.id],
        )?;
        Self::place(conn, ItemKind::Folder, current.id, parent_id, position)?;
        if current.parent_id != parent_id {
            Self::renumber(conn, ItemKind::Folder, current.parent_id)?;
        }
        Ok(())
    }

    fn parent_of(conn: &Connection, kind: ItemKind, id: i64) -> Result<Option<i64>, BookmarkError> {
        conn.query_row(
            &format!(
                "SELECT {} FROM {} WHERE id = ?1",
                kind.parent_column(),
                kind.table()
            ),
            params![id],
            |row| row.get::<_, Option<i64>>(0),
        )
        .optional()?
        .ok_or_else(|| BookmarkError::NotFound(format!("{} {}", kind.label(), id)))
    }
}

/// Maps a client-requested slot onto `0..=len`; `None` means append.
fn clamp_position(position: Option<i64>, len: usize) -> usize {
    match position {
        Some(p) if p <= 0 => 0,
        Some(p) => usize::try_from(p).map_or(len, |p| p.min(len)),
        None => len,
    }
}

/// Trims and rejects empty display names.
pub fn validate_name(name: &str) -> Result<String, BookmarkError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BookmarkError::Validation("name must not be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Accepts absolute `http`/`https` URLs with a host.
pub fn validate_url(url: &str) -> Result<String, BookmarkError> {
    let trimmed = url.trim();
    let parsed = Url::parse(trimmed)
        .map_err(|e| BookmarkError::Validation(format!("malformed url '{}': {}", trimmed, e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(BookmarkError::Validation(format!(
            "unsupported url scheme '{}': must be http or https",
            parsed.scheme()
        )));
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(BookmarkError::Validation(format!("url '{}' has no host", trimmed)));
    }
    Ok(trimmed.to_string())
}

impl<'a> BookmarkManagerTrait for BookmarkManager<'a> {
    fn list_tree(&self) -> Result<Tree, BookmarkError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, parent_id, is_open, position FROM folders \
             ORDER BY parent_id, position, id",
        )?;
        let rows = stmt.query_map([], Self::row_to_folder)?;
        let mut folders = Vec::new();
        for row in rows {
            folders.push(row?);
        }

        let mut stmt = self.conn.prepare(
            "SELECT id, name, url, folder_id, position FROM bookmarks \
             ORDER BY folder_id, position, id",
        )?;
        let rows = stmt.query_map([], Self::row_to_bookmark)?;
        let mut bookmarks = Vec::new();
        for row in rows {
            bookmarks.push(row?);
        }

        Ok(Tree { folders, bookmarks })
    }

    fn get_bookmark(&self, id: i64) -> Result<Bookmark, BookmarkError> {
        Self::find_bookmark(self.conn, id)
    }

    fn get_folder(&self, id: i64) -> Result<Folder, BookmarkError> {
        Self::find_folder(self.conn, id)
    }

    fn add_bookmark(&mut self, new: &NewBookmark) -> Result<Bookmark, BookmarkError> {
        let name = validate_name(&new.name)?;
        let url = validate_url(&new.url)?;

        let tx = self.conn.unchecked_transaction()?;
        Self::ensure_parent_exists(&tx, new.folder_id)?;
        let count = Self::sibling_ids(&tx, ItemKind::Bookmark, new.folder_id)?.len() as i64;
        tx.execute(
            "INSERT INTO bookmarks (name, url, folder_id, position) VALUES (?1, ?2, ?3, ?4)",
            params![name, url, new.folder_id, count],
        )?;
        let id = tx.last_insert_rowid();
        if new.position.is_some() {
            Self::place(&tx, ItemKind::Bookmark, id, new.folder_id, new.position)?;
        }
        let bookmark = Self::find_bookmark(&tx, id)?;
        tx.commit()?;
        Ok(bookmark)
    }

    fn create_folder(&mut self, new: &NewFolder) -> Result<Folder, BookmarkError> {
        let name = validate_name(&new.name)?;

        let tx = self.conn.unchecked_transaction()?;
        Self::ensure_parent_exists(&tx, new.parent_id)?;
        let count = Self::sibling_ids(&tx, ItemKind::Folder, new.parent_id)?.len() as i64;
        tx.execute(
            "INSERT INTO folders (name, parent_id, is_open, position) VALUES (?1, ?2, 0, ?3)",
            params![name, new.parent_id, count],
        )?;
        let id = tx.last_insert_rowid();
        if new.position.is_some() {
            Self::place(&tx, ItemKind::Folder, id, new.parent_id, new.position)?;
        }
        let folder = Self::find_folder(&tx, id)?;
        tx.commit()?;
        Ok(folder)
    }

    fn update_bookmark(&mut self, id: i64, update: &BookmarkUpdate) -> Result<Bookmark, BookmarkError> {
        let name = update.name.as_deref().map(validate_name).transpose()?;
        let url = update.url.as_deref().map(validate_url).transpose()?;

        let tx = self.conn.unchecked_transaction()?;
        let current = Self::find_bookmark(&tx, id)?;
        if let Some(name) = name {
            tx.execute("UPDATE bookmarks SET name = ?1 WHERE id = ?2", params![name, id])?;
        }
        if let Some(url) = url {
            tx.execute("UPDATE bookmarks SET url = ?1 WHERE id = ?2", params![url, id])?;
        }
        if let Some(folder_id) = update.folder_id {
            Self::relocate_bookmark(&tx, &current, folder_id, None)?;
        }
        let bookmark = Self::find_bookmark(&tx, id)?;
        tx.commit()?;
        Ok(bookmark)
    }

    fn update_folder(&mut self, id: i64, update: &FolderUpdate) -> Result<Folder, BookmarkError> {
        let name = update.name.as_deref().map(validate_name).transpose()?;

        let tx = self.conn.unchecked_transaction()?;
        let current = Self::find_folder(&tx, id)?;
        if let Some(name) = name {
            tx.execute("UPDATE folders SET name = ?1 WHERE id = ?2", params![name, id])?;
        }
        if let Some(is_open) = update.is_open {
            tx.execute("UPDATE folders SET is_open = ?1 WHERE id = ?2", params![is_open, id])?;
        }
        if let Some(parent_id) = update.parent_id {
            Self::relocate_folder(&tx, &current, parent_id, None)?;
        }
        let folder = Self::find_folder(&tx, id)?;
        tx.commit()?;
        Ok(folder)
    }

    fn delete_bookmark(&mut self, id: i64) -> Result<(), BookmarkError> {
        let tx = self.conn.unchecked_transaction()?;
        let bookmark = Self::find_bookmark(&tx, id)?;
        tx.execute("DELETE FROM favicons WHERE bookmark_id = ?1", params![id])?;
        tx.execute("DELETE FROM bookmarks WHERE id = ?1", params![id])?;
        Self::renumber(&tx, ItemKind::Bookmark, bookmark.folder_id)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_folder(&mut self, id: i64) -> Result<(), BookmarkError> {
        let tx = self.conn.unchecked_transaction()?;
        let folder = Self::find_folder(&tx, id)?;

        tx.execute(
            &format!(
                "{SUBTREE_CTE} DELETE FROM favicons WHERE bookmark_id IN \
                 (SELECT b.id FROM bookmarks b WHERE b.folder_id IN (SELECT id FROM subtree))"
            ),
            params![id],
        )?;
        let bookmarks = tx.execute(
            &format!("{SUBTREE_CTE} DELETE FROM bookmarks WHERE folder_id IN (SELECT id FROM subtree)"),
            params![id],
        )?;
        let folders = tx.execute(
            &format!("{SUBTREE_CTE} DELETE FROM folders WHERE id IN (SELECT id FROM subtree)"),
            params![id],
        )?;
        Self::renumber(&tx, ItemKind::Folder, folder.parent_id)?;
        tx.commit()?;

        tracing::debug!(folder_id = id, folders, bookmarks, "deleted folder subtree");
        Ok(())
    }

    fn move_bookmark(&mut self, id: i64, folder_id: Option<i64>, position: Option<i64>) -> Result<Bookmark, BookmarkError> {
        let tx = self.conn.unchecked_transaction()?;
        let current = Self::find_bookmark(&tx, id)?;
        Self::relocate_bookmark(&tx, &current, folder_id, position)?;
        let bookmark = Self::find_bookmark(&tx, id)?;
        tx.commit()?;
        Ok(bookmark)
    }

    fn move_folder(&mut self, id: i64, parent_id: Option<i64>, position: Option<i64>) -> Result<Folder, BookmarkError> {
        let tx = self.conn.unchecked_transaction()?;
        let current = Self::find_folder(&tx, id)?;
        Self::relocate_folder(&tx, &current, parent_id, position)?;
        let folder = Self::find_folder(&tx, id)?;
        tx.commit()?;
        Ok(folder)
    }

    fn reorder(&mut self, kind: ItemKind, ids: &[i64]) -> Result<(), BookmarkError> {
        let Some(&first) = ids.first() else {
            return Ok(());
        };
        let mut seen = HashSet::new();
        if let Some(dup) = ids.iter().find(|id| !seen.insert(**id)) {
            return Err(BookmarkError::Conflict(format!(
                "{} {} listed more than once",
                kind.label(),
                dup
            )));
        }

        let tx = self.conn.unchecked_transaction()?;
        let parent_id = Self::parent_of(&tx, kind, first)?;
        for &id in &ids[1..] {
            if Self::parent_of(&tx, kind, id)? != parent_id {
                return Err(BookmarkError::Conflict(format!(
                    "{label} {} is not a sibling of {label} {}",
                    id,
                    first,
                    label = kind.label()
                )));
            }
        }

        let mut order = ids.to_vec();
        for sibling in Self::sibling_ids(&tx, kind, parent_id)? {
            if !seen.contains(&sibling) {
                order.push(sibling);
            }
        }
        Self::write_order(&tx, kind, &order)?;
        tx.commit()?;
        Ok(())
    }
}
