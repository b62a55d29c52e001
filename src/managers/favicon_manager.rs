//! Favicon storage for Shelfmark.
//!
//! Icons are cached per bookmark in the `favicons` table and are replaced
//! wholesale whenever a fresh fetch succeeds.

use rusqlite::{params, Connection, OptionalExtension};

use crate::types::bookmark::Favicon;
use crate::types::errors::BookmarkError;

/// Trait defining favicon cache operations.
pub trait FaviconManagerTrait {
    fn store_favicon(&mut self, bookmark_id: i64, source_url: &str, favicon: &Favicon) -> Result<bool, BookmarkError>;
    fn get_favicon(&self, bookmark_id: i64) -> Result<Option<Favicon>, BookmarkError>;
}

/// Favicon manager backed by a SQLite connection.
pub struct FaviconManager<'a> {
    conn: &'a Connection,
}

impl<'a> FaviconManager<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl<'a> FaviconManagerTrait for FaviconManager<'a> {
    /// Stores the icon fetched for `source_url`, replacing any previous one.
    ///
    /// Returns `false` and writes nothing when the bookmark's URL has changed
    /// since the fetch started. A bookmark deleted in the meantime is `NotFound`.
    fn store_favicon(&mut self, bookmark_id: i64, source_url: &str, favicon: &Favicon) -> Result<bool, BookmarkError> {
        let tx = self.conn.unchecked_transaction()?;
        let current: Option<String> = tx
            .query_row(
                "SELECT url FROM bookmarks WHERE id = ?1",
                params![bookmark_id],
                |row| row.get(0),
            )
            .optional()?;
        match current {
            None => return Err(BookmarkError::NotFound(format!("bookmark {}", bookmark_id))),
            Some(url) if url != source_url => return Ok(false),
            Some(_) => {}
        }
        tx.execute(
            "INSERT OR REPLACE INTO favicons (content_type, favicon, bookmark_id) VALUES (?1, ?2, ?3)",
            params![favicon.content_type, favicon.data, bookmark_id],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn get_favicon(&self, bookmark_id: i64) -> Result<Option<Favicon>, BookmarkError> {
        let favicon = self
            .conn
            .query_row(
                "SELECT content_type, favicon FROM favicons WHERE bookmark_id = ?1 LIMIT 1",
                params![bookmark_id],
                |row| {
                    Ok(Favicon {
                        content_type: row.get(0)?,
                        data: row.get::<_, Option<Vec<u8>>>(1)?.unwrap_or_default(),
                    })
                },
            )
            .optional()?;
        Ok(favicon)
    }
}
