//! The catalog store (§4.4): a SQLite-backed table of tracks, replacing the
//! original's five-file fixed-offset mmap arena with one `tracks` table
//! indexed the same way the original indexed each field individually.

pub mod legacy;

use crate::error::Result;
use crate::model::{Track, TuneInfo};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// Creates the `tracks` table and its indices if absent. Exposed so the
/// legacy migration can populate the table before `CatalogStore::open`
/// would normally create it.
pub(crate) fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS tracks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    filepath TEXT NOT NULL UNIQUE,
    display_name TEXT NOT NULL,
    search_text TEXT NOT NULL,
    filesize INTEGER NOT NULL,
    filedate INTEGER NOT NULL,
    duration INTEGER NOT NULL,
    bitrate INTEGER NOT NULL,
    genre INTEGER NOT NULL,
    rating INTEGER NOT NULL,
    created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
);
CREATE INDEX IF NOT EXISTS idx_tracks_filepath ON tracks(filepath);
CREATE INDEX IF NOT EXISTS idx_tracks_display_name ON tracks(display_name);
CREATE INDEX IF NOT EXISTS idx_tracks_search_text ON tracks(search_text);
CREATE INDEX IF NOT EXISTS idx_tracks_filesize ON tracks(filesize);
CREATE INDEX IF NOT EXISTS idx_tracks_filedate ON tracks(filedate);
CREATE INDEX IF NOT EXISTS idx_tracks_genre ON tracks(genre);
CREATE INDEX IF NOT EXISTS idx_tracks_rating ON tracks(rating);
";

/// A connection to the catalog's SQLite database, plus the small set of
/// operations the indexer and player need.
pub struct CatalogStore {
    conn: Connection,
}

impl CatalogStore {
    /// Opens (creating if absent) the database at `path`, runs the legacy
    /// mmap-format migration if the old `0.db`..`4.db` files are found
    /// alongside it, then ensures the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        legacy::migrate_if_present(&conn, path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// True if a row with this path already exists.
    pub fn track_exists(&self, filepath: &Path) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tracks WHERE filepath = ?1",
            params![filepath.to_string_lossy()],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Row id for `filepath`, if present.
    pub fn id_for_path(&self, filepath: &Path) -> Result<Option<i64>> {
        self.conn
            .query_row(
                "SELECT id FROM tracks WHERE filepath = ?1",
                params![filepath.to_string_lossy()],
                |row| row.get(0),
            )
            .optional()
            .map_err(Into::into)
    }

    /// Inserts a new row, returning its assigned id.
    pub fn insert_track(
        &self,
        filepath: &Path,
        display_name: &str,
        search_text: &str,
        ti: &TuneInfo,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO tracks (filepath, display_name, search_text, filesize, filedate, \
             duration, bitrate, genre, rating, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, strftime('%s','now'))",
            params![
                filepath.to_string_lossy(),
                display_name,
                search_text,
                ti.filesize as i64,
                ti.filedate,
                ti.duration as i64,
                ti.bitrate as i64,
                ti.genre as i64,
                ti.rating as i64,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Updates an existing row by id.
    pub fn update_track(
        &self,
        id: i64,
        filepath: &Path,
        display_name: &str,
        search_text: &str,
        ti: &TuneInfo,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE tracks SET filepath=?1, display_name=?2, search_text=?3, filesize=?4, \
             filedate=?5, duration=?6, bitrate=?7, genre=?8, rating=?9, \
             updated_at=strftime('%s','now') WHERE id=?10",
            params![
                filepath.to_string_lossy(),
                display_name,
                search_text,
                ti.filesize as i64,
                ti.filedate,
                ti.duration as i64,
                ti.bitrate as i64,
                ti.genre as i64,
                ti.rating as i64,
                id,
            ],
        )?;
        Ok(())
    }

    /// Inserts if `filepath` is new, otherwise updates the existing row.
    /// Runs both branches inside the caller's transaction when called from
    /// [`Self::upsert_batch`].
    pub fn upsert(&self, filepath: &Path, display_name: &str, search_text: &str, ti: &TuneInfo) -> Result<()> {
        match self.id_for_path(filepath)? {
            Some(id) => self.update_track(id, filepath, display_name, search_text, ti),
            None => self.insert_track(filepath, display_name, search_text, ti).map(|_| ()),
        }
    }

    /// Deletes a row by id.
    pub fn delete_track(&self, id: i64) -> Result<()> {
        self.conn.execute("DELETE FROM tracks WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Total row count.
    pub fn track_count(&self) -> Result<i64> {
        self.conn.query_row("SELECT COUNT(*) FROM tracks", [], |row| row.get(0)).map_err(Into::into)
    }

    /// Substring search across `filepath`, `display_name`, and
    /// `search_text`, ordered by display name (§4.2). Mirrors
    /// `db_search_tracks`'s single `LIKE ... OR LIKE ... OR LIKE ...` query
    /// wrapped in `%…%` wildcards; an empty query matches every row, same
    /// as the original falling back to `db_search_tracks("", count)`.
    pub fn search(&self, query: &str) -> Result<Vec<Track>> {
        let pattern = format!("%{query}%");
        let mut stmt = self.conn.prepare(
            "SELECT id, filepath, display_name, search_text, filesize, filedate, duration, \
             bitrate, genre, rating, created_at, updated_at FROM tracks \
             WHERE filepath LIKE ?1 OR display_name LIKE ?1 OR search_text LIKE ?1 \
             ORDER BY display_name",
        )?;
        let rows = stmt.query_map(params![pattern], row_to_track)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Loads every row, ordered by display name — the snapshot the
    /// in-memory catalog (`library`) builds its indices from at startup.
    pub fn load_all(&self) -> Result<Vec<Track>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, filepath, display_name, search_text, filesize, filedate, duration, \
             bitrate, genre, rating, created_at, updated_at FROM tracks ORDER BY display_name",
        )?;
        let rows = stmt.query_map([], row_to_track)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
    }

    /// Runs `f` once per scanned file inside a single transaction, the way
    /// `db_begin_transaction`/`db_commit_transaction` wrap a whole scan —
    /// batching writes avoids an fsync per file.
    pub fn with_transaction<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&Connection) -> Result<()>,
    {
        let tx = self.conn.unchecked_transaction()?;
        f(&tx)?;
        tx.commit()?;
        Ok(())
    }
}

fn row_to_track(row: &rusqlite::Row) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        path: std::path::PathBuf::from(row.get::<_, String>(1)?),
        display: row.get(2)?,
        search: row.get(3)?,
        tuneinfo: TuneInfo {
            filesize: row.get::<_, i64>(4)? as u64,
            filedate: row.get(5)?,
            duration: row.get::<_, i64>(6)? as u16,
            bitrate: row.get::<_, i64>(7)? as u16,
            genre: row.get::<_, i64>(8)? as u8,
            rating: row.get::<_, i64>(9)? as u8,
        },
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_ti() -> TuneInfo {
        TuneInfo { filesize: 1000, filedate: 0, duration: 180, bitrate: 128, genre: 0xff, rating: 0 }
    }

    #[test]
    fn insert_then_exists() {
        let store = CatalogStore::open_in_memory().unwrap();
        let path = PathBuf::from("/music/a.mp3");
        store.insert_track(&path, "A", "A", &sample_ti()).unwrap();
        assert!(store.track_exists(&path).unwrap());
        assert_eq!(store.track_count().unwrap(), 1);
    }

    #[test]
    fn insert_duplicate_path_fails_unique_constraint() {
        let store = CatalogStore::open_in_memory().unwrap();
        let path = PathBuf::from("/music/a.mp3");
        store.insert_track(&path, "A", "A", &sample_ti()).unwrap();
        assert!(store.insert_track(&path, "A2", "A2", &sample_ti()).is_err());
    }

    #[test]
    fn upsert_updates_existing_row_in_place() {
        let store = CatalogStore::open_in_memory().unwrap();
        let path = PathBuf::from("/music/a.mp3");
        store.upsert(&path, "A", "A", &sample_ti()).unwrap();
        let mut ti2 = sample_ti();
        ti2.duration = 200;
        store.upsert(&path, "A renamed", "ARENAMED", &ti2).unwrap();
        assert_eq!(store.track_count().unwrap(), 1);
        let all = store.load_all().unwrap();
        assert_eq!(all[0].display, "A renamed");
        assert_eq!(all[0].tuneinfo.duration, 200);
    }

    #[test]
    fn load_all_orders_by_display_name() {
        let store = CatalogStore::open_in_memory().unwrap();
        store.insert_track(&PathBuf::from("/b.mp3"), "Zed", "ZED", &sample_ti()).unwrap();
        store.insert_track(&PathBuf::from("/a.mp3"), "Abc", "ABC", &sample_ti()).unwrap();
        let all = store.load_all().unwrap();
        assert_eq!(all[0].display, "Abc");
        assert_eq!(all[1].display, "Zed");
    }

    #[test]
    fn delete_removes_row() {
        let store = CatalogStore::open_in_memory().unwrap();
        let path = PathBuf::from("/music/a.mp3");
        let id = store.insert_track(&path, "A", "A", &sample_ti()).unwrap();
        store.delete_track(id).unwrap();
        assert!(!store.track_exists(&path).unwrap());
    }

    #[test]
    fn search_matches_filepath_display_or_search_text() {
        let store = CatalogStore::open_in_memory().unwrap();
        store.insert_track(&PathBuf::from("/music/Disc1/song.mp3"), "My Song", "MYSONG", &sample_ti()).unwrap();
        store.insert_track(&PathBuf::from("/music/Disc2/other.mp3"), "Other", "OTHER", &sample_ti()).unwrap();

        assert_eq!(store.search("song").unwrap().len(), 1);
        assert_eq!(store.search("Disc2").unwrap().len(), 1);
        assert_eq!(store.search("OTHER").unwrap()[0].display, "Other");
    }

    #[test]
    fn search_with_empty_query_matches_every_row() {
        let store = CatalogStore::open_in_memory().unwrap();
        store.insert_track(&PathBuf::from("/b.mp3"), "Zed", "ZED", &sample_ti()).unwrap();
        store.insert_track(&PathBuf::from("/a.mp3"), "Abc", "ABC", &sample_ti()).unwrap();
        let all = store.search("").unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].display, "Abc");
    }
}
