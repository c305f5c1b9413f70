//! One-time migration from the pre-SQLite catalog format: five flat files
//! (`0.db`..`4.db`) sitting next to the database path, each a raw array —
//! fixed-size offset records in `0.db`, then three NUL-terminated string
//! arenas (paths, display names, search text), then one `tuneinfo` struct
//! per track in `4.db`. Mirrors `db_migrate_from_mmap`.

use crate::error::Result;
use crate::model::TuneInfo;
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// Size of one `struct tune0` record in `0.db`: four `u64` byte offsets.
const TUNE0_RECORD_SIZE: usize = 32;
/// Size of one `struct tuneinfo` record in `4.db`, matching the C layout:
/// `int filesize; time_t filedate; short duration; short bitrate;
/// unsigned char genre; unsigned char rating;` packed with the platform's
/// natural alignment (8-byte `time_t`, so 4 bytes of padding after
/// `filesize`).
const TUNEINFO_RECORD_SIZE: usize = 24;

fn legacy_paths(dir: &Path) -> [std::path::PathBuf; 5] {
    std::array::from_fn(|i| dir.join(format!("{i}.db")))
}

fn read_cstr(arena: &[u8], offset: usize) -> Option<&str> {
    let rest = arena.get(offset..)?;
    let len = rest.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&rest[..len]).ok()
}

fn read_tuneinfo(record: &[u8]) -> TuneInfo {
    let filesize = i32::from_ne_bytes(record[0..4].try_into().unwrap()) as u64;
    let filedate = i64::from_ne_bytes(record[8..16].try_into().unwrap());
    let duration = i16::from_ne_bytes(record[16..18].try_into().unwrap()).max(0) as u16;
    let bitrate = i16::from_ne_bytes(record[18..20].try_into().unwrap()).max(0) as u16;
    let genre = record[20];
    let rating = record[21];
    TuneInfo { filesize, filedate, duration, bitrate, genre, rating }
}

/// If the legacy files exist next to `db_path`, migrates every track into
/// `conn` inside one transaction, then deletes the legacy files. Absence of
/// the legacy files is not an error — it's the common case after the first
/// run.
pub fn migrate_if_present(conn: &Connection, db_path: &Path) -> Result<()> {
    let dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let paths = legacy_paths(dir);
    if !paths.iter().all(|p| p.exists()) {
        return Ok(());
    }

    crate::logging::info!("glaciera: found legacy catalog files, migrating to SQLite...");

    let offsets = fs::read(&paths[0])?;
    let path_arena = fs::read(&paths[1])?;
    let display_arena = fs::read(&paths[2])?;
    let search_arena = fs::read(&paths[3])?;
    let tuneinfo_blob = fs::read(&paths[4])?;

    let count = offsets.len() / TUNE0_RECORD_SIZE;
    crate::catalog::ensure_schema(conn)?;

    let tx_needed = count > 0;
    if tx_needed {
        conn.execute_batch("BEGIN TRANSACTION")?;
    }
    let mut migrated = 0;
    for i in 0..count {
        let rec = &offsets[i * TUNE0_RECORD_SIZE..(i + 1) * TUNE0_RECORD_SIZE];
        let p1 = u64::from_ne_bytes(rec[0..8].try_into().unwrap()) as usize;
        let p2 = u64::from_ne_bytes(rec[8..16].try_into().unwrap()) as usize;
        let p3 = u64::from_ne_bytes(rec[16..24].try_into().unwrap()) as usize;

        let (Some(path), Some(display), Some(search)) = (
            read_cstr(&path_arena, p1),
            read_cstr(&display_arena, p2),
            read_cstr(&search_arena, p3),
        ) else {
            continue;
        };

        let ti_offset = i * TUNEINFO_RECORD_SIZE;
        let Some(ti_record) = tuneinfo_blob.get(ti_offset..ti_offset + TUNEINFO_RECORD_SIZE) else {
            continue;
        };
        let ti = read_tuneinfo(ti_record);

        conn.execute(
            "INSERT OR IGNORE INTO tracks (filepath, display_name, search_text, filesize, \
             filedate, duration, bitrate, genre, rating, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, strftime('%s','now'))",
            rusqlite::params![
                path,
                display,
                search,
                ti.filesize as i64,
                ti.filedate,
                ti.duration as i64,
                ti.bitrate as i64,
                ti.genre as i64,
                ti.rating as i64,
            ],
        )?;
        migrated += 1;
    }
    if tx_needed {
        conn.execute_batch("COMMIT")?;
    }

    for path in &paths {
        let _ = fs::remove_file(path);
    }

    crate::logging::info!("glaciera: migrated {migrated} tracks from the legacy catalog format");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_legacy_fixture(dir: &Path, entries: &[(&str, &str, &str, TuneInfo)]) {
        let mut offsets = Vec::new();
        let mut paths = Vec::new();
        let mut displays = Vec::new();
        let mut searches = Vec::new();
        let mut tuneinfos = Vec::new();

        for (path, display, search, ti) in entries {
            offsets.extend_from_slice(&(paths.len() as u64).to_ne_bytes());
            offsets.extend_from_slice(&(displays.len() as u64).to_ne_bytes());
            offsets.extend_from_slice(&(searches.len() as u64).to_ne_bytes());
            offsets.extend_from_slice(&0u64.to_ne_bytes()); // p4, unused

            paths.extend_from_slice(path.as_bytes());
            paths.push(0);
            displays.extend_from_slice(display.as_bytes());
            displays.push(0);
            searches.extend_from_slice(search.as_bytes());
            searches.push(0);

            let mut rec = [0u8; TUNEINFO_RECORD_SIZE];
            rec[0..4].copy_from_slice(&(ti.filesize as i32).to_ne_bytes());
            rec[8..16].copy_from_slice(&ti.filedate.to_ne_bytes());
            rec[16..18].copy_from_slice(&(ti.duration as i16).to_ne_bytes());
            rec[18..20].copy_from_slice(&(ti.bitrate as i16).to_ne_bytes());
            rec[20] = ti.genre;
            rec[21] = ti.rating;
            tuneinfos.extend_from_slice(&rec);
        }

        fs::write(dir.join("0.db"), offsets).unwrap();
        fs::write(dir.join("1.db"), paths).unwrap();
        fs::write(dir.join("2.db"), displays).unwrap();
        fs::write(dir.join("3.db"), searches).unwrap();
        fs::write(dir.join("4.db"), tuneinfos).unwrap();
    }

    #[test]
    fn migrates_legacy_fixture_into_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let ti = TuneInfo { filesize: 12345, filedate: 1000, duration: 200, bitrate: 128, genre: 9, rating: 3 };
        write_legacy_fixture(dir.path(), &[("/music/a.mp3", "A Song", "ASONG", ti)]);

        let conn = Connection::open_in_memory().unwrap();
        migrate_if_present(&conn, &dir.path().join("catalog.db")).unwrap();

        let count: i64 = conn.query_row("SELECT COUNT(*) FROM tracks", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
        assert!(!dir.path().join("0.db").exists());
    }

    #[test]
    fn absent_legacy_files_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let conn = Connection::open_in_memory().unwrap();
        migrate_if_present(&conn, &dir.path().join("catalog.db")).unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='tracks'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(count, 0);
    }
}
