//! The indexer: walks configured (or argv-supplied) roots, probes each
//! music file's container header, and upserts the result into the catalog
//! store. Mirrors `glaciera-indexer.c`'s `main`.

use clap::Parser;
use glaciera::catalog::CatalogStore;
use glaciera::config::Config;
use glaciera::logging::{error, info};
use glaciera::scanner;
use std::path::PathBuf;
use std::time::Instant;

/// Database builder for the glaciera jukebox.
#[derive(Parser, Debug)]
#[command(name = "glaciera-indexer", version)]
struct Cli {
    /// Generate a flat-text index alongside the database, for compatibility
    /// with tools that read the legacy export format.
    #[arg(short = 'w')]
    generate_flat_index: bool,

    /// Force a full rebuild, bypassing the TurboScan free-block cache.
    #[arg(short = 'f')]
    force_rebuild: bool,

    /// Skip format probing; insert rows with zero duration/bitrate.
    #[arg(short = 's')]
    skip_probing: bool,

    /// Verbose logging.
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    verbose: u8,

    /// Roots to scan, overriding the configured index paths.
    roots: Vec<PathBuf>,
}

fn main() {
    let cli = Cli::parse();
    glaciera::logging::LOG_LEVEL
        .store(1 + cli.verbose, std::sync::atomic::Ordering::Relaxed);

    let mut config = Config::load();
    if !cli.roots.is_empty() {
        config.index_paths = cli.roots.clone();
    }

    let Some(data_dir) = glaciera::config::data_dir() else {
        error!("glaciera-indexer: could not determine the data directory");
        std::process::exit(1);
    };
    let Some(db_path) = glaciera::config::db_path() else {
        error!("glaciera-indexer: could not determine the catalog path");
        std::process::exit(1);
    };

    let mut store = match CatalogStore::open(&db_path) {
        Ok(s) => s,
        Err(e) => {
            error!("glaciera-indexer: failed to open catalog at {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };

    let existing = store.track_count().unwrap_or(0);
    info!("glaciera-indexer: existing database has {existing} tracks.");

    if config.index_paths.is_empty() {
        error!("glaciera-indexer: no index paths configured; edit the config file or pass roots on the command line");
        std::process::exit(1);
    }

    if cli.skip_probing {
        info!("glaciera-indexer: -s given; duration/bitrate still require the one-shot header read this crate always does");
    }

    let started = Instant::now();
    let scanned = match scanner::scan_roots(&config, &data_dir, cli.force_rebuild) {
        Ok(files) => files,
        Err(e) => {
            error!("glaciera-indexer: scan failed: {e}");
            std::process::exit(1);
        }
    };

    let total_files = scanned.len();
    let mut new_files = 0usize;
    let mut total_bytes: u64 = 0;

    let result = store.with_transaction(|conn| {
        for file in &scanned {
            total_bytes += file.tuneinfo.filesize;
            let is_new: bool = conn
                .query_row(
                    "SELECT COUNT(*) FROM tracks WHERE filepath = ?1",
                    rusqlite::params![file.path.to_string_lossy()],
                    |row| row.get::<_, i64>(0),
                )
                .map(|count| count == 0)
                .unwrap_or(true);
            conn.execute(
                "INSERT INTO tracks (filepath, display_name, search_text, filesize, filedate, \
                 duration, bitrate, genre, rating, updated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, strftime('%s','now')) \
                 ON CONFLICT(filepath) DO UPDATE SET display_name=excluded.display_name, \
                 search_text=excluded.search_text, filesize=excluded.filesize, \
                 filedate=excluded.filedate, duration=excluded.duration, \
                 bitrate=excluded.bitrate, genre=excluded.genre, rating=excluded.rating, \
                 updated_at=strftime('%s','now')",
                rusqlite::params![
                    file.path.to_string_lossy(),
                    file.display,
                    file.search,
                    file.tuneinfo.filesize as i64,
                    file.tuneinfo.filedate,
                    file.tuneinfo.duration as i64,
                    file.tuneinfo.bitrate as i64,
                    file.tuneinfo.genre as i64,
                    file.tuneinfo.rating as i64,
                ],
            )?;
            if is_new {
                new_files += 1;
            }
        }
        Ok(())
    });

    if let Err(e) = result {
        error!("glaciera-indexer: batch insert failed, rolled back: {e}");
        std::process::exit(1);
    }

    if cli.generate_flat_index {
        if let Err(e) = write_flat_index(&data_dir, &store) {
            error!("glaciera-indexer: failed to write flat index: {e}");
        }
    }

    let elapsed = started.elapsed();
    info!(
        "glaciera-indexer: total files: {total_files}  new files: {new_files}  \
         {:.1} MB  ({:.1}s)",
        total_bytes as f64 / 1024.0 / 1024.0,
        elapsed.as_secs_f64()
    );
}

/// Writes `allmp3.db`: one display name per line, for the legacy Windows
/// client compatibility artifact. Mirrors `opt_generate_allmp3db`; the
/// original's open question about whether this is still required is
/// resolved by keeping the flag opt-in (§9).
fn write_flat_index(data_dir: &std::path::Path, store: &CatalogStore) -> std::io::Result<()> {
    let tracks = store.load_all().unwrap_or_default();
    let mut text = String::new();
    for track in &tracks {
        text.push_str(&track.display);
        text.push('\n');
    }
    std::fs::write(data_dir.join("allmp3.db"), text)
}
