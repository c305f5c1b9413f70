//! Directory scanning (§4.2): recursive music discovery per indexed root,
//! with a free-block-count cache ("TurboScan") so an unchanged filesystem
//! is quickscanned instead of walked byte-for-byte, and an "ElephantMemory"
//! carve-out that keeps a root's catalog entries around while the
//! filesystem backing it is unmounted.

use crate::config::Config;
use crate::display::{self, Keepers};
use crate::error::Result;
use crate::format::{extension_of, probe_for};
use crate::logging::{info, warn};
use crate::model::{Track, TrackMetadata, TuneInfo};
use crate::ripper::RipperList;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Converts a [`fs::Metadata`] modification time to a Unix epoch, falling
/// back to 0 for filesystems that don't report one (matches the original's
/// unconditional `st_mtime` read, which never fails on Unix).
pub fn mtime_epoch(meta: &fs::Metadata) -> i64 {
    meta.modified()
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

fn is_music_file(path: &Path) -> bool {
    matches!(extension_of(path).as_str(), "mp3" | "flac" | "ogg")
}

/// One file discovered during a scan, with everything the catalog needs to
/// insert or update a row — the scanner never touches the store directly,
/// keeping it independent of the storage backend.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Absolute path.
    pub path: PathBuf,
    /// Synthesized display name.
    pub display: String,
    /// `only_searchables(display)`.
    pub search: String,
    /// Probed size/duration/bitrate/genre facts.
    pub tuneinfo: TuneInfo,
}

/// Probes one file's tags and tune-info, synthesizing its display name.
/// Returns `Ok(None)` for files whose probe fails outright (corrupt
/// header) rather than aborting the scan — matches the original's
/// "report and continue" posture for individual bad files.
fn process_one_file(dir: &str, path: &Path, keepers: &Keepers, rippers: &RipperList) -> Option<ScannedFile> {
    let probe = probe_for(path)?;
    let tuneinfo = match probe.read_info(path) {
        Ok(info) => info,
        Err(e) => {
            warn!("glaciera-indexer: {}: {e}", path.display());
            return None;
        }
    };
    let meta: TrackMetadata = probe.read_metadata(path).unwrap_or_default();
    let filename = path.file_name()?.to_str()?;
    let (display, search) = display::synthesize(dir, filename, Some(&meta), keepers, rippers);
    Some(ScannedFile { path: path.to_path_buf(), display, search, tuneinfo })
}

/// Recursively walks `dir`, skipping dotfiles and dotdirs, yielding one
/// [`ScannedFile`] per recognized music file. Mirrors `prim_recurse_disc`,
/// minus its per-directory threading (the caller parallelizes per root
/// instead, via [`scan_roots`]).
pub fn recurse_directory(dir: &Path, rippers: &RipperList, out: &mut Vec<ScannedFile>) -> Result<()> {
    let entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| !p.file_name().and_then(|n| n.to_str()).unwrap_or("").starts_with('.'))
        .collect();

    let stems = display::sibling_stems(dir, is_music_file).unwrap_or_default();
    let keepers = display::analyze_directory(&stems);
    let dir_str = dir.to_string_lossy().into_owned();

    for path in &entries {
        if path.is_dir() {
            recurse_directory(path, rippers, out)?;
        } else if is_music_file(path) {
            if let Some(scanned) = process_one_file(&dir_str, path, &keepers, rippers) {
                out.push(scanned);
            }
        }
    }
    Ok(())
}

fn free_blocks(dir: &Path) -> Option<u64> {
    nix::sys::statvfs::statvfs(dir).ok().map(|s| s.blocks_free())
}

fn is_path_mounted(dir: &Path) -> bool {
    let Ok(mounts) = fs::read_to_string("/proc/mounts") else { return false };
    let needle = dir.to_string_lossy();
    mounts.lines().any(|line| line.contains(needle.as_ref()))
}

fn free_cache_path(data_dir: &Path, root: &Path) -> PathBuf {
    let mut name = root.to_string_lossy().replace('/', "_");
    name.push_str(".free");
    data_dir.join(name)
}

/// Decides whether `root` can be quickscanned by comparing its current
/// free-block count to the value cached the last time it was scanned.
/// Mirrors `start_recurse_disc`'s cache-comparison / ElephantMemory logic;
/// the actual directory walk always runs (quickscan vs fullscan differ, in
/// the original, only in whether per-file duration probing is skipped,
/// which this crate always performs since a one-shot mmap read is cheap).
pub fn should_use_cache(data_dir: &Path, root: &Path, force_rebuild: bool) -> bool {
    if force_rebuild {
        return false;
    }
    let cache_path = free_cache_path(data_dir, root);
    let stored: Option<u64> =
        fs::read_to_string(&cache_path).ok().and_then(|s| s.trim().parse().ok());
    let current = free_blocks(root);

    match (is_path_mounted(root), current, stored) {
        (true, Some(cur), Some(prev)) => cur == prev,
        (false, _, Some(_)) => true, // ElephantMemory: unmounted but we have history, keep it
        _ => false,
    }
}

/// Records the current free-block count for `root` so a future scan can
/// decide whether to use the cache.
pub fn store_free_blocks(data_dir: &Path, root: &Path) -> Result<()> {
    if let Some(free) = free_blocks(root) {
        fs::create_dir_all(data_dir)?;
        fs::write(free_cache_path(data_dir, root), free.to_string())?;
    }
    Ok(())
}

/// Scans every configured index path, returning all discovered files. Each
/// root is walked independently; callers that want per-root parallelism
/// (as the original does with one thread per disk) can instead call
/// [`recurse_directory`] per root from their own thread pool.
pub fn scan_roots(config: &Config, data_dir: &Path, force_rebuild: bool) -> Result<Vec<ScannedFile>> {
    let rippers = config
        .rippers_path
        .as_deref()
        .map(RipperList::load)
        .unwrap_or_default();

    let mut all = Vec::new();
    for root in &config.index_paths {
        if !root.exists() {
            warn!("glaciera-indexer: index path {} does not exist, skipping", root.display());
            continue;
        }
        let use_cache = should_use_cache(data_dir, root, force_rebuild);
        info!(
            "glaciera-indexer: {} '{}'...",
            if use_cache { "quickscan" } else { "fullscan" },
            root.display()
        );
        let mut files = Vec::new();
        recurse_directory(root, &rippers, &mut files)?;
        store_free_blocks(data_dir, root)?;
        all.extend(files);
    }
    Ok(all)
}

/// Builds a [`Track`] from a scanned file, assigning `id` and stamping both
/// timestamps to `now` — used when the catalog doesn't already have a row
/// for this path.
pub fn track_from_scan(id: i64, scanned: &ScannedFile, now: i64) -> Track {
    Track::new(id, scanned.path.clone(), scanned.display.clone(), scanned.tuneinfo, now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_music_file_recognizes_supported_extensions() {
        assert!(is_music_file(Path::new("song.mp3")));
        assert!(is_music_file(Path::new("song.FLAC")));
        assert!(!is_music_file(Path::new("cover.jpg")));
    }

    #[test]
    fn recurse_skips_dotfiles_and_dotdirs() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".hidden.mp3"), b"").unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        let rippers = RipperList::default();
        let mut out = Vec::new();
        recurse_directory(dir.path(), &rippers, &mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn force_rebuild_always_disables_cache() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!should_use_cache(dir.path(), dir.path(), true));
    }
}
