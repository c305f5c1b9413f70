//! Core data model: §3 of the catalog/search/playback specification.
//!
//! `Track` rows are the catalog's unit of truth. Everything else — display
//! slots, playlists, now-playing — holds onto a `Track` by cheap clone
//! (`Arc`) rather than by raw index, which sidesteps the arena-of-offsets
//! design the original mmap-backed format used.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

/// Compact per-track facts independent of any tag parser.
///
/// I3: `duration in [0,65535]`, `bitrate in [0,32767]`, `genre in [0,255]`,
/// `rating in [0,5]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TuneInfo {
    /// Size on disk, in bytes.
    pub filesize: u64,
    /// Last modification time, as a Unix epoch.
    pub filedate: i64,
    /// Duration in whole seconds. Zero means unknown/unmeasurable.
    pub duration: u16,
    /// Average bitrate in kbit/s.
    pub bitrate: u16,
    /// ID3v1 genre byte; `0xff` means unknown.
    pub genre: u8,
    /// User rating, 0-5.
    pub rating: u8,
}

impl Default for TuneInfo {
    fn default() -> Self {
        Self { filesize: 0, filedate: 0, duration: 0, bitrate: 0, genre: 0xff, rating: 0 }
    }
}

/// Optional decoded tag fields a format probe may produce.
#[derive(Debug, Clone, Default)]
pub struct TrackMetadata {
    /// Track title.
    pub title: Option<String>,
    /// Track artist.
    pub artist: Option<String>,
    /// Album name.
    pub album: Option<String>,
    /// Raw track-number string as stored in the tag (may contain "3/12").
    pub track: Option<String>,
    /// Parsed leading integer of `track`, if any (>= 1).
    pub track_number: Option<u32>,
}

impl TrackMetadata {
    /// True if no field was ever populated.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.artist.is_none() && self.album.is_none() && self.track.is_none()
    }

    /// Sets `field` only if it is currently unset (first-writer-wins, as the
    /// ID3v2 frame walk and the ID3v1 fallback both populate the same struct).
    pub fn set_if_empty(dest: &mut Option<String>, value: String) {
        if dest.is_none() && !value.is_empty() {
            *dest = Some(value);
        }
    }
}

/// Derives the ASCII-uppercase-alphanumerics-only search projection of a
/// display name (I2). Re-deriving it from `display` must always reproduce
/// the stored bytes (P1).
pub fn only_searchables(display: &str) -> String {
    display
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// A catalog row: the stable unit the store persists and the in-memory
/// catalog indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Stable row id, assigned by the catalog store.
    pub id: i64,
    /// Absolute, UTF-8 filesystem path. Unique (I1).
    pub path: PathBuf,
    /// Human-visible name, already denoised by the display synthesizer.
    pub display: String,
    /// `only_searchables(display)`, kept in sync per I2.
    pub search: String,
    /// Size/duration/bitrate/genre/rating facts.
    pub tuneinfo: TuneInfo,
    /// Row creation time (Unix epoch seconds).
    pub created_at: i64,
    /// Row last-update time (Unix epoch seconds).
    pub updated_at: i64,
}

impl Track {
    /// Builds a track from a path plus display name, deriving `search`
    /// per I2 and stamping both timestamps to `now`.
    pub fn new(id: i64, path: PathBuf, display: String, tuneinfo: TuneInfo, now: i64) -> Self {
        let search = only_searchables(&display);
        Self { id, path, display, search, tuneinfo, created_at: now, updated_at: now }
    }

    /// Re-derives `search` from `display`, matching P1.
    pub fn rebuild_search(&mut self) {
        self.search = only_searchables(&self.display);
    }
}

/// A tune currently visible in a display list: either a reference into the
/// in-memory catalog, or a synthetic row the list itself owns (playlist
/// placeholders for missing files, artist/genre rollups).
#[derive(Debug, Clone)]
pub enum DisplaySlot {
    /// Borrowed from the in-memory catalog.
    Catalog(Arc<Track>),
    /// Synthetic: `search` is always empty for these (never matches a query,
    /// per the catalog-slot/synthetic-slot split in §3.1).
    Synthetic(Arc<SyntheticTrack>),
}

/// A synthetic display row: playlist placeholders, artist/genre rollups,
/// barcode hints. Owns its own strings.
#[derive(Debug, Clone)]
pub struct SyntheticTrack {
    /// Display text shown in the list.
    pub display: String,
    /// Duration shown alongside, if meaningful.
    pub duration: u16,
    /// Size shown alongside, if meaningful.
    pub filesize: u64,
    /// File date shown alongside; some views stash a non-date sentinel here
    /// (e.g. negative values flag a genre-rollup row — see `do_show_one_genre`
    /// in the original source, preserved as `genre_marker`).
    pub filedate: i64,
    /// When set, selecting this row should jump to a genre view instead of
    /// playing anything.
    pub genre_marker: Option<u8>,
}

impl DisplaySlot {
    /// Display text, regardless of which variant this is.
    pub fn display(&self) -> &str {
        match self {
            DisplaySlot::Catalog(t) => &t.display,
            DisplaySlot::Synthetic(t) => &t.display,
        }
    }

    /// Search text; empty for synthetic rows by design (I5 / §3.1).
    pub fn search(&self) -> &str {
        match self {
            DisplaySlot::Catalog(t) => &t.search,
            DisplaySlot::Synthetic(_) => "",
        }
    }

    /// The stable catalog path, if this slot has one.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            DisplaySlot::Catalog(t) => Some(&t.path),
            DisplaySlot::Synthetic(_) => None,
        }
    }

    /// Duration in seconds, for sorting and progress display.
    pub fn duration(&self) -> u16 {
        match self {
            DisplaySlot::Catalog(t) => t.tuneinfo.duration,
            DisplaySlot::Synthetic(t) => t.duration,
        }
    }

    /// True if this slot can be handed to the playback controller.
    pub fn is_playable(&self) -> bool {
        !self.search().is_empty() || matches!(self, DisplaySlot::Catalog(_))
    }
}

/// An ordered, deduplicated (I6/P3) sequence of tracks the user assembled by
/// hand, as opposed to a transient search result.
#[derive(Debug, Clone, Default)]
pub struct Playlist {
    /// Name the playlist was loaded from/saved as, sans `.list` extension.
    pub name: String,
    /// Entries in playback order.
    pub entries: Vec<DisplaySlot>,
}

impl Playlist {
    /// Adds `track` unless its path already appears (I6: no-op on duplicate).
    pub fn add(&mut self, track: Arc<Track>) {
        let dup = self.entries.iter().any(|e| e.path() == Some(track.path.as_path()));
        if !dup {
            self.entries.push(DisplaySlot::Catalog(track));
        }
    }

    /// True if no two entries share a path (P3), for tests.
    pub fn is_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::new();
        self.entries.iter().all(|e| match e.path() {
            Some(p) => seen.insert(p.to_path_buf()),
            None => true,
        })
    }
}

/// One line of listening history: a display name plus the epoch the track
/// started playing at.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Display name as it was at play time.
    pub display: String,
    /// Epoch seconds the track started playing at.
    pub started_at: i64,
}

/// The currently loaded/playing track, exclusively owned by the playback
/// controller.
#[derive(Debug, Clone)]
pub struct NowPlaying {
    /// The playing (or paused) track.
    pub track: Arc<Track>,
    /// When playback of this track began.
    pub started_at: SystemTime,
    /// Whether playback is currently paused.
    pub paused: bool,
    /// Child decoder process id.
    pub child_pid: u32,
}
