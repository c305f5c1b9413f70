//! Format probes: §4.1, the thin, fixed-order dispatch over container
//! formats. Every probe reads a file exactly once, memory-mapped, and never
//! decodes audio in-process — playback is always handed off to an external
//! player (§4.5, non-goal on in-process decoding).

pub mod mp3;
pub mod playlist_probe;
pub mod tags;

use crate::config::Config;
use crate::error::Result;
use crate::model::{TrackMetadata, TuneInfo};
use std::path::Path;

/// A container-format probe: recognizes files by extension and extracts
/// the facts the catalog stores.
pub trait Probe: Send + Sync {
    /// True if `extension` (lowercase, no leading dot) belongs to this probe.
    fn matches_extension(&self, extension: &str) -> bool;

    /// Reads size/duration/bitrate/genre facts. One mmap pass, as in the
    /// original scanner.
    fn read_info(&self, path: &Path) -> Result<TuneInfo>;

    /// Reads whatever tag fields this format carries. Probes that have no
    /// tag format (playlists) return an empty struct.
    fn read_metadata(&self, path: &Path) -> Result<TrackMetadata> {
        let _ = path;
        Ok(TrackMetadata::default())
    }

    /// Builds the argv for the external player configured for this format,
    /// or `None` if no player is configured.
    fn spawn_args(&self, config: &Config, path: &Path) -> Option<(String, Vec<String>)>;
}

/// The probes tried in order for a given path, mirroring the original's
/// fixed extension checks (`mp3_isit`, then the playlist sniff, then the
/// tag-library formats). First match wins.
pub fn registry() -> Vec<Box<dyn Probe>> {
    vec![
        Box::new(playlist_probe::PlaylistProbe),
        Box::new(mp3::Mp3Probe),
        Box::new(tags::FlacProbe),
        Box::new(tags::OggProbe),
    ]
}

/// Finds the probe whose extension matches `path`, if any.
pub fn probe_for(path: &Path) -> Option<Box<dyn Probe>> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    registry().into_iter().find(|p| p.matches_extension(&ext))
}

pub(crate) fn extension_of(path: &Path) -> String {
    path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase()
}
