//! `.pls`/`.m3u` recognition.
//!
//! The original scanner treats these purely as a fast `grep http` to flag
//! stream playlists; it never stores a `tuneinfo` for them. We keep that
//! shape: `read_info` always reports zero duration/bitrate, and there is no
//! configured player (streaming playback is out of scope — see Non-goals).

use crate::config::Config;
use crate::error::Result;
use crate::format::Probe;
use crate::model::TuneInfo;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Probe for `.pls`/`.m3u` playlist files.
pub struct PlaylistProbe;

impl Probe for PlaylistProbe {
    fn matches_extension(&self, extension: &str) -> bool {
        extension == "pls" || extension == "m3u"
    }

    fn read_info(&self, path: &Path) -> Result<TuneInfo> {
        let meta = std::fs::metadata(path)?;
        Ok(TuneInfo {
            filesize: meta.len(),
            filedate: crate::scanner::mtime_epoch(&meta),
            ..TuneInfo::default()
        })
    }

    fn spawn_args(&self, _config: &Config, _path: &Path) -> Option<(String, Vec<String>)> {
        None
    }
}

/// True if any line in `path` looks like a stream URL. Mirrors the
/// original's "grep http filename" shortcut rather than parsing `[playlist]`
/// sections or `#EXTM3U` directives.
pub fn has_stream_lines(path: &Path) -> Result<bool> {
    let file = std::fs::File::open(path)?;
    for line in BufReader::new(file).lines() {
        let line = line?;
        if line.contains("http") {
            return Ok(true);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_http_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stream.pls");
        std::fs::write(&path, "File1=http://example.com/stream\nTitle1=Example\n").unwrap();
        assert!(has_stream_lines(&path).unwrap());
    }

    #[test]
    fn local_playlist_has_no_stream_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.m3u");
        std::fs::write(&path, "/home/user/Music/song.mp3\n").unwrap();
        assert!(!has_stream_lines(&path).unwrap());
    }

    #[test]
    fn extension_matching_is_case_sensitive_to_lowercased_input() {
        let probe = PlaylistProbe;
        assert!(probe.matches_extension("pls"));
        assert!(probe.matches_extension("m3u"));
        assert!(!probe.matches_extension("mp3"));
    }
}
