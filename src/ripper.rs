//! Ripper-suffix stripping: removes the `-MP3`, `[FLAC]`-style tags that
//! rip groups append to filenames, using a list the user maintains at
//! `rippers_path` (one suffix per line).
//!
//! Matching is by last character: `index[c]` holds the half-open range of
//! `suffixes` whose last character (uppercased) is `c`, mirroring the
//! original's `qsearch[256]` lookup so `strip_ripper` never has to scan
//! the whole list for a long filename.

use std::path::Path;

/// A loaded, bucket-indexed ripper suffix list.
#[derive(Debug)]
pub struct RipperList {
    /// Suffixes sorted so entries sharing a last character are contiguous.
    suffixes: Vec<String>,
    /// `index[c as usize]` is the `[lo, hi)` range into `suffixes` for last
    /// character `c` (uppercase ASCII), or `None` if no suffix ends in `c`.
    index: [Option<(usize, usize)>; 256],
}

impl Default for RipperList {
    fn default() -> Self {
        Self { suffixes: Vec::new(), index: [None; 256] }
    }
}

impl RipperList {
    /// Loads one suffix per non-empty line of `path`. A missing file
    /// yields an empty list rather than an error — ripper stripping is
    /// an enhancement, not a requirement for indexing to proceed.
    pub fn load(path: &Path) -> Self {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(_) => return Self::default(),
        };
        let mut suffixes: Vec<String> =
            text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect();
        // Sort by reversed string so suffixes with the same last character
        // are adjacent, matching the original's strrev-sort-strrev dance.
        suffixes.sort_by(|a, b| {
            let ra: String = a.chars().rev().collect();
            let rb: String = b.chars().rev().collect();
            ra.to_ascii_uppercase().cmp(&rb.to_ascii_uppercase())
        });

        let mut index: [Option<(usize, usize)>; 256] = [None; 256];
        for (i, suffix) in suffixes.iter().enumerate() {
            let Some(last) = suffix.chars().last() else { continue };
            let bucket = (last.to_ascii_uppercase() as u32 & 0xff) as usize;
            index[bucket] = match index[bucket] {
                Some((lo, _)) => Some((lo, i + 1)),
                None => Some((i, i + 1)),
            };
        }

        Self { suffixes, index }
    }

    /// Strips a single trailing ripper suffix from `s`, if one matches.
    /// At most one suffix is removed, as in the original (`break` on first
    /// hit within the bucket).
    pub fn strip(&self, s: &str) -> String {
        let Some(last) = s.chars().last() else { return s.to_string() };
        let bucket = (last.to_ascii_uppercase() as u32 & 0xff) as usize;
        let Some((lo, hi)) = self.index[bucket] else { return s.to_string() };

        let upper = s.to_ascii_uppercase();
        for suffix in &self.suffixes[lo..hi] {
            let needle = suffix.to_ascii_uppercase();
            if upper.len() > needle.len() && upper.ends_with(&needle) {
                let cut = s.len() - suffix.len();
                return s[..cut].to_string();
            }
        }
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(lines: &[&str]) -> RipperList {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rippers.txt");
        std::fs::write(&path, lines.join("\n")).unwrap();
        RipperList::load(&path)
    }

    #[test]
    fn strips_matching_suffix_case_insensitively() {
        let rippers = list(&["-MP3", "-FLAC"]);
        assert_eq!(rippers.strip("Song Title-mp3"), "Song Title");
    }

    #[test]
    fn leaves_non_matching_strings_untouched() {
        let rippers = list(&["-MP3"]);
        assert_eq!(rippers.strip("Song Title"), "Song Title");
    }

    #[test]
    fn missing_file_yields_empty_list_that_strips_nothing() {
        let rippers = RipperList::load(Path::new("/nonexistent/rippers.txt"));
        assert_eq!(rippers.strip("Song Title-MP3"), "Song Title-MP3");
    }

    #[test]
    fn does_not_strip_when_suffix_would_consume_whole_string() {
        let rippers = list(&["SONG"]);
        assert_eq!(rippers.strip("SONG"), "SONG");
    }
}
