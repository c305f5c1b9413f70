//! The in-memory catalog (§4.4/§4.6): a flat, case-insensitively sorted
//! snapshot of every track loaded from the store at startup, rebuilt
//! wholesale after a rescan rather than patched incrementally — the
//! dataset is small enough (tens of thousands of rows) that a full rebuild
//! stays well under a frame.

use crate::model::Track;
use lexical_sort::natural_lexical_cmp;
use std::sync::Arc;

/// A loaded, sorted snapshot of the catalog, plus a first-letter bucket
/// index for jump-to-letter navigation.
pub struct Library {
    tracks: Vec<Arc<Track>>,
    /// `letter_index[c]` is the first position in `tracks` whose display
    /// name's first alphabetic character is `c` (uppercase ASCII), or
    /// `None` if no track starts with that letter.
    letter_index: [Option<usize>; 26],
}

impl Library {
    /// Builds a snapshot from freshly loaded rows, sorting by display name
    /// with natural, case-insensitive comparison (so "Track 2" sorts before
    /// "Track 10").
    pub fn new(mut tracks: Vec<Track>) -> Self {
        tracks.sort_unstable_by(|a, b| natural_lexical_cmp(&a.display, &b.display));
        let tracks: Vec<Arc<Track>> = tracks.into_iter().map(Arc::new).collect();
        let letter_index = build_letter_index(&tracks);
        Self { tracks, letter_index }
    }

    /// All tracks, in display order.
    pub fn tracks(&self) -> &[Arc<Track>] {
        &self.tracks
    }

    /// Number of tracks in the snapshot.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// True if the snapshot holds no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Index of the first track whose display name starts with `letter`
    /// (case-insensitive), for jump-to-letter navigation.
    pub fn first_with_letter(&self, letter: char) -> Option<usize> {
        let upper = letter.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        self.letter_index[(upper as u8 - b'A') as usize]
    }

    /// Looks up a track by its catalog-stable path.
    pub fn find_by_path(&self, path: &std::path::Path) -> Option<Arc<Track>> {
        self.tracks.iter().find(|t| t.path == path).cloned()
    }
}

fn build_letter_index(tracks: &[Arc<Track>]) -> [Option<usize>; 26] {
    let mut index = [None; 26];
    for (i, track) in tracks.iter().enumerate() {
        let Some(first) = track.display.chars().find(|c| c.is_ascii_alphabetic()) else {
            continue;
        };
        let slot = (first.to_ascii_uppercase() as u8 - b'A') as usize;
        if index[slot].is_none() {
            index[slot] = Some(i);
        }
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TuneInfo;
    use std::path::PathBuf;

    fn track(id: i64, display: &str) -> Track {
        Track::new(id, PathBuf::from(format!("/m/{id}.mp3")), display.to_string(), TuneInfo::default(), 0)
    }

    #[test]
    fn sorts_naturally_by_display_name() {
        let lib = Library::new(vec![track(1, "Track 10"), track(2, "Track 2"), track(3, "Abba")]);
        let names: Vec<&str> = lib.tracks().iter().map(|t| t.display.as_str()).collect();
        assert_eq!(names, vec!["Abba", "Track 2", "Track 10"]);
    }

    #[test]
    fn letter_index_finds_first_occurrence() {
        let lib = Library::new(vec![track(1, "Banana"), track(2, "Apple"), track(3, "Apricot")]);
        let idx = lib.first_with_letter('a').unwrap();
        assert_eq!(lib.tracks()[idx].display, "Apple");
    }

    #[test]
    fn letter_index_is_none_for_absent_letters() {
        let lib = Library::new(vec![track(1, "Banana")]);
        assert!(lib.first_with_letter('z').is_none());
    }

    #[test]
    fn find_by_path_locates_track() {
        let lib = Library::new(vec![track(1, "Only")]);
        let found = lib.find_by_path(&PathBuf::from("/m/1.mp3"));
        assert!(found.is_some());
    }
}
