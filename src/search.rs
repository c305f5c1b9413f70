//! The search engine (§4.6): a multi-word, negatable, mode-switched query
//! evaluated against the in-memory catalog on every keystroke. Mirrors
//! `do_search`'s word-splitting and AND-of-words-with-negation matching,
//! minus its SQLite round trip — everything here runs against the
//! in-memory snapshot directly, since that's what makes per-keystroke
//! search affordable.

use crate::model::{only_searchables, DisplaySlot, Track};
use std::sync::Arc;

/// Which interpretation a query string selects, chosen from its first
/// character exactly as the original does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// First character uppercase: match only the first letter of each word
    /// against search text, `!`-negatable.
    FirstChar,
    /// First character `/`: match against the filesystem path instead of
    /// the display/search text.
    Path,
    /// First character `%`: n-gram similarity search (each word's
    /// similarity to `track.search` must exceed 50%), `!`-negatable.
    Fuzzy,
    /// Default: every word (optionally negated) must match as a substring.
    Normal,
}

/// One parsed query word: its `only_searchables`-normalized text and
/// whether it's negated (contained a literal `!`).
#[derive(Debug, Clone)]
struct Word {
    text: String,
    negated: bool,
}

/// A parsed, ready-to-evaluate query.
#[derive(Debug, Clone)]
pub struct Query {
    mode: SearchMode,
    words: Vec<Word>,
    raw: String,
}

impl Query {
    /// Parses a raw search-box string into a [`Query`]. An empty or
    /// all-whitespace string parses to a query that matches nothing,
    /// matching the UI's behavior of clearing results when the box is
    /// emptied rather than showing the whole library.
    pub fn parse(raw: &str) -> Self {
        let mode = match raw.chars().next() {
            Some(c) if c.is_uppercase() => SearchMode::FirstChar,
            Some('/') => SearchMode::Path,
            Some('%') => SearchMode::Fuzzy,
            _ => SearchMode::Normal,
        };
        let words = raw
            .split_whitespace()
            .map(|w| Word { negated: w.contains('!'), text: only_searchables(w) })
            .filter(|w| !w.text.is_empty())
            .collect();
        Self { mode, words, raw: raw.to_string() }
    }

    /// True if the raw query string is entirely ASCII digits — the barcode
    /// shortcut that loads a playlist named `<digits>.list` instead of
    /// running a text search (handled by the caller, not here).
    pub fn is_barcode(&self) -> bool {
        !self.raw.is_empty() && self.raw.chars().all(|c| c.is_ascii_digit())
    }

    fn matches_track(&self, track: &Track) -> bool {
        if self.words.is_empty() {
            return false;
        }
        match self.mode {
            SearchMode::Path => {
                let haystack = only_searchables(&track.path.to_string_lossy());
                self.words.iter().all(|w| haystack.contains(&w.text) != w.negated)
            }
            SearchMode::Fuzzy => {
                let haystack = &track.search;
                self.words.iter().all(|w| (fuzzy_similarity(haystack, &w.text) > 50.0) != w.negated)
            }
            SearchMode::FirstChar => {
                let first_char_matches = |s: &str, w: &Word| {
                    s.chars().next().map(|c| w.text.starts_with(c.to_ascii_uppercase())).unwrap_or(false)
                };
                self.words.iter().enumerate().all(|(i, w)| {
                    let one_match = if i == 0 {
                        first_char_matches(&track.search, w) || first_char_matches(&track.display, w)
                    } else {
                        track.search.contains(&w.text)
                    };
                    one_match != w.negated
                })
            }
            SearchMode::Normal => {
                let haystack = &track.search;
                self.words.iter().all(|w| haystack.contains(&w.text) != w.negated)
            }
        }
    }

    /// Runs the query against `tracks`, preserving catalog order (already
    /// sorted by display name).
    pub fn run<'a>(&self, tracks: &'a [Arc<Track>]) -> Vec<Arc<Track>> {
        tracks.iter().filter(|t| self.matches_track(t)).cloned().collect()
    }

    /// Wraps [`Self::run`]'s results as display slots, ready to hand to a
    /// result-list view.
    pub fn run_as_slots(&self, tracks: &[Arc<Track>]) -> Vec<DisplaySlot> {
        self.run(tracks).into_iter().map(DisplaySlot::Catalog).collect()
    }
}

/// Counts how many `ngram_len`-byte windows of `needle` occur somewhere in
/// `haystack`, weighted by window length, alongside the maximum possible
/// weighted count. Mirrors `NGramMatch` (`common.c`); `needle`/`haystack`
/// are already ASCII-only (`only_searchables`-normalized) so byte slicing
/// never splits a UTF-8 scalar.
fn ngram_match(haystack: &str, needle: &str, ngram_len: usize) -> (i64, i64) {
    if ngram_len == 0 || ngram_len >= 8 || needle.len() < ngram_len {
        return (0, 0);
    }
    let ngram_count = needle.len() - ngram_len + 1;
    let mut max_match = 0i64;
    let mut count = 0i64;
    for i in 0..ngram_count {
        let ngram = &needle[i..i + ngram_len];
        max_match += ngram_len as i64;
        if haystack.contains(ngram) {
            count += 1;
        }
    }
    (count * ngram_len as i64, max_match)
}

/// N-gram similarity in `[0, 100]` between `haystack` and `needle`: two
/// passes of [`ngram_match`] at window length 3 and at window length 2 (or
/// 5 for needles of 7+ characters), combined into one percentage. Mirrors
/// `fuzzy()` (`common.c`).
fn fuzzy_similarity(haystack: &str, needle: &str) -> f64 {
    let (match1, max1) = ngram_match(haystack, needle, 3);
    let short_ngram_len = if needle.len() < 7 { 2 } else { 5 };
    let (match2, max2) = ngram_match(haystack, needle, short_ngram_len);
    let total_max = max1 + max2;
    if total_max == 0 {
        return 0.0;
    }
    100.0 * (match1 + match2) as f64 / total_max as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TuneInfo;
    use std::path::PathBuf;

    fn track(display: &str, path: &str) -> Arc<Track> {
        Arc::new(Track::new(1, PathBuf::from(path), display.to_string(), TuneInfo::default(), 0))
    }

    #[test]
    fn empty_query_matches_nothing() {
        let tracks = vec![track("Song", "/a.mp3")];
        assert!(Query::parse("").run(&tracks).is_empty());
    }

    #[test]
    fn normal_query_requires_all_words() {
        let tracks = vec![track("foo bar", "/a.mp3"), track("foo", "/b.mp3")];
        let result = Query::parse("foo bar").run(&tracks);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].display, "foo bar");
    }

    #[test]
    fn negated_word_excludes_matches() {
        let tracks = vec![track("foo bar", "/a.mp3"), track("foo baz", "/b.mp3")];
        let result = Query::parse("foo bar!").run(&tracks);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].display, "foo baz");
    }

    #[test]
    fn path_mode_matches_filesystem_path() {
        let tracks = vec![track("Song", "/music/Disc1/song.mp3"), track("Other", "/music/Disc2/other.mp3")];
        let result = Query::parse("/disc1").run(&tracks);
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn fuzzy_mode_matches_near_misses_via_ngram_similarity() {
        let tracks = vec![track("Alphabet", "/a.mp3"), track("Gamma", "/c.mp3")];
        // "alphabets" isn't a substring of "ALPHABET" but shares enough
        // n-grams to clear the 50% threshold; "gamma" shares almost none.
        let result = Query::parse("%alphabets").run(&tracks);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].display, "Alphabet");
    }

    #[test]
    fn fuzzy_mode_honors_negation() {
        let tracks = vec![track("Alphabet", "/a.mp3"), track("Gamma", "/c.mp3")];
        let result = Query::parse("%alphabet!").run(&tracks);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].display, "Gamma");
    }

    #[test]
    fn fuzzy_similarity_scores_exact_match_at_100_percent() {
        assert_eq!(fuzzy_similarity("ALPHABET", "ALPHABET"), 100.0);
    }

    #[test]
    fn barcode_detection_requires_all_digits() {
        assert!(Query::parse("123456").is_barcode());
        assert!(!Query::parse("abc123").is_barcode());
    }
}
