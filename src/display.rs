//! Display-name synthesis (§4.3): turns a noisy filename, informed by its
//! siblings in the same directory, into a clean human-readable title — or,
//! when tags are available, formats `artist - album - NN title` directly
//! from metadata instead.
//!
//! The column-analysis algorithm (`analyze_directory`/`Keepers`) compares
//! every music filename in a directory position-by-position to find which
//! characters are constant noise (shared by every sibling, so safe to drop)
//! versus which vary (the actual title, or a track-number run). It operates
//! on `char`s rather than raw bytes — the original analyzed bytes directly,
//! which is UTF-8-unsafe for multibyte filenames; this is a deliberate
//! adaptation, recorded in the design notes.

use crate::model::{only_searchables, TrackMetadata};
use crate::ripper::RipperList;
use std::path::Path;

/// Per-character-position keep/drop decision, shared across every file in
/// one directory listing.
#[derive(Debug, Clone)]
pub struct Keepers {
    bits: Vec<bool>,
}

impl Keepers {
    /// Positions at or beyond the analyzed width always keep their
    /// character — only the width actually compared across siblings can be
    /// marked redundant.
    fn is_kept(&self, pos: usize) -> bool {
        self.bits.get(pos).copied().unwrap_or(true)
    }

    /// Trivial keepers that retain every character, used for directories
    /// with at most one music file (nothing to compare against).
    fn keep_all() -> Self {
        Self { bits: Vec::new() }
    }
}

fn is_noise_char(c: char) -> bool {
    c == ' ' || c.is_ascii_punctuation()
}

/// Builds the [`Keepers`] mask for one directory's music file stems
/// (extension already stripped). Mirrors `find_redundant_song_names`.
pub fn analyze_directory(stems: &[String]) -> Keepers {
    if stems.len() <= 1 {
        return Keepers::keep_all();
    }

    let chars: Vec<Vec<char>> = stems.iter().map(|s| s.chars().collect()).collect();
    let width = chars.iter().map(|c| c.len()).max().unwrap_or(0).min(256);
    let basefilename = &chars[0];

    let mut samecolumn = vec![0u32; width];
    let mut trackcolumn = vec![0u32; width];
    let mut sumcolumn = vec![0u32; width];

    for stem in &chars {
        for (i, &c) in stem.iter().enumerate().take(width) {
            if is_noise_char(c) {
                continue;
            }
            if basefilename.get(i) == Some(&c) {
                samecolumn[i] += 1;
            }
            if c.is_ascii_digit() {
                trackcolumn[i] += 1;
                sumcolumn[i] += c as u32;
            }
        }
    }

    let musicfiles = stems.len() as u32;
    let mut same: Vec<bool> = samecolumn.iter().map(|&n| n == musicfiles).collect();
    let mut track: Vec<bool> = trackcolumn.iter().map(|&n| n == musicfiles).collect();

    // A digit column that's constant across every file (e.g. a literal "1"
    // in "cd1") is noise, not a track number.
    for i in 0..width {
        if track[i] {
            let avg = sumcolumn[i] / musicfiles;
            if same[i] && basefilename.get(i).map(|&c| c as u32) == Some(avg) {
                track[i] = false;
                same[i] = true;
            }
        }
    }

    // Only the rightmost contiguous run of track-digit columns counts as
    // the track number; anything before it is prefix noise.
    let mut track_start: Option<usize> = None;
    let mut i = width;
    while i > 0 {
        i -= 1;
        if track[i] {
            track_start = Some(i);
            continue;
        }
        if track_start.is_some() {
            break;
        }
    }
    if let Some(start) = track_start {
        for i in 0..start {
            track[i] = false;
            same[i] = true;
        }
    }

    // A single detected track-number column likely lost a leading zero
    // (e.g. "9" where siblings have "10"); widen by one to the left.
    if track.iter().filter(|&&t| t).count() == 1 {
        if let Some(pos) = track.iter().position(|&t| t) {
            if pos > 0 {
                track[pos - 1] = true;
            }
        }
    }

    let justnames = !track.iter().any(|&t| t);
    let bits: Vec<bool> = (0..width)
        .map(|i| if justnames { !same[i] } else { !same[i] || track[i] })
        .collect();

    Keepers { bits }
}

fn trim_display_path(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '_' => ' ',
            '[' => '(',
            ']' => ')',
            other => other,
        })
        .collect()
}

fn trim_double_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for c in s.chars() {
        if c == ' ' && prev_space {
            continue;
        }
        prev_space = c == ' ';
        out.push(c);
    }
    out
}

fn trim_double_minuses(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_minus = false;
    for c in s.chars() {
        if c == '-' && prev_minus {
            continue;
        }
        prev_minus = c == '-';
        out.push(c);
    }
    out
}

fn trim_minus_space_minus(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len()
            && (chars[i] == '-' || chars[i] == '.')
            && chars[i + 1] == ' '
            && chars[i + 2] == '-'
        {
            out.push('.');
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn trim_space_dot_space(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < chars.len() {
        if i + 2 < chars.len() && chars[i] == ' ' && chars[i + 1] == '.' && chars[i + 2] == ' ' {
            out.push('.');
            out.push(' ');
            i += 3;
        } else {
            out.push(chars[i]);
            i += 1;
        }
    }
    out
}

fn apply_trims(s: &str) -> String {
    let s = trim_double_spaces(s);
    let s = trim_double_minuses(&s);
    let s = trim_minus_space_minus(&s);
    trim_space_dot_space(&s)
}

fn strip_leading_non_alnum(s: &str) -> &str {
    s.trim_start_matches(|c: char| c.is_ascii() && !c.is_ascii_alphanumeric())
}

/// "10.Song" or a bare "Song" gets the parent directory name folded in so
/// the result reads "Artist - Song" rather than just "Song". Walks up
/// `levels` path components from `full_relative` looking for that prefix.
/// Mirrors `fix_01_to_fullname` / `massage_full_path`.
fn fold_in_parent(levels: usize, full_relative: &str) -> String {
    let mut slash_positions: Vec<usize> =
        full_relative.char_indices().filter(|&(_, c)| c == '/').map(|(i, _)| i).collect();
    slash_positions.reverse();
    if let Some(&pos) = slash_positions.get(levels - 1) {
        full_relative[pos + 1..].to_string()
    } else {
        full_relative.to_string()
    }
}

/// Strips the trailing extension and, when the basename alone wouldn't be
/// informative ("Song" with no dash, or a leading "NN" track number),
/// folds in enough of the parent path to read as a real title.
fn massage_full_path(full_relative: &str) -> String {
    let basename = full_relative.rsplit('/').next().unwrap_or(full_relative);
    let digit_prefix =
        basename.chars().take(2).filter(|c| c.is_ascii_digit()).count() == 2;
    let mut chosen = if !basename.contains('-') || digit_prefix {
        fold_in_parent(2, full_relative)
    } else {
        basename.to_string()
    };

    let lower = chosen.to_ascii_lowercase();
    if lower.starts_with("cd")
        && chosen
            .chars()
            .nth(2)
            .map(|c| c == ' ' || c.is_ascii_digit())
            .unwrap_or(false)
        && chosen
            .chars()
            .nth(3)
            .map(|c| c == '-' || c == ' ' || c == '/' || c.is_ascii_digit())
            .unwrap_or(false)
    {
        chosen = fold_in_parent(3, full_relative);
    }

    match chosen.rfind('.') {
        Some(dot) => chosen[..dot].to_string(),
        None => chosen,
    }
}

/// Builds a display name from a filename plus its siblings' [`Keepers`]
/// mask and the stripped-ripper directory name. Mirrors
/// `build_display_from_filename`.
pub fn build_display_from_filename(
    dir: &str,
    filename: &str,
    keepers: &Keepers,
    rippers: &RipperList,
) -> String {
    let dir_trimmed = rippers.strip(&trim_display_path(dir));

    let mut kept_name = String::new();
    for (i, c) in filename.chars().enumerate() {
        if keepers.is_kept(i) {
            kept_name.push(c);
        }
    }

    let combined = format!("{dir_trimmed}/{kept_name}");
    let massaged = massage_full_path(&combined);
    let cleaned = apply_trims(&rippers.strip(&trim_display_path(&massaged)));
    strip_leading_non_alnum(&cleaned).to_string()
}

/// Formats `artist - album - NN title`, falling back through progressively
/// sparser combinations as fields are missing. Mirrors
/// `build_display_from_metadata`.
pub fn build_display_from_metadata(meta: &TrackMetadata) -> String {
    let track_prefix = meta.track_number.map(|n| format!("{n:02} "));
    let out = match (&meta.artist, &meta.album, &meta.title) {
        (Some(ar), Some(al), Some(ti)) => match &track_prefix {
            Some(tn) => format!("{ar} - {al} - {tn}{ti}"),
            None => format!("{ar} - {al} - {ti}"),
        },
        (Some(ar), None, Some(ti)) => match &track_prefix {
            Some(tn) => format!("{ar} - {tn}{ti}"),
            None => format!("{ar} - {ti}"),
        },
        (None, Some(al), Some(ti)) => match &track_prefix {
            Some(tn) => format!("{al} - {tn}{ti}"),
            None => format!("{al} - {ti}"),
        },
        (None, None, Some(ti)) => match &track_prefix {
            Some(tn) => format!("{tn}{ti}"),
            None => ti.clone(),
        },
        (Some(ar), Some(al), None) => format!("{ar} - {al}"),
        (Some(ar), None, None) => ar.clone(),
        (None, Some(al), None) => al.clone(),
        (None, None, None) => meta.track.clone().unwrap_or_default(),
    };
    apply_trims(&out)
}

/// Synthesizes the final `(display, search)` pair for one file, preferring
/// metadata when present and falling back to filename analysis. Mirrors
/// `process_one_file`'s display-building half (the DB write is the
/// catalog's job, not this module's).
pub fn synthesize(
    dir: &str,
    filename: &str,
    meta: Option<&TrackMetadata>,
    keepers: &Keepers,
    rippers: &RipperList,
) -> (String, String) {
    let from_meta = meta.filter(|m| !m.is_empty()).map(build_display_from_metadata);
    let mut display = match from_meta {
        Some(d) if !d.is_empty() => d,
        _ => build_display_from_filename(dir, filename, keepers, rippers),
    };
    if display.is_empty() {
        display = filename.to_string();
    }
    let trimmed = strip_leading_non_alnum(&display).to_string();
    let search = only_searchables(&trimmed);
    (trimmed, search)
}

/// The classic ID3v1 genre table (0-147, Winamp extensions included).
/// Mirrors `genre_names`/`genrename`.
const GENRE_NAMES: &[&str] = &[
    "Blues", "Classic Rock", "Country", "Dance", "Disco", "Funk", "Grunge", "Hip-Hop", "Jazz",
    "Metal", "New Age", "Oldies", "Other", "Pop", "R&B", "Rap", "Reggae", "Rock", "Techno",
    "Industrial", "Alternative", "Ska", "Death Metal", "Pranks", "Soundtrack", "Euro-Techno",
    "Ambient", "Trip-Hop", "Vocal", "Jazz+Funk", "Fusion", "Trance", "Classical", "Instrumental",
    "Acid", "House", "Game", "Sound Clip", "Gospel", "Noise", "AlternRock", "Bass", "Soul", "Punk",
    "Space", "Meditative", "Instrumental Pop", "Instrumental Rock", "Ethnic", "Gothic",
    "Darkwave", "Techno-Industrial", "Electronic", "Pop-Folk", "Eurodance", "Dream",
    "Southern Rock", "Comedy", "Cult", "Gangsta", "Top 40", "Christian Rap", "Pop/Funk", "Jungle",
    "Native American", "Cabaret", "New Wave", "Psychedelic", "Rave", "Showtunes", "Trailer",
    "Lo-Fi", "Tribal", "Acid Punk", "Acid Jazz", "Polka", "Retro", "Musical", "Rock & Roll",
    "Hard Rock", "Folk", "Folk-Rock", "National Folk", "Swing", "Fast Fusion", "Bebop", "Latin",
    "Revival", "Celtic", "Bluegrass", "Avantgarde", "Gothic Rock", "Progressive Rock",
    "Psychedelic Rock", "Symphonic Rock", "Slow Rock", "Big Band", "Chorus", "Easy Listening",
    "Acoustic", "Humour", "Speech", "Chanson", "Opera", "Chamber Music", "Sonata", "Symphony",
    "Booty Bass", "Primus", "Porn Groove", "Satire", "Slow Jam", "Club", "Tango", "Samba",
    "Folklore", "Ballad", "Power Ballad", "Rhythmic Soul", "Freestyle", "Duet", "Punk Rock",
    "Drum Solo", "A Cappella", "Euro-House", "Dance Hall", "Goa", "Drum & Bass", "Club-House",
    "Hardcore", "Terror", "Indie", "BritPop", "Afro-Punk", "Polsk Punk", "Beat", "Christian Gangsta",
    "Heavy Metal", "Black Metal", "Crossover", "Contemporary Christian", "Christian Rock",
    "Merengue", "Salsa", "Thrash Metal", "Anime", "JPop", "Synthpop",
];

/// Display name for an ID3v1/scanned genre byte, or "(unknown)" for `0xff`
/// and any value outside the known table. Mirrors `genrename`.
pub fn genre_name(genre: u8) -> String {
    GENRE_NAMES.get(genre as usize).map(|s| s.to_string()).unwrap_or_else(|| "(unknown)".to_string())
}

/// Collects the extension-stripped stems of every recognized music file
/// directly inside `dir` (non-recursive), in directory order, for feeding
/// to [`analyze_directory`].
pub fn sibling_stems(dir: &Path, is_music: impl Fn(&Path) -> bool) -> std::io::Result<Vec<String>> {
    let mut stems = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !is_music(&path) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            stems.push(stem.to_string());
        }
    }
    Ok(stems)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_file_keeps_everything() {
        let keepers = analyze_directory(&["Only Song".to_string()]);
        assert!(keepers.is_kept(0));
        assert!(keepers.is_kept(100));
    }

    #[test]
    fn shared_prefix_is_dropped_varying_suffix_kept() {
        let stems = vec!["Band - One".to_string(), "Band - Two".to_string()];
        let keepers = analyze_directory(&stems);
        // "Band - " is identical across both; positions inside it should be dropped.
        assert!(!keepers.is_kept(0));
        // The varying tail ("One"/"Two") should be kept.
        let last = stems[0].chars().count() - 1;
        assert!(keepers.is_kept(last));
    }

    #[test]
    fn track_number_run_is_kept_even_when_prefix_repeats() {
        let stems = vec!["01 Song".to_string(), "02 Song".to_string()];
        let keepers = analyze_directory(&stems);
        assert!(keepers.is_kept(0)); // the "0" column varies? no: constant; digit -> trackcolumn
        assert!(keepers.is_kept(1)); // the varying digit
    }

    #[test]
    fn metadata_display_prefers_full_fields() {
        let meta = TrackMetadata {
            title: Some("Title".to_string()),
            artist: Some("Artist".to_string()),
            album: Some("Album".to_string()),
            track: Some("3".to_string()),
            track_number: Some(3),
        };
        assert_eq!(build_display_from_metadata(&meta), "Artist - Album - 03 Title");
    }

    #[test]
    fn metadata_display_falls_back_to_title_only() {
        let meta = TrackMetadata { title: Some("Title".to_string()), ..Default::default() };
        assert_eq!(build_display_from_metadata(&meta), "Title");
    }

    #[test]
    fn trims_collapse_double_spaces_and_minuses() {
        assert_eq!(apply_trims("A  --  B"), "A.B");
    }

    #[test]
    fn leading_non_alnum_ascii_is_stripped_but_unicode_kept() {
        assert_eq!(strip_leading_non_alnum("-- Song"), "Song");
        assert_eq!(strip_leading_non_alnum("Ångström"), "Ångström");
    }

    #[test]
    fn synthesize_prefers_metadata_over_filename() {
        let rippers = RipperList::default();
        let keepers = Keepers::keep_all();
        let meta = TrackMetadata { title: Some("Title".to_string()), ..Default::default() };
        let (display, search) =
            synthesize("/music/Band", "weird_file_name.mp3", Some(&meta), &keepers, &rippers);
        assert_eq!(display, "Title");
        assert_eq!(search, "TITLE");
    }
}
