//! Rollup views (§4.7): artist/genre/top-list/new-songs summaries built by
//! hash-counting over the in-memory catalog or the history files, plus the
//! "surrounding songs" context window. Mirrors `do_view_artists`,
//! `do_view_toplist`, `do_view_available_genres`, `do_show_new_songs`, and
//! `do_context`, replacing the hand-rolled hash table with a `HashMap`.

use crate::model::{DisplaySlot, SyntheticTrack, Track};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// One rolled-up row: a label plus the aggregate stats shown alongside it.
#[derive(Debug, Clone)]
pub struct Rollup {
    /// Label shown in the list (artist name, genre name, ...).
    pub label: String,
    /// Summed duration across every contributing track.
    pub duration: u32,
    /// Number of contributing tracks/plays.
    pub count: u32,
    /// When set, selecting this row opens the genre view for this id rather
    /// than attempting playback. Mirrors the negative-filedate marker
    /// `addtexttodisplay` stashes for genre rows.
    pub genre_id: Option<u8>,
}

impl Rollup {
    fn into_slot(self) -> DisplaySlot {
        DisplaySlot::Synthetic(Arc::new(SyntheticTrack {
            display: self.label,
            duration: self.duration.min(u16::MAX as u32) as u16,
            filesize: self.count as u64,
            filedate: 0,
            genre_marker: self.genre_id,
        }))
    }
}

/// Rolls tracks up by the "artist" portion of their display name: the text
/// before the first `" - "`, with any path prefix before the last `/`
/// stripped. Tracks whose display has no `" - "` separator don't contribute
/// an artist row, mirroring the original's `strstr(buf, " - ")` gate.
///
/// `letter_filter`, when `Some`, restricts input to tracks whose display
/// starts with that letter (case-insensitive); `None` takes the whole
/// catalog, matching the space-for-"all" option in `do_view_artists`.
pub fn artist_rollup(tracks: &[Arc<Track>], letter_filter: Option<char>) -> Vec<DisplaySlot> {
    let mut totals: HashMap<String, (u32, u32)> = HashMap::new();
    for track in tracks {
        if let Some(letter) = letter_filter {
            let first = track.display.chars().next().unwrap_or('\0').to_ascii_uppercase();
            if first != letter.to_ascii_uppercase() {
                continue;
            }
        }
        let Some(sep) = track.display.find(" - ") else { continue };
        let mut artist = track.display[..sep].trim_end().to_string();
        if let Some(slash) = artist.rfind('/') {
            artist = artist[slash + 1..].to_string();
        }
        if artist.is_empty() {
            continue;
        }
        let entry = totals.entry(artist).or_insert((0, 0));
        entry.0 += track.tuneinfo.duration as u32;
        entry.1 += 1;
    }
    let mut rows: Vec<Rollup> =
        totals.into_iter().map(|(label, (duration, count))| Rollup { label, duration, count, genre_id: None }).collect();
    rows.sort_by(|a, b| a.label.to_ascii_lowercase().cmp(&b.label.to_ascii_lowercase()));
    rows.into_iter().map(Rollup::into_slot).collect()
}

/// Scans every `*.list` history file (named `YYYY_MM_DD.list`) in
/// `playlist_dir`, counts plays per display name, and keeps names played at
/// least 10 times. Mirrors `do_view_toplist`.
pub fn top_list(playlist_dir: &Path, tracks: &[Arc<Track>]) -> std::io::Result<Vec<DisplaySlot>> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for entry in std::fs::read_dir(playlist_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.ends_with(".list") || !name.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            continue;
        }
        let Ok(text) = std::fs::read_to_string(entry.path()) else { continue };
        for line in text.lines() {
            if line.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }
            if !line.is_empty() {
                *counts.entry(line.to_string()).or_insert(0) += 1;
            }
        }
    }

    let mut rows = Vec::new();
    for (display, count) in counts {
        if count < 10 {
            continue;
        }
        if let Some(track) = tracks.iter().find(|t| t.display == display) {
            rows.push((count, track.clone()));
        }
    }
    rows.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(rows
        .into_iter()
        .map(|(count, track)| {
            DisplaySlot::Synthetic(Arc::new(SyntheticTrack {
                display: track.display.clone(),
                duration: track.tuneinfo.duration,
                filesize: count as u64,
                filedate: track.tuneinfo.filedate,
                genre_marker: None,
            }))
        })
        .collect())
}

/// Genres with more than 10 tracks, sorted by track count descending.
/// Mirrors `do_view_available_genres`. Each row's `genre_id` is set so
/// selecting it can open [`show_genre`].
pub fn available_genres(tracks: &[Arc<Track>]) -> Vec<DisplaySlot> {
    let mut counts = [0u32; 256];
    let mut durations = [0u32; 256];
    for track in tracks {
        let g = track.tuneinfo.genre as usize;
        counts[g] += 1;
        durations[g] += track.tuneinfo.duration as u32;
    }
    let mut rows: Vec<Rollup> = (0..256)
        .filter(|&g| counts[g] > 10)
        .map(|g| Rollup {
            label: crate::display::genre_name(g as u8),
            duration: durations[g],
            count: counts[g],
            genre_id: Some(g as u8),
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows.into_iter().map(Rollup::into_slot).collect()
}

/// Every track tagged with `genre`. Mirrors `do_show_one_genre`.
pub fn show_genre(tracks: &[Arc<Track>], genre: u8) -> Vec<DisplaySlot> {
    tracks.iter().filter(|t| t.tuneinfo.genre == genre).cloned().map(DisplaySlot::Catalog).collect()
}

/// Rolls tracks whose `filedate` falls within `weeks_back..weeks_back-1`
/// weeks of the newest file in the catalog, grouped by the path component
/// before the first `/`. Mirrors `do_show_new_songs`/`addweektotime`.
pub fn new_songs(tracks: &[Arc<Track>], weeks_back: u32) -> Vec<DisplaySlot> {
    const WEEK: i64 = 86_400 * 7;
    let Some(newest) = tracks.iter().map(|t| t.tuneinfo.filedate).max() else { return Vec::new() };
    let lo = newest - WEEK * weeks_back as i64;
    let hi = lo + WEEK;

    let mut totals: HashMap<String, (u32, u32)> = HashMap::new();
    for track in tracks {
        if track.tuneinfo.filedate < lo || track.tuneinfo.filedate > hi {
            continue;
        }
        let group = match track.display.find('/') {
            Some(slash) => track.display[..slash].to_string(),
            None => track.display.clone(),
        };
        let entry = totals.entry(group).or_insert((0, 0));
        entry.0 += track.tuneinfo.duration as u32;
        entry.1 += 1;
    }
    let mut rows: Vec<Rollup> = totals
        .into_iter()
        .filter(|(_, (_, count))| *count > 1)
        .map(|(label, (duration, count))| Rollup { label, duration, count, genre_id: None })
        .collect();
    rows.sort_by(|a, b| a.label.to_ascii_lowercase().cmp(&b.label.to_ascii_lowercase()));
    rows.into_iter().map(Rollup::into_slot).collect()
}

/// Returns up to `radius` tracks before and after `center` in catalog order,
/// the "context" window around the currently playing track. Mirrors
/// `do_context`'s `KEY_F(4)` branch, doubling `radius` on repeated presses
/// being the caller's responsibility (see [`crate::ui::App`]).
pub fn context_window(tracks: &[Arc<Track>], center: usize, radius: usize) -> Vec<DisplaySlot> {
    let start = center.saturating_sub(radius);
    let stop = (center + radius + 1).min(tracks.len());
    tracks[start..stop].iter().cloned().map(DisplaySlot::Catalog).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TuneInfo;
    use std::path::PathBuf;

    fn track(display: &str, genre: u8, filedate: i64) -> Arc<Track> {
        let ti = TuneInfo { genre, filedate, duration: 100, ..TuneInfo::default() };
        Arc::new(Track::new(1, PathBuf::from("/m/a.mp3"), display.to_string(), ti, 0))
    }

    #[test]
    fn artist_rollup_groups_by_separator_prefix() {
        let tracks = vec![
            track("Band - Song One", 0, 0),
            track("Band - Song Two", 0, 0),
            track("Solo Track", 0, 0),
        ];
        let rows = artist_rollup(&tracks, None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].display(), "Band");
    }

    #[test]
    fn context_window_clamps_at_edges() {
        let tracks: Vec<_> = (0..5).map(|i| track(&format!("T{i}"), 0, 0)).collect();
        let window = context_window(&tracks, 0, 2);
        assert_eq!(window.len(), 3);
        let window = context_window(&tracks, 4, 2);
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn new_songs_requires_more_than_one_in_group() {
        let tracks = vec![track("only/one", 0, 1_000_000)];
        assert!(new_songs(&tracks, 1).is_empty());
    }
}
