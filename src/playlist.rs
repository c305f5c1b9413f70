//! Playlist persistence and listening history (§4.7): `.list` files that
//! hold one display name per line, plus a per-day history file that
//! records what played and when. Missing tracks are kept as `???`
//! placeholders rather than silently dropped, so a playlist survives a
//! library rename or a temporarily unmounted disk.

use crate::logging::warn;
use crate::model::{DisplaySlot, HistoryEntry, Playlist, SyntheticTrack, Track};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

fn with_list_extension(name: &str) -> String {
    if name.ends_with(".list") {
        name.to_string()
    } else {
        format!("{name}.list")
    }
}

/// Saves `playlist` as `<playlist_dir>/<name>.list`, one display name per
/// line. Mirrors `save_playlist`.
pub fn save(playlist_dir: &Path, playlist: &Playlist) -> std::io::Result<()> {
    let path = playlist_dir.join(with_list_extension(&playlist.name));
    let mut file = std::fs::File::create(path)?;
    for entry in &playlist.entries {
        writeln!(file, "{}", entry.display())?;
    }
    Ok(())
}

/// Loads `<playlist_dir>/<name>.list`, resolving each line against
/// `find_by_display` (typically [`crate::library::Library`]'s lookup).
/// Lines that are pure digits are history timestamps and are skipped;
/// lines that don't resolve to a known track become a `??? <name>`
/// placeholder entry that can't be played but still shows the user their
/// playlist wasn't silently truncated. Mirrors `do_load_playlist`.
pub fn load(
    playlist_dir: &Path,
    name: &str,
    find_by_display: impl Fn(&str) -> Option<Arc<Track>>,
) -> std::io::Result<Playlist> {
    let path = playlist_dir.join(with_list_extension(name));
    let text = std::fs::read_to_string(&path)?;
    let mut playlist = Playlist { name: name.trim_end_matches(".list").to_string(), entries: Vec::new() };

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.chars().all(|c| c.is_ascii_digit()) {
            continue;
        }
        match find_by_display(line) {
            Some(track) => playlist.add(track),
            None => {
                warn!("glaciera: playlist '{name}' references missing track '{line}'");
                playlist.entries.push(DisplaySlot::Synthetic(Arc::new(SyntheticTrack {
                    display: format!("??? {line}"),
                    duration: 0,
                    filesize: 0,
                    filedate: 0,
                    genre_marker: None,
                })));
            }
        }
    }
    Ok(playlist)
}

/// Appends one line pair (`display`, start-time epoch) to today's history
/// file, creating it if needed. Mirrors `append_tune_to_history`; the
/// per-day filename groups a listening session's history the same way.
pub fn append_history(playlist_dir: &Path, entry: &HistoryEntry) -> std::io::Result<()> {
    let day = epoch_to_ymd(entry.started_at);
    let path = playlist_dir.join(format!("{day}.list"));
    let mut file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", entry.display)?;
    writeln!(file, "{}", entry.started_at)?;
    Ok(())
}

fn epoch_to_ymd(epoch: i64) -> String {
    // No calendar crate in the dependency stack; days-since-epoch civil
    // calendar conversion (Howard Hinnant's algorithm), proleptic Gregorian.
    let days = epoch.div_euclid(86_400) + 719_468;
    let era = if days >= 0 { days } else { days - 146_096 } / 146_097;
    let doe = (days - era * 146_097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };
    format!("{y:04}_{m:02}_{d:02}")
}

/// Lists every non-autogenerated `.list` file in `playlist_dir`, sorted by
/// name, for the "available playlists" view. History files are named
/// `YYYY_MM_DD.list` and are filtered out, matching the original's
/// `isdigit(d_name[0])` check.
pub fn available_playlists(playlist_dir: &Path) -> std::io::Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(playlist_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let Some(name) = file_name.to_str() else { continue };
        if !name.ends_with(".list") {
            continue;
        }
        if name.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(false) {
            continue;
        }
        names.push(name.trim_end_matches(".list").to_string());
    }
    names.sort();
    Ok(names)
}

/// Builds a [`HistoryEntry`] for `track` starting now.
pub fn history_entry_now(track: &Track) -> HistoryEntry {
    let started_at =
        SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs() as i64).unwrap_or(0);
    HistoryEntry { display: track.display.clone(), started_at }
}

pub fn playlist_dir_default(data_dir: &Path) -> PathBuf {
    data_dir.join("playlists")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TuneInfo;

    fn track(display: &str) -> Arc<Track> {
        Arc::new(Track::new(1, PathBuf::from("/m/a.mp3"), display.to_string(), TuneInfo::default(), 0))
    }

    #[test]
    fn save_then_load_roundtrips_known_tracks() {
        let dir = tempfile::tempdir().unwrap();
        let t = track("My Song");
        let mut playlist = Playlist { name: "favorites".to_string(), entries: Vec::new() };
        playlist.add(t.clone());
        save(dir.path(), &playlist).unwrap();

        let loaded = load(dir.path(), "favorites", |name| {
            if name == "My Song" { Some(t.clone()) } else { None }
        })
        .unwrap();
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].display(), "My Song");
    }

    #[test]
    fn missing_track_becomes_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mix.list"), "Gone Song\n").unwrap();
        let loaded = load(dir.path(), "mix", |_| None).unwrap();
        assert_eq!(loaded.entries[0].display(), "??? Gone Song");
        assert!(!loaded.entries[0].is_playable());
    }

    #[test]
    fn digit_only_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("mix.list"), "Song\n1700000000\n").unwrap();
        let loaded = load(dir.path(), "mix", |n| if n == "Song" { Some(track(n)) } else { None }).unwrap();
        assert_eq!(loaded.entries.len(), 1);
    }

    #[test]
    fn available_playlists_excludes_history_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("favorites.list"), "").unwrap();
        std::fs::write(dir.path().join("2026_01_01.list"), "").unwrap();
        let names = available_playlists(dir.path()).unwrap();
        assert_eq!(names, vec!["favorites".to_string()]);
    }

    #[test]
    fn epoch_to_ymd_matches_known_date() {
        // 2024-01-01T00:00:00Z
        assert_eq!(epoch_to_ymd(1_704_067_200), "2024_01_01");
    }
}
