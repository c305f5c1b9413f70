//! Per-second playback progress: the progress bar, the next-track precache
//! trigger, the history-save trigger, and file read-ahead. Mirrors
//! `update_song_progress_handler`, split into pure, testable pieces instead
//! of one signal handler that also touches curses.

use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// One second's worth of playback state, derived from elapsed wall time and
/// the track's known duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Seconds elapsed since playback started.
    pub seconds_played: u32,
    /// Seconds remaining, or equal to `seconds_played` when duration is
    /// unknown (streams), matching the original's streaming fallback.
    pub seconds_left: u32,
    /// 0..=100.
    pub percent_played: u8,
}

/// Computes [`Progress`] from `duration` (seconds, 0 = unknown/streaming)
/// and `seconds_played`. Mirrors the percent/seconds-left math in
/// `update_song_progress_handler`, including its clamp to a 999-minute max
/// display and its streaming fallback (no duration means "100% played,
/// counting up" rather than counting down).
pub fn compute(duration: u16, seconds_played: u32) -> Progress {
    const MAX_SECONDS_LEFT: u32 = 999 * 60;

    if duration == 0 {
        return Progress { seconds_played, seconds_left: seconds_played.min(MAX_SECONDS_LEFT), percent_played: 100 };
    }

    let duration = duration as u32;
    let percent_played = ((100 * seconds_played) / duration).min(100) as u8;
    let seconds_left = duration.saturating_sub(seconds_played).min(MAX_SECONDS_LEFT);
    Progress { seconds_played, seconds_left, percent_played }
}

/// Renders a `width`-character `#`-filled bar for `percent_played`, with the
/// percentage right-justified into its last 4 columns. Mirrors the
/// `memset`/`sprintf` sequence building `bar` in the original, minus the
/// shoutcast-title overlay (callers substitute [`stream_title`] themselves
/// when duration is zero, same as the original's `if
/// (!now_playing_tune->ti->duration)` branch).
pub fn render_bar(percent_played: u8, width: usize) -> String {
    if width < 4 {
        return new_fallback(width);
    }
    let mut bar = vec![b' '; width];
    let filled = (percent_played as usize * width) / 100;
    for slot in bar.iter_mut().take(filled) {
        *slot = b'#';
    }
    let label = format!("{percent_played:>3}%");
    let start = width - label.len();
    bar[start..].copy_from_slice(label.as_bytes());
    String::from_utf8(bar).unwrap()
}

fn new_fallback(width: usize) -> String {
    " ".repeat(width)
}

/// True once fewer than 10 seconds remain and no precache is already in
/// flight, the trigger for loading the next track's first pages ahead of
/// the transition. Mirrors the `secondsleft < 10 && !cache_next_song_thread_id`
/// check.
pub fn should_precache_next(progress: &Progress, precache_in_flight: bool) -> bool {
    progress.seconds_left < 10 && !precache_in_flight
}

/// True once a track has been played long enough to count as "listened to"
/// for history purposes: at least half its length, or at least four
/// minutes. Mirrors the `percentplayed >= 50 || secondsplayed >= 240` check.
pub fn should_save_history(progress: &Progress) -> bool {
    progress.percent_played >= 50 || progress.seconds_played >= 240
}

/// Reads 16 4K pages starting at `percent_played`% into `path`, priming the
/// page cache a few seconds ahead of the current playback position so a
/// slow disk doesn't cause an audible skip. Mirrors `readahead_thread`;
/// errors are swallowed, this is best-effort.
pub fn read_ahead(path: &Path, filesize: u64, percent_played: u8) {
    if percent_played >= 100 || filesize == 0 {
        return;
    }
    let Ok(mut file) = std::fs::File::open(path) else { return };
    let offset = (filesize / 100) * percent_played as u64;
    if file.seek(SeekFrom::Start(offset)).is_err() {
        return;
    }
    let mut buf = [0u8; 4096];
    for _ in 0..16 {
        match file.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

/// Scrapes `log_path` (the player's redirected stdout) for the most recent
/// `StreamTitle='...'` line mplayer/similar decoders emit for internet
/// radio. Returns `None` if the file is absent or no such line appears.
/// Mirrors `parse_shoutcaststream_log`.
pub fn parse_stream_title(log_path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(log_path).ok()?;
    let mut title = None;
    for line in text.lines() {
        if !line.contains("StreamTitle") {
            continue;
        }
        let Some(start) = line.find("='") else { continue };
        let rest = &line[start + 2..];
        let end = rest.find("';").unwrap_or(rest.len());
        title = Some(rest[..end].to_string());
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_mid_track() {
        let p = compute(200, 50);
        assert_eq!(p.percent_played, 25);
        assert_eq!(p.seconds_left, 150);
    }

    #[test]
    fn compute_zero_duration_counts_up_at_100_percent() {
        let p = compute(0, 42);
        assert_eq!(p.percent_played, 100);
        assert_eq!(p.seconds_left, 42);
    }

    #[test]
    fn compute_clamps_past_end_of_track() {
        let p = compute(10, 999);
        assert_eq!(p.percent_played, 100);
        assert_eq!(p.seconds_left, 0);
    }

    #[test]
    fn render_bar_fills_proportionally() {
        let bar = render_bar(50, 20);
        assert_eq!(bar.len(), 20);
        assert_eq!(bar.chars().filter(|&c| c == '#').count(), 10);
        assert!(bar.contains("50%"));
    }

    #[test]
    fn precache_trigger_fires_under_ten_seconds_left() {
        let p = compute(100, 92);
        assert!(should_precache_next(&p, false));
        assert!(!should_precache_next(&p, true));
    }

    #[test]
    fn history_trigger_fires_past_half_or_four_minutes() {
        assert!(should_save_history(&compute(100, 55)));
        assert!(should_save_history(&compute(1000, 240)));
        assert!(!should_save_history(&compute(1000, 100)));
    }

    #[test]
    fn stream_title_is_parsed_from_icy_log_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stdout");
        std::fs::write(
            &path,
            "ICY Info: StreamTitle='Diskonnekted - Eternal';StreamUrl='http://example.com';\n",
        )
        .unwrap();
        assert_eq!(parse_stream_title(&path).as_deref(), Some("Diskonnekted - Eternal"));
    }

    #[test]
    fn missing_log_file_yields_none() {
        assert!(parse_stream_title(Path::new("/nonexistent/glaciera.stdout")).is_none());
    }
}
