//! Playback control (§4.5): always hands the actual decoding off to an
//! external player binary, forked and exec'd per format, never decoded
//! in-process. Mirrors `start_play`/`stop_playing`/`find_and_play_next_handler`.

pub mod progress;

use crate::config::Config;
use crate::error::{GlacieraError, Result};
use crate::logging::{error, info, warn};
use crate::model::{NowPlaying, Track};
use nix::sys::signal::{self, Signal};
use nix::sys::wait::waitpid;
use nix::unistd::{dup2, execvp, fork, ForkResult, Pid};
use std::ffi::CString;
use std::fs::OpenOptions;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

/// Where the player's stdout is redirected, scraped for shoutcast
/// `StreamTitle=` lines by [`progress`]. Mirrors `GLACIERA_PIPE`.
pub fn stream_log_path() -> PathBuf {
    std::env::temp_dir().join("glaciera.stdout")
}

/// Owns the external decoder's child process and the currently playing
/// track. One instance lives for the whole session.
pub struct Controller {
    child: Option<Pid>,
    now_playing: Option<NowPlaying>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller {
    /// An idle controller with nothing loaded.
    pub fn new() -> Self {
        Self { child: None, now_playing: None }
    }

    /// The track currently loaded, if any.
    pub fn now_playing(&self) -> Option<&NowPlaying> {
        self.now_playing.as_ref()
    }

    /// True while a child decoder is running (playing or paused).
    pub fn is_active(&self) -> bool {
        self.child.is_some()
    }

    /// Reads the first two 4K pages of `path` to prime the page cache ahead
    /// of a playback transition. Mirrors `precache_a_song`; errors are
    /// intentionally swallowed since this is a best-effort optimization.
    pub fn precache(path: &Path) {
        use std::io::Read;
        let Ok(mut file) = std::fs::File::open(path) else { return };
        let mut buf = [0u8; 4096];
        for _ in 0..2 {
            match file.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
        }
    }

    /// Sends SIGTERM to `pid` and reaps it. Mirrors `stop_playing`: SIGTERM
    /// rather than SIGKILL, to avoid leaving network shares in a bad state.
    fn terminate(pid: Pid) {
        let _ = signal::kill(pid, Signal::SIGTERM);
        let _ = waitpid(pid, None);
    }

    /// Stops whatever is currently playing, if anything.
    pub fn stop(&mut self) {
        if let Some(pid) = self.child.take() {
            Self::terminate(pid);
        }
        self.now_playing = None;
    }

    /// Toggles pause via SIGSTOP/SIGCONT, the way the original does instead
    /// of relying on the player's own pause support.
    pub fn toggle_pause(&mut self) -> Result<()> {
        let pid = self.child.ok_or(GlacieraError::Cancelled)?;
        let now_playing = self.now_playing.as_mut().ok_or(GlacieraError::Cancelled)?;
        let signal = if now_playing.paused { Signal::SIGCONT } else { Signal::SIGSTOP };
        signal::kill(pid, signal).map_err(|e| GlacieraError::ChildSpawn(e.to_string()))?;
        now_playing.paused = !now_playing.paused;
        Ok(())
    }

    /// Stops the current track (if any) and starts `track`, forking a child
    /// that execs the configured player with stdout redirected to
    /// [`stream_log_path`] and stderr to `/dev/null`. Mirrors `start_play`.
    pub fn play(&mut self, config: &Config, track: Arc<Track>) -> Result<()> {
        Self::precache(&track.path);
        self.stop();

        if !track.path.exists() {
            warn!("glaciera: '{}' vanished, skipping", track.path.display());
            return Err(GlacieraError::NotFound(track.path.clone()));
        }

        let extension = track.path.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
        let Some(player) = config.player_for(&extension) else {
            warn!("glaciera: no player configured for .{extension}, skipping '{}'", track.display);
            return Err(GlacieraError::ChildSpawn(format!("no player for .{extension}")));
        };
        if player.path.is_empty() {
            return Err(GlacieraError::ChildSpawn(format!("empty player path for .{extension}")));
        }

        let mut argv: Vec<String> = vec![player.path.clone()];
        argv.extend(player.flags.iter().cloned());
        argv.push(track.path.to_string_lossy().into_owned());

        let pid = spawn_player(&argv)?;
        self.child = Some(pid);
        self.now_playing =
            Some(NowPlaying { track, started_at: SystemTime::now(), paused: false, child_pid: pid.as_raw() as u32 });
        info!("glaciera: playing '{}'", self.now_playing.as_ref().unwrap().track.display);
        Ok(())
    }
}

/// Forks and execs `argv[0]` with `argv[1..]`, redirecting the child's
/// stdout to the stream log and stderr to `/dev/null`. Returns the child's
/// pid to the parent. Mirrors the `fork`/`dup2`/`execvp` sequence in
/// `start_play`, replacing raw libc calls with `nix`.
fn spawn_player(argv: &[String]) -> Result<Pid> {
    let c_argv: Vec<CString> = argv.iter().map(|s| CString::new(s.as_str()).unwrap()).collect();

    // SAFETY: the child only calls async-signal-safe operations (dup2,
    // execvp) before either succeeding or calling _exit.
    match unsafe { fork() }.map_err(|e| GlacieraError::ChildSpawn(e.to_string()))? {
        ForkResult::Parent { child } => Ok(child),
        ForkResult::Child => {
            let out = OpenOptions::new().write(true).create(true).truncate(true).open(stream_log_path());
            if let Ok(out) = out {
                let _ = dup2(out.as_raw_fd(), 1);
            }
            if let Ok(devnull) = OpenOptions::new().write(true).open("/dev/null") {
                let _ = dup2(devnull.as_raw_fd(), 2);
            }
            let _ = execvp(&c_argv[0], &c_argv);
            // execvp only returns on failure.
            error!("glaciera: failed to exec player");
            std::process::exit(127);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_on_idle_controller_is_a_no_op() {
        let mut controller = Controller::new();
        controller.stop();
        assert!(controller.now_playing().is_none());
    }

    #[test]
    fn toggle_pause_without_a_track_errors() {
        let mut controller = Controller::new();
        assert!(controller.toggle_pause().is_err());
    }

    #[test]
    fn precache_on_missing_file_does_not_panic() {
        Controller::precache(Path::new("/nonexistent/glaciera/nope.mp3"));
    }
}
