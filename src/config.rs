//! Configuration: TOML file under the XDG config directory, player
//! command lines per format, and the indexed library paths.
//!
//! Config is stored at `$XDG_CONFIG_HOME/glaciera/config.toml` (falling
//! back to `~/.config/glaciera/config.toml`). A missing or malformed file
//! is never fatal: `load` logs a warning and falls back to
//! [`Config::default`] so a first run always has something usable.

use crate::error::{GlacieraError, Result};
use crate::logging::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How a format's external player is invoked: a binary plus the flags that
/// go before the filename argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerCommand {
    /// Executable name or absolute path, looked up on `$PATH` if relative.
    pub path: String,
    /// Flags inserted before the filename, already split on whitespace.
    pub flags: Vec<String>,
}

impl PlayerCommand {
    fn new(path: &str, flags: &[&str]) -> Self {
        Self { path: path.to_string(), flags: flags.iter().map(|s| s.to_string()).collect() }
    }
}

impl Default for PlayerCommand {
    fn default() -> Self {
        Self { path: String::new(), flags: Vec::new() }
    }
}

/// Players configured per container format (§6.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Players {
    /// Invoked for `.mp3` files.
    pub mp3: PlayerCommand,
    /// Invoked for `.ogg` files.
    pub ogg: PlayerCommand,
    /// Invoked for `.flac` files.
    pub flac: PlayerCommand,
}

impl Default for Players {
    fn default() -> Self {
        Self {
            mp3: PlayerCommand::new("mpg123", &["-q"]),
            ogg: PlayerCommand::new("ogg123", &["-q"]),
            flac: PlayerCommand::new("flac123", &["-q"]),
        }
    }
}

/// Root application configuration, serialized as `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directories to scan for music, in the order they were added.
    pub index_paths: Vec<PathBuf>,
    /// Directory of ripper-suffix lists consulted by the display synthesizer.
    pub rippers_path: Option<PathBuf>,
    /// External decoder commands, one per supported container format.
    pub players: Players,
    /// Name of the theme file loaded from the themes directory, or
    /// `"default"` for the built-in palette.
    pub theme: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_paths: default_index_paths(),
            rippers_path: None,
            players: Players::default(),
            theme: "default".to_string(),
        }
    }
}

fn default_index_paths() -> Vec<PathBuf> {
    dirs::audio_dir().into_iter().collect()
}

/// `$XDG_CONFIG_HOME/glaciera`, or `~/.config/glaciera`.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("glaciera"))
}

/// `$XDG_DATA_HOME/glaciera`, or `~/.local/share/glaciera`. Holds the
/// catalog database and the legacy `.free` scan caches.
pub fn data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("glaciera"))
}

/// `$XDG_CACHE_HOME/glaciera`, or `~/.cache/glaciera`. Reserved for
/// transient scan state.
pub fn cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("glaciera"))
}

fn config_file_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Path to the catalog database file.
pub fn db_path() -> Option<PathBuf> {
    data_dir().map(|d| d.join("catalog.db"))
}

impl Config {
    /// Loads the config file, falling back to defaults on any error. Never
    /// fails: an unreadable or malformed file is logged and treated as
    /// absent, matching the original loader's "warn and continue" policy.
    pub fn load() -> Self {
        let Some(path) = config_file_path() else {
            warn!("glaciera: could not determine config directory, using defaults");
            return Self::default();
        };
        Self::load_from(&path).unwrap_or_else(|e| {
            warn!("glaciera: {e}, using defaults");
            Self::default()
        })
    }

    /// Loads from an explicit path, returning an error instead of silently
    /// falling back — used by `load` and directly by tests.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("glaciera: no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| GlacieraError::ConfigMalformed(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Writes the config atomically (temp file + rename) to the standard
    /// config path, creating the containing directory if needed.
    pub fn save(&self) -> Result<()> {
        let dir = config_dir()
            .ok_or_else(|| GlacieraError::ConfigMalformed("no config directory".to_string()))?;
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("config.toml");
        let temp = path.with_extension("toml.tmp");
        let text = toml::to_string_pretty(self)
            .map_err(|e| GlacieraError::ConfigMalformed(e.to_string()))?;
        std::fs::write(&temp, text)?;
        std::fs::rename(&temp, &path)?;
        info!("glaciera: saved config to {}", path.display());
        Ok(())
    }

    /// Player command for `extension` (case-insensitive, no leading dot),
    /// or `None` if the format isn't one of the three builtin players.
    pub fn player_for(&self, extension: &str) -> Option<&PlayerCommand> {
        match extension.to_ascii_lowercase().as_str() {
            "mp3" => Some(&self.players.mp3),
            "ogg" => Some(&self.players.ogg),
            "flac" => Some(&self.players.flac),
            _ => None,
        }
    }
}

/// Ensures the config file exists on disk, writing the default if absent.
/// Returns an error only if the directory couldn't be created or the
/// default couldn't be written.
pub fn ensure_default_file() -> Result<()> {
    let Some(path) = config_file_path() else {
        return Err(GlacieraError::ConfigMalformed("no config directory".to_string()));
    };
    if path.exists() {
        return Ok(());
    }
    match Config::default().save() {
        Ok(()) => Ok(()),
        Err(e) => {
            error!("glaciera: failed to write default config: {e}");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[players]"));
        assert!(text.contains("[players.mp3]"));
    }

    #[test]
    fn roundtrip_preserves_fields() {
        let mut config = Config::default();
        config.index_paths.push(PathBuf::from("/mnt/music"));
        config.theme = "nord".to_string();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.theme, "nord");
        assert_eq!(parsed.index_paths, vec![PathBuf::from("/mnt/music")]);
    }

    #[test]
    fn partial_file_uses_defaults_for_missing_fields() {
        let text = "theme = \"nord\"\n";
        let parsed: Config = toml::from_str(text).unwrap();
        assert_eq!(parsed.theme, "nord");
        assert_eq!(parsed.players.mp3.path, "mpg123");
    }

    #[test]
    fn load_from_missing_path_returns_default() {
        let config = Config::load_from(Path::new("/nonexistent/glaciera/config.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn load_from_malformed_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not [ valid toml").unwrap();
        assert!(matches!(Config::load_from(&path), Err(GlacieraError::ConfigMalformed(_))));
    }

    #[test]
    fn player_for_is_case_insensitive_and_unknown_extensions_are_none() {
        let config = Config::default();
        assert!(config.player_for("MP3").is_some());
        assert!(config.player_for("wav").is_none());
    }
}
