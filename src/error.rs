//! Error kinds shared by the indexer and the player.
//!
//! Mirrors the policy in the specification: most failures are logged and
//! degrade gracefully (a track stays browsable with zero duration, a
//! malformed config falls back to defaults) rather than aborting a run.

use std::path::PathBuf;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GlacieraError>;

/// The distinct failure kinds a caller may want to branch on.
#[derive(Debug, thiserror::Error)]
pub enum GlacieraError {
    /// The file vanished between being listed and being opened.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// A probe could not find a recognizable container header.
    #[error("format invalid: {0}")]
    FormatInvalid(PathBuf),

    /// `open`/`stat` failed due to permissions.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// The TOML configuration could not be parsed.
    #[error("config malformed: {0}")]
    ConfigMalformed(String),

    /// The catalog store rejected a write (unique violation, schema mismatch).
    #[error("store integrity: {0}")]
    StoreIntegrity(String),

    /// Allocation or similar resource exhaustion.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Spawning the external decoder failed.
    #[error("child spawn failed: {0}")]
    ChildSpawn(String),

    /// The user asked to quit.
    #[error("cancelled")]
    Cancelled,

    /// Catch-all for std::io::Error passthrough.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for rusqlite::Error passthrough.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
