//! Glaciera: a terminal jukebox for very large local music libraries.
//! Everything licensed under GNU General Public License V3

#![warn(missing_docs)]

/// Logging macros
pub mod logging {
    // {{{

    use std::sync::{
        atomic::{AtomicBool, AtomicU8},
        Mutex,
    };

    /// Verbosity level of log to print/queue
    pub static LOG_LEVEL: AtomicU8 = AtomicU8::new(1);
    /// Print log if true else save for later
    pub static PRINT_LOG: AtomicBool = AtomicBool::new(true);
    /// The backlog of logs to print when resumed
    pub static BACKLOG: Mutex<Vec<(u8, String)>> = Mutex::new(Vec::new());

    /// If $v <= LOG_LEVEL print values
    #[macro_export]
    macro_rules! log {
        ($v:expr, $($fmt_args:tt)*) => {
            {
                #[allow(unused_comparisons)]
                if $crate::logging::LOG_LEVEL.load(std::sync::atomic::Ordering::Relaxed) >= $v {
                    if $crate::logging::PRINT_LOG.load(std::sync::atomic::Ordering::Relaxed) {
                        eprintln!($($fmt_args)*)
                    } else if let Ok(mut backlog) = $crate::logging::BACKLOG.lock() {
                        backlog.push(($v, format!($($fmt_args)*)))
                    }
                }
            }
        };
    }

    /// Pause log and queue further entries. Used while the TUI owns the terminal.
    #[macro_export]
    macro_rules! log_pause {
        () => {
            $crate::logging::PRINT_LOG.store(false, std::sync::atomic::Ordering::Relaxed)
        };
    }

    /// Resume log and print queued entries
    #[macro_export]
    macro_rules! log_resume {
        () => {
            $crate::logging::PRINT_LOG.store(true, std::sync::atomic::Ordering::Relaxed);
            if let Ok(mut backlog) = $crate::logging::BACKLOG.lock() {
                for (n, s) in backlog.drain(..) {
                    eprintln!("{}", s);
                    let _ = n;
                }
                backlog.shrink_to_fit();
            }
        };
    }

    #[macro_export]
    macro_rules! error {
        ($($fmt_args:tt)*) => { $crate::log!(0, $($fmt_args)*) };
    }
    #[macro_export]
    macro_rules! warn {
        ($($fmt_args:tt)*) => { $crate::log!(1, $($fmt_args)*) };
    }
    #[macro_export]
    macro_rules! info {
        ($($fmt_args:tt)*) => { $crate::log!(2, $($fmt_args)*) };
    }
    #[macro_export]
    macro_rules! debug {
        ($($fmt_args:tt)*) => { $crate::log!(3, $($fmt_args)*) };
    }
    #[macro_export]
    macro_rules! bench {
        ($($fmt_args:tt)*) => { $crate::log!(4, $($fmt_args)*) };
    }

    pub use crate::{bench, debug, error, info, log, log_pause, log_resume, warn};
}

pub mod catalog;
pub mod config;
pub mod display;
pub mod error;
pub mod format;
pub mod library;
pub mod model;
pub mod playback;
pub mod playlist;
pub mod ripper;
pub mod scanner;
pub mod search;
pub mod ui;

pub use error::{GlacieraError, Result};
