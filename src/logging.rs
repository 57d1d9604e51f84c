//! Logging prelude and subscriber setup.
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Backing up {}", name);
//! debug!("Run shell command: {}", command);
//! ```

pub use tracing::{debug, error, info, warn};

use std::io::{self, IsTerminal};
use tracing_subscriber::EnvFilter;

/// Log threshold selected on the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Verbosity {
    /// `-q`: warnings and errors only.
    Quiet,
    /// No flag: `RUST_LOG` if set, otherwise info.
    #[default]
    Normal,
    /// `-v`: everything down to debug.
    Verbose,
}

impl Verbosity {
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        match (quiet, verbose) {
            (true, _) => Verbosity::Quiet,
            (false, true) => Verbosity::Verbose,
            (false, false) => Verbosity::Normal,
        }
    }

    fn filter(self) -> EnvFilter {
        match self {
            Verbosity::Quiet => EnvFilter::new("warn"),
            Verbosity::Verbose => EnvFilter::new("debug"),
            Verbosity::Normal => {
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
            }
        }
    }
}

/// Initialize the tracing subscriber, writing to stderr so that dry-run
/// output on stdout stays clean.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn init_tracing(verbosity: Verbosity) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(verbosity.filter())
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .try_init();
}
