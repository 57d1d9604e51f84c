/// Command line arguments of the `rsync-backup` binary.
pub mod args;
/// Loads backup jobs from a RON configuration file.
pub mod config;
pub mod error;
/// The job descriptor: one source to destination backup task.
pub mod job;
pub mod logging;
/// Default rsync options and per-job option resolution.
pub mod options;
pub mod pattern;
/// Builds and runs the rsync command of each job.
pub mod runner;
pub mod utils;

/// Name used for temporary pattern files.
pub const PROGRAM_NAME: &str = "rsync-backup";
