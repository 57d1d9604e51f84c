//! Error types for loading the configuration and running jobs.

use std::{io, path::PathBuf};

/// Fatal configuration errors. Any of these aborts the run before a single
/// job is started.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot read configuration file {path:?}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration file {path:?} is incorrect: {message}")]
    Malformed { path: PathBuf, message: String },

    #[error("Cannot find key `{key}` in {entry}")]
    Incomplete { entry: String, key: &'static str },
}

/// A job descriptor was given an empty directory.
#[derive(Debug, thiserror::Error)]
#[error("`{key}` must not be empty")]
pub struct EmptyDirError {
    pub key: &'static str,
}

/// Per-job failures. These are logged and the runner moves on to the next
/// job.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Cannot create {kind} pattern file: {source}")]
    PatternFile {
        kind: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Cannot spawn shell for command: {command}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Cannot print dry-run report: {source}")]
    Report {
        #[source]
        source: io::Error,
    },

    #[error("Command exited with {}: {command}", exit_code_display(.code))]
    Failed { command: String, code: Option<i32> },
}

/// Errors that stop the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Keyboard interrupt received while running {job}")]
    Interrupted { job: String },
}

fn exit_code_display(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => String::from("no status"),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_incomplete_names_entry_and_key() {
        let err = ConfigError::Incomplete {
            entry: String::from("CONFIG_HOME"),
            key: "dest_dir",
        };
        assert_eq!(err.to_string(), "Cannot find key `dest_dir` in CONFIG_HOME");
    }

    #[test]
    fn test_failed_job_echoes_command() {
        let err = JobError::Failed {
            command: String::from("rsync \"/a/\" \"/b\""),
            code: Some(23),
        };
        assert_eq!(
            err.to_string(),
            "Command exited with status 23: rsync \"/a/\" \"/b\""
        );
    }
}
