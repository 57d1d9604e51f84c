//! Temporary include/exclude pattern files handed to rsync through
//! `--include-from` and `--exclude-from`.
//!
//! A [`PatternFile`] owns its file on disk. The file is deleted when the
//! value is dropped, so it cannot outlive the job that created it, whichever
//! way that job ends.

use crate::PROGRAM_NAME;
use std::{
    fmt,
    io::{self, Write},
    path::Path,
    process,
};
use tempfile::{Builder, NamedTempFile};

/// Which rsync filter list a pattern file feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Include,
    Exclude,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Include => "include",
            PatternKind::Exclude => "exclude",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Renders a pattern list the way rsync reads it: one pattern per line with
/// a trailing newline. An empty list renders as an empty string.
///
/// ```rust
/// use rsync_backup_rs::pattern::pattern_text;
///
/// assert_eq!(pattern_text(&["*.tmp".into(), "/cache/".into()]), "*.tmp\n/cache/\n");
/// assert_eq!(pattern_text(&[]), "");
/// ```
pub fn pattern_text(patterns: &[String]) -> String {
    if patterns.is_empty() {
        return String::new();
    }
    let mut text = patterns.join("\n");
    text.push('\n');
    text
}

/// A pattern list written to a uniquely named temporary file.
#[derive(Debug)]
pub struct PatternFile {
    kind: PatternKind,
    file: NamedTempFile,
}

impl PatternFile {
    /// Writes `patterns` to a new file in `dir`, named
    /// `<program>_<pid>_<kind>_<random>`.
    ///
    /// The random part is six alphanumerics rather than a number up to
    /// 10000. The file is created exclusively and a taken name is retried,
    /// so two runs sharing a pid and kind never write to the same file.
    ///
    /// Returns `Ok(None)` for an empty list; rsync is never given an empty
    /// pattern file.
    pub fn create(
        kind: PatternKind,
        patterns: &[String],
        dir: &Path,
    ) -> io::Result<Option<Self>> {
        if patterns.is_empty() {
            return Ok(None);
        }

        let prefix = format!("{PROGRAM_NAME}_{}_{kind}_", process::id());
        let mut file = Builder::new()
            .prefix(&prefix)
            .rand_bytes(6)
            .tempfile_in(dir)?;

        file.write_all(pattern_text(patterns).as_bytes())?;
        file.flush()?;

        Ok(Some(Self { kind, file }))
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// The rsync argument referencing this file, e.g.
    /// `--exclude-from="/tmp/rsync-backup_42_exclude_a1B2c3"`.
    pub fn flag(&self) -> String {
        format!("--{}-from=\"{}\"", self.kind, self.path().display())
    }

    /// Deletes the file now, reporting any error instead of swallowing it
    /// as `Drop` does.
    pub fn remove(self) -> io::Result<()> {
        self.file.close()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_list_creates_nothing() {
        let dir = TempDir::new().unwrap();
        let file = PatternFile::create(PatternKind::Include, &[], dir.path()).unwrap();

        assert!(file.is_none());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_file_contents_and_name() {
        let dir = TempDir::new().unwrap();
        let patterns = strings(&["lost+found", "/proc/*"]);
        let file = PatternFile::create(PatternKind::Exclude, &patterns, dir.path())
            .unwrap()
            .unwrap();

        assert_eq!(fs::read_to_string(file.path()).unwrap(), "lost+found\n/proc/*\n");

        let name = file.path().file_name().unwrap().to_string_lossy().to_string();
        let prefix = format!("{PROGRAM_NAME}_{}_exclude_", process::id());
        assert!(name.starts_with(&prefix), "unexpected name {name}");
        assert_eq!(name.len(), prefix.len() + 6);
    }

    #[test]
    fn test_flag_quotes_the_path() {
        let dir = TempDir::new().unwrap();
        let patterns = strings(&["/home/user/"]);
        let file = PatternFile::create(PatternKind::Include, &patterns, dir.path())
            .unwrap()
            .unwrap();

        assert_eq!(file.kind(), PatternKind::Include);
        assert_eq!(file.flag(), format!("--include-from=\"{}\"", file.path().display()));
    }

    #[test]
    fn test_remove_and_drop_delete_the_file() {
        let dir = TempDir::new().unwrap();
        let patterns = strings(&["*.tmp"]);

        let removed = PatternFile::create(PatternKind::Exclude, &patterns, dir.path())
            .unwrap()
            .unwrap();
        let removed_path = removed.path().to_path_buf();
        removed.remove().unwrap();
        assert!(!removed_path.exists());

        let dropped_path = {
            let dropped = PatternFile::create(PatternKind::Exclude, &patterns, dir.path())
                .unwrap()
                .unwrap();
            dropped.path().to_path_buf()
        };
        assert!(!dropped_path.exists());
    }

    #[test]
    fn test_two_files_of_the_same_kind_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let patterns = strings(&["a"]);
        let first = PatternFile::create(PatternKind::Include, &patterns, dir.path())
            .unwrap()
            .unwrap();
        let second = PatternFile::create(PatternKind::Include, &patterns, dir.path())
            .unwrap()
            .unwrap();

        assert_ne!(first.path(), second.path());
    }
}
