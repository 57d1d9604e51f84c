use crate::job::{JobDescriptor, OptionsMode};
use std::fmt;

/// The rsync flags every job starts from unless replaced.
pub const DEFAULT_OPTIONS: [&str; 11] = [
    "--verbose",
    "--human-readable",
    "--archive",
    "--hard-links",
    "--acls",
    "--xattrs",
    "--numeric-ids",
    "--noatime",
    "--inplace",
    "--delete",
    "--delete-excluded",
];

/// The base option set after command line adjustments.
///
/// Built once at startup and passed to the runner; it is never modified
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseOptions(Vec<String>);

impl BaseOptions {
    /// Builds the base set from the `--rsync-opts` override and `--quiet`.
    ///
    /// An override replaces [`DEFAULT_OPTIONS`] with its text as a single
    /// shell fragment. `quiet` only strips `--verbose` from the defaults,
    /// never from an override.
    pub fn from_cli(override_opts: Option<&str>, quiet: bool) -> Self {
        match override_opts {
            Some(opts) if opts.trim().is_empty() => Self(Vec::new()),
            Some(opts) => Self(vec![opts.trim().to_string()]),
            None => Self(
                DEFAULT_OPTIONS
                    .iter()
                    .filter(|opt| !(quiet && **opt == "--verbose"))
                    .map(|opt| opt.to_string())
                    .collect(),
            ),
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for BaseOptions {
    fn default() -> Self {
        Self::from_cli(None, false)
    }
}

/// The resolved flags for a single job, in command line order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionSet(Vec<String>);

impl OptionSet {
    /// Resolves `base ++ job ++ extra` for [`OptionsMode::Append`] and
    /// `job ++ extra` for [`OptionsMode::Replace`].
    ///
    /// ```rust
    /// use rsync_backup_rs::job::{JobDescriptor, OptionsMode};
    /// use rsync_backup_rs::options::{BaseOptions, OptionSet};
    ///
    /// let base = BaseOptions::from_cli(Some("--archive"), false);
    /// let job = JobDescriptor::new("/a", "/b").unwrap()
    ///     .with_options(vec!["--checksum".into()], OptionsMode::Replace);
    /// let set = OptionSet::resolve(&base, &job, &["--dry-run".into()]);
    /// assert_eq!(set.as_slice(), ["--checksum", "--dry-run"]);
    /// ```
    pub fn resolve(base: &BaseOptions, job: &JobDescriptor, extra: &[String]) -> Self {
        let base: &[String] = match job.options_mode() {
            OptionsMode::Append => base.as_slice(),
            OptionsMode::Replace => &[],
        };

        Self(
            base.iter()
                .chain(job.extra_options())
                .chain(extra)
                .cloned()
                .collect(),
        )
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for OptionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(" "))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_default_base_is_the_compiled_in_set() {
        assert_eq!(BaseOptions::default().as_slice(), strings(&DEFAULT_OPTIONS));
    }

    #[test]
    fn test_quiet_strips_verbose_only() {
        let base = BaseOptions::from_cli(None, true);
        assert!(!base.as_slice().contains(&String::from("--verbose")));
        assert_eq!(base.as_slice().len(), DEFAULT_OPTIONS.len() - 1);
        assert_eq!(base.as_slice()[0], "--human-readable");
    }

    #[test]
    fn test_override_replaces_defaults() {
        let base = BaseOptions::from_cli(Some(" -av --verbose "), true);
        assert_eq!(base.as_slice(), strings(&["-av --verbose"]));

        assert!(BaseOptions::from_cli(Some(""), false).as_slice().is_empty());
    }

    #[test]
    fn test_append_mode_concatenates_in_order() {
        let base = BaseOptions::from_cli(Some("-a"), false);
        let job = JobDescriptor::new("/a", "/b").unwrap()
            .with_options(strings(&["--log-file=/mnt/log"]), OptionsMode::Append);
        let set = OptionSet::resolve(&base, &job, &strings(&["--bwlimit=100"]));

        assert_eq!(
            set.as_slice(),
            strings(&["-a", "--log-file=/mnt/log", "--bwlimit=100"])
        );
        assert_eq!(set.to_string(), "-a --log-file=/mnt/log --bwlimit=100");
    }

    #[test]
    fn test_replace_mode_drops_base() {
        let job = JobDescriptor::new("/a", "/b").unwrap()
            .with_options(strings(&["-r"]), OptionsMode::Replace);
        let set = OptionSet::resolve(&BaseOptions::default(), &job, &[]);

        assert_eq!(set.as_slice(), strings(&["-r"]));
    }

    #[test]
    fn test_replace_with_nothing_is_empty() {
        let job = JobDescriptor::new("/a", "/b")
            .unwrap()
            .with_options(Vec::new(), OptionsMode::Replace);
        assert!(OptionSet::resolve(&BaseOptions::default(), &job, &[]).is_empty());
    }
}
