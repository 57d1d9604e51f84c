use crate::error::EmptyDirError;
use serde::{de, Deserialize, Deserializer};
use std::{fmt, str::FromStr};

/// How the options of a job combine with the base option set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptionsMode {
    /// Job options are appended after the base options.
    #[default]
    Append,
    /// Job options are used instead of the base options.
    Replace,
}

impl FromStr for OptionsMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(OptionsMode::Append),
            "replace" => Ok(OptionsMode::Replace),
            other => Err(format!(
                "unknown options_mode {other:?}, expected \"append\" or \"replace\""
            )),
        }
    }
}

// Deserialized from a plain string so that `ron::Value` maps, which carry
// strings rather than enum variants, can be converted directly.
impl<'de> Deserialize<'de> for OptionsMode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(de::Error::custom)
    }
}

impl fmt::Display for OptionsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionsMode::Append => write!(f, "append"),
            OptionsMode::Replace => write!(f, "replace"),
        }
    }
}

/// One configured source to destination synchronization task.
///
/// A descriptor is built once by the configuration loader and never changes
/// afterwards. `source_dir` always ends with `/`, so rsync copies the
/// contents of the directory rather than the directory itself.
///
/// # Examples
///
/// ```rust
/// use rsync_backup_rs::job::JobDescriptor;
///
/// let job = JobDescriptor::new("/data", "/backup")
///     .unwrap()
///     .with_exclude(vec!["*.tmp".into()]);
/// assert_eq!(job.source_dir(), "/data/");
/// assert_eq!(job.exclude_patterns(), ["*.tmp"]);
///
/// assert!(JobDescriptor::new("", "/backup").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobDescriptor {
    enabled: bool,
    source_dir: String,
    dest_dir: String,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    extra_options: Vec<String>,
    options_mode: OptionsMode,
}

impl JobDescriptor {
    /// Creates an enabled job with no patterns and no extra options.
    ///
    /// Fails if either directory is empty: an empty source would otherwise
    /// turn into `/`.
    pub fn new(
        source_dir: impl Into<String>,
        dest_dir: impl Into<String>,
    ) -> Result<Self, EmptyDirError> {
        let mut source_dir = source_dir.into();
        let dest_dir = dest_dir.into();
        if source_dir.is_empty() {
            return Err(EmptyDirError { key: "source_dir" });
        }
        if dest_dir.is_empty() {
            return Err(EmptyDirError { key: "dest_dir" });
        }

        if !source_dir.ends_with('/') {
            source_dir.push('/');
        }

        Ok(Self {
            enabled: true,
            source_dir,
            dest_dir,
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            extra_options: Vec::new(),
            options_mode: OptionsMode::default(),
        })
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_include(mut self, patterns: Vec<String>) -> Self {
        self.include_patterns = patterns;
        self
    }

    pub fn with_exclude(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }

    pub fn with_options(mut self, options: Vec<String>, mode: OptionsMode) -> Self {
        self.extra_options = options;
        self.options_mode = mode;
        self
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn source_dir(&self) -> &str {
        &self.source_dir
    }

    pub fn dest_dir(&self) -> &str {
        &self.dest_dir
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }

    pub fn extra_options(&self) -> &[String] {
        &self.extra_options
    }

    pub fn options_mode(&self) -> OptionsMode {
        self.options_mode
    }
}

impl fmt::Display for JobDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{ ")?;
        write!(f, "enabled: {}, ", self.enabled)?;
        write!(f, "source_dir: {}, ", self.source_dir)?;
        write!(f, "dest_dir: {}, ", self.dest_dir)?;
        write!(f, "include: {:?}, ", self.include_patterns)?;
        write!(f, "exclude: {:?}, ", self.exclude_patterns)?;
        write!(f, "options: {:?}, ", self.extra_options)?;
        write!(f, "options_mode: {} ", self.options_mode)?;
        write!(f, "}}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_source_dir_gets_trailing_separator() {
        assert_eq!(JobDescriptor::new("/data", "/backup").unwrap().source_dir(), "/data/");
        assert_eq!(JobDescriptor::new("/home/", "/backup").unwrap().source_dir(), "/home/");
        assert_eq!(JobDescriptor::new("/", "/mnt/root").unwrap().source_dir(), "/");
    }

    #[test]
    fn test_dest_dir_is_kept_as_written() {
        assert_eq!(JobDescriptor::new("/data", "/backup").unwrap().dest_dir(), "/backup");
        assert_eq!(JobDescriptor::new("/data", "/backup/").unwrap().dest_dir(), "/backup/");
    }

    #[test]
    fn test_empty_directories_are_rejected() {
        let err = JobDescriptor::new("", "/backup").unwrap_err();
        assert_eq!(err.key, "source_dir");

        let err = JobDescriptor::new("/data", "").unwrap_err();
        assert_eq!(err.key, "dest_dir");
    }

    #[test]
    fn test_options_mode_parsing() {
        assert_eq!("append".parse::<OptionsMode>(), Ok(OptionsMode::Append));
        assert_eq!("replace".parse::<OptionsMode>(), Ok(OptionsMode::Replace));
        assert!("Replace".parse::<OptionsMode>().is_err());
        assert_eq!(OptionsMode::default(), OptionsMode::Append);
    }
}
