use std::path::Path;

/// A macro that expands a leading `~` in a configured path.
///
/// Falls back to the path as written when there is nothing to expand or when
/// the home directory cannot be determined.
///
/// # Examples
///
/// ```rust
/// use rsync_backup_rs::fix_path;
/// use rsync_backup_rs::utils::FixPath;
///
/// assert_eq!(fix_path!("/mnt/Backup/home"), "/mnt/Backup/home");
/// ```
#[macro_export]
macro_rules! fix_path {
    ($path:expr) => {
        $path.fix_path().unwrap_or_else(|| $path.to_string())
    };
}

/// A trait for expanding `~` and `~/...` to the current user's home
/// directory, so that the quoted paths handed to the shell still point at
/// the right place.
///
/// `~user` forms are left alone.
pub trait FixPath {
    /// Returns the expanded path, or `None` if the path has no leading `~`.
    fn fix_path(&self) -> Option<String>;
}

impl FixPath for str {
    fn fix_path(&self) -> Option<String> {
        let rest = self.strip_prefix('~')?;
        if !(rest.is_empty() || rest.starts_with('/')) {
            return None;
        }

        let home = home::home_dir()?;
        Some(format!("{}{rest}", home.to_str()?))
    }
}

impl FixPath for String {
    fn fix_path(&self) -> Option<String> {
        self.as_str().fix_path()
    }
}

/// Expands `~` in a path given on the command line.
///
/// ```rust
/// use rsync_backup_rs::utils::FixPath;
///
/// let path = std::path::PathBuf::from("backup.ron");
/// assert!(path.fix_path().is_none());
/// ```
impl FixPath for Path {
    fn fix_path(&self) -> Option<String> {
        self.to_str()?.fix_path()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_plain_paths_are_untouched() {
        assert!("/data".fix_path().is_none());
        assert!("relative/dir".fix_path().is_none());
        assert_eq!(fix_path!("/data"), "/data");
    }

    #[test]
    fn test_other_users_home_is_untouched() {
        assert!("~alice/files".fix_path().is_none());
    }

    #[test]
    fn test_tilde_expands_to_home() {
        let Some(home) = home::home_dir() else {
            return;
        };
        let home = home.to_string_lossy().to_string();

        assert_eq!("~".fix_path(), Some(home.clone()));
        assert_eq!(
            String::from("~/Documents/").fix_path(),
            Some(format!("{home}/Documents/"))
        );
    }
}
