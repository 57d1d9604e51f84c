use crate::{logging::Verbosity, options::DEFAULT_OPTIONS};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rsync-backup")]
#[command(author = "Laurence Liu <liuxy6@gmail.com>")]
#[command(version, about = "Use rsync to backup and to restore files.", long_about = None)]
#[command(after_help = default_options_help())]
pub struct Args {
    /// Keep quiet: only warnings and errors, and no --verbose in the default rsync options
    #[clap(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Increase verbosity
    #[clap(short, long)]
    pub verbose: bool,

    /// Print the rsync commands and patterns instead of running them
    #[clap(short = 'n', long = "show-cmd", visible_alias = "dry-run")]
    pub show_cmd: bool,

    /// Replace the default rsync options
    #[clap(
        long = "rsync-opts",
        visible_alias = "backup-opts",
        value_name = "OPTIONS",
        allow_hyphen_values = true
    )]
    pub rsync_opts: Option<String>,

    /// The configuration file describing the backup jobs
    #[clap(value_name = "CONFIG_FILE")]
    pub config_path: PathBuf,

    /// Additional options passed to every rsync command
    #[clap(
        value_name = "ADDITIONAL_RSYNC_OPTIONS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub extra_options: Vec<String>,
}

impl Args {
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}

fn default_options_help() -> String {
    format!("Default rsync options: {}", DEFAULT_OPTIONS.join(" "))
}

pub fn get_env_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod test {
    use super::*;
    use clap::{error::ErrorKind, CommandFactory};

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("rsync-backup").chain(args.iter().copied()))
    }

    #[test]
    fn test_command_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_flags_and_config() {
        let args = parse(&["-v", "-n", "--rsync-opts=-a --delete", "backup.ron"]).unwrap();

        assert!(args.verbose);
        assert!(args.show_cmd);
        assert_eq!(args.rsync_opts.as_deref(), Some("-a --delete"));
        assert_eq!(args.config_path, PathBuf::from("backup.ron"));
        assert!(args.extra_options.is_empty());
        assert_eq!(args.verbosity(), Verbosity::Verbose);
    }

    #[test]
    fn test_aliases() {
        let args = parse(&["--dry-run", "--backup-opts", "-rt", "backup.ron"]).unwrap();

        assert!(args.show_cmd);
        assert_eq!(args.rsync_opts.as_deref(), Some("-rt"));
    }

    #[test]
    fn test_everything_after_config_is_forwarded() {
        let args = parse(&["-q", "backup.ron", "--bwlimit=100", "-n", "--checksum"]).unwrap();

        assert!(args.quiet);
        assert!(!args.show_cmd);
        assert_eq!(args.extra_options, ["--bwlimit=100", "-n", "--checksum"]);
    }

    #[test]
    fn test_config_file_is_required() {
        let err = parse(&["-v"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let err = parse(&["-q", "-v", "backup.ron"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_help_lists_default_options() {
        let help = Args::command().render_help().to_string();
        assert!(help.contains("Default rsync options: --verbose --human-readable --archive"));
    }
}
