use anyhow::{Context, Result};
use rsync_backup_rs::{
    args::{get_env_args, Args},
    config::load_config,
    error::RunError,
    logging::{self, *},
    options::BaseOptions,
    runner::{install_interrupt_handler, JobRunner},
};
use std::process::ExitCode;

fn run(args: Args) -> Result<ExitCode> {
    let interrupted = install_interrupt_handler().context("Failed to set the SIGINT handler")?;
    let jobs = load_config(&args.config_path).context("Failed to load configuration")?;

    let base = BaseOptions::from_cli(args.rsync_opts.as_deref(), args.quiet);
    if args.rsync_opts.is_some() {
        debug!("Set default options: {}", base.as_slice().join(" "));
    }

    let mut runner = JobRunner::new(base, args.extra_options)
        .dry_run(args.show_cmd)
        .with_interrupt_flag(interrupted);
    let summary = match runner.run_all(&jobs) {
        Ok(summary) => summary,
        Err(e @ RunError::Interrupted { .. }) => {
            error!("{e}");
            return Ok(ExitCode::from(130));
        }
    };

    if summary.is_success() {
        debug!(
            "Done: {} succeeded, {} reported, {} skipped",
            summary.succeeded, summary.reported, summary.skipped
        );
        Ok(ExitCode::SUCCESS)
    } else {
        error!("Failed jobs: {}", summary.failed.join(", "));
        Ok(ExitCode::FAILURE)
    }
}

fn main() -> ExitCode {
    let args = get_env_args();
    logging::init_tracing(args.verbosity());

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
