use crate::{
    config::JobMap,
    error::{JobError, RunError},
    job::JobDescriptor,
    logging::*,
    options::{BaseOptions, OptionSet},
    pattern::{pattern_text, PatternFile, PatternKind},
};

use std::{
    env,
    io::{self, Write},
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

/// The synchronization program every job invokes.
pub const SYNC_TOOL: &str = "rsync";

/// Shell used to run the constructed command line.
const SHELL: &str = "/bin/sh";

const SIGINT: i32 = 2;

/// What the runner learns from one command execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    Success,
    /// Non-zero exit, with the code if the process exited normally.
    Failed(Option<i32>),
    /// The command was stopped by SIGINT.
    Interrupted,
}

impl From<ExitStatus> for ExecStatus {
    fn from(status: ExitStatus) -> Self {
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if status.signal() == Some(SIGINT) {
                return ExecStatus::Interrupted;
            }
        }

        match status.code() {
            Some(0) => ExecStatus::Success,
            // Shells report a child killed by SIGINT as 128 + 2.
            Some(code) if code == 128 + SIGINT => ExecStatus::Interrupted,
            code => ExecStatus::Failed(code),
        }
    }
}

/// Set once the user presses Ctrl-C.
pub type InterruptFlag = Arc<AtomicBool>;

/// Catches SIGINT for the rest of the process lifetime and returns the flag
/// it raises.
///
/// The child shell and rsync reset the handler on exec, so they still die
/// from the signal; the wait on them returns and the runner sees the flag,
/// whatever exit status rsync chose.
pub fn install_interrupt_handler() -> Result<InterruptFlag, ctrlc::Error> {
    let flag = InterruptFlag::default();
    let raised = flag.clone();
    ctrlc::set_handler(move || raised.store(true, Ordering::SeqCst))?;
    Ok(flag)
}

/// Runs a constructed command line and waits for it to finish.
pub trait Executor {
    fn execute(&mut self, command: &str) -> io::Result<ExecStatus>;
}

impl<F> Executor for F
where
    F: FnMut(&str) -> io::Result<ExecStatus>,
{
    fn execute(&mut self, command: &str) -> io::Result<ExecStatus> {
        self(command)
    }
}

/// Executes commands through `/bin/sh -c`, inheriting stdio so rsync's own
/// output reaches the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellExecutor;

impl Executor for ShellExecutor {
    fn execute(&mut self, command: &str) -> io::Result<ExecStatus> {
        let status = Command::new(SHELL).arg("-c").arg(command).status()?;
        Ok(status.into())
    }
}

/// How a single job ended.
#[derive(Debug)]
pub enum JobOutcome {
    /// The job is disabled; nothing was created or run.
    Skipped,
    /// Dry run: the command was printed instead of executed.
    Reported,
    Succeeded,
    Failed(JobError),
}

/// Tally of a complete run.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub skipped: usize,
    pub reported: usize,
    pub succeeded: usize,
    /// Names of the jobs that failed, in run order.
    pub failed: Vec<String>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The pattern files of one job. Dropping this deletes whatever was created.
struct PatternFiles {
    include: Option<PatternFile>,
    exclude: Option<PatternFile>,
}

impl PatternFiles {
    fn create(job: &JobDescriptor, dir: &Path) -> Result<Self, JobError> {
        let create = |kind: PatternKind, patterns: &[String]| {
            PatternFile::create(kind, patterns, dir).map_err(|source| JobError::PatternFile {
                kind: kind.as_str(),
                source,
            })
        };

        let include = create(PatternKind::Include, job.include_patterns())?;
        let exclude = create(PatternKind::Exclude, job.exclude_patterns())?;

        Ok(Self { include, exclude })
    }

    fn cleanup(self) {
        for file in [self.include, self.exclude].into_iter().flatten() {
            let kind = file.kind();
            let path = file.path().to_path_buf();
            match file.remove() {
                Ok(()) => debug!("Removed {kind} file {}", path.display()),
                Err(e) => warn!("Cannot remove {kind} file {}: {e}", path.display()),
            }
        }
    }
}

/// Executes configured jobs one after another.
///
/// # Examples
///
/// ```rust
/// use rsync_backup_rs::job::JobDescriptor;
/// use rsync_backup_rs::options::BaseOptions;
/// use rsync_backup_rs::runner::JobRunner;
///
/// let jobs = vec![(String::from("CONFIG"), JobDescriptor::new("/data", "/backup").unwrap())];
/// let mut runner = JobRunner::new(BaseOptions::from_cli(Some("-a"), false), Vec::new())
///     .dry_run(true)
///     .with_output(Vec::new());
///
/// let summary = runner.run_all(&jobs).unwrap();
/// assert_eq!(summary.reported, 1);
///
/// let printed = String::from_utf8(runner.output().clone()).unwrap();
/// assert!(printed.starts_with("rsync -a \"/data/\" \"/backup\"\n"));
/// ```
pub struct JobRunner<E = ShellExecutor, W = io::Stdout> {
    executor: E,
    out: W,
    base: BaseOptions,
    extra: Vec<String>,
    dry_run: bool,
    tool: String,
    tmp_dir: PathBuf,
    interrupted: InterruptFlag,
}

impl JobRunner {
    /// A runner that executes through the shell and prints dry-run reports
    /// to stdout. `extra` are the options given after the config file on the
    /// command line.
    pub fn new(base: BaseOptions, extra: Vec<String>) -> Self {
        Self {
            executor: ShellExecutor,
            out: io::stdout(),
            base,
            extra,
            dry_run: false,
            tool: SYNC_TOOL.to_string(),
            tmp_dir: env::temp_dir(),
            interrupted: InterruptFlag::default(),
        }
    }
}

impl<E, W> JobRunner<E, W>
where
    E: Executor,
    W: Write,
{
    pub fn with_executor<E2: Executor>(self, executor: E2) -> JobRunner<E2, W> {
        JobRunner {
            executor,
            out: self.out,
            base: self.base,
            extra: self.extra,
            dry_run: self.dry_run,
            tool: self.tool,
            tmp_dir: self.tmp_dir,
            interrupted: self.interrupted,
        }
    }

    pub fn with_output<W2: Write>(self, out: W2) -> JobRunner<E, W2> {
        JobRunner {
            executor: self.executor,
            out,
            base: self.base,
            extra: self.extra,
            dry_run: self.dry_run,
            tool: self.tool,
            tmp_dir: self.tmp_dir,
            interrupted: self.interrupted,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Overrides the program placed at the start of every command.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Overrides where pattern files are created.
    pub fn with_tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = dir.into();
        self
    }

    /// Watches `flag` for a user interrupt. Once it is raised, the running
    /// job is treated as interrupted and no further job starts.
    pub fn with_interrupt_flag(mut self, flag: InterruptFlag) -> Self {
        self.interrupted = flag;
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Runs every job in order. Job failures are collected in the summary;
    /// only an interrupt stops the run early.
    pub fn run_all(&mut self, jobs: &JobMap) -> Result<RunSummary, RunError> {
        let mut summary = RunSummary::default();

        for (name, job) in jobs {
            match self.run_job(name, job)? {
                JobOutcome::Skipped => summary.skipped += 1,
                JobOutcome::Reported => summary.reported += 1,
                JobOutcome::Succeeded => summary.succeeded += 1,
                JobOutcome::Failed(_) => summary.failed.push(name.clone()),
            }
        }

        Ok(summary)
    }

    /// Runs a single job through its whole lifecycle. Pattern files are gone
    /// by the time this returns.
    pub fn run_job(&mut self, name: &str, job: &JobDescriptor) -> Result<JobOutcome, RunError> {
        if self.is_interrupted() {
            return Err(interrupt(name));
        }
        if !job.enabled() {
            debug!("Config {name} disabled, skipped");
            return Ok(JobOutcome::Skipped);
        }
        debug!("Config: {name}");

        let options = OptionSet::resolve(&self.base, job, &self.extra);

        let files = match PatternFiles::create(job, &self.tmp_dir) {
            Ok(files) => files,
            Err(e) => {
                error!("Config {name}: {e}");
                return Ok(JobOutcome::Failed(e));
            }
        };

        let command = self.build_command(job, &options, &files);
        let result = if self.dry_run {
            self.report(name, job, &command)
        } else {
            self.execute(name, command)
        };

        files.cleanup();
        result
    }

    fn build_command(
        &self,
        job: &JobDescriptor,
        options: &OptionSet,
        files: &PatternFiles,
    ) -> String {
        let mut parts = vec![self.tool.clone()];
        parts.extend(options.as_slice().iter().cloned());
        parts.extend(files.exclude.as_ref().map(PatternFile::flag));
        parts.extend(files.include.as_ref().map(PatternFile::flag));
        parts.push(format!("\"{}\"", job.source_dir()));
        parts.push(format!("\"{}\"", job.dest_dir()));

        parts.join(" ")
    }

    fn report(
        &mut self,
        name: &str,
        job: &JobDescriptor,
        command: &str,
    ) -> Result<JobOutcome, RunError> {
        let written = writeln!(self.out, "{command}").and_then(|_| {
            writeln!(
                self.out,
                "Include:\n{}\nExclude:\n{}",
                pattern_text(job.include_patterns()),
                pattern_text(job.exclude_patterns()),
            )
        });

        match written.and_then(|_| self.out.flush()) {
            Ok(()) => Ok(JobOutcome::Reported),
            Err(source) => {
                let e = JobError::Report { source };
                error!("Config {name}: {e}");
                Ok(JobOutcome::Failed(e))
            }
        }
    }

    fn execute(&mut self, name: &str, command: String) -> Result<JobOutcome, RunError> {
        info!("Running {name}");
        debug!("Run shell command: {command}");

        let result = self.executor.execute(&command);
        // rsync traps SIGINT itself and exits with its own code.
        if self.is_interrupted() {
            return Err(interrupt(name));
        }

        let error = match result {
            Ok(ExecStatus::Success) => {
                info!("Finished {name}");
                return Ok(JobOutcome::Succeeded);
            }
            Ok(ExecStatus::Interrupted) => return Err(interrupt(name)),
            Ok(ExecStatus::Failed(code)) => JobError::Failed { command, code },
            Err(source) => JobError::Spawn { command, source },
        };

        error!("Something went wrong in {name}. {error}");
        Ok(JobOutcome::Failed(error))
    }

    fn is_interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }
}

fn interrupt(name: &str) -> RunError {
    info!("Keyboard interrupt received, exit");
    RunError::Interrupted {
        job: name.to_string(),
    }
}
