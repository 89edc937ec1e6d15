use std::path::PathBuf;
use std::process::ExitCode;

use chrono::Local;
use clap::{ArgAction, Args, Parser, error::ErrorKind};
use tracing::{error, info};

use crate::config::{LabelConfig, ScanConfig, default_workers};
use crate::constants::logging::DEFAULT_LOG_FILE;
use crate::errors::LabelerError;
use crate::logging::{LogConfig, Verbosity, init_logging};
use crate::operator::{ConsoleOperator, Operator};
use crate::scanner::DirectoryScanner;
use crate::session::{FreshSession, LabelingSession, ResumeSession, SessionReport};
use crate::table::is_table_path;

const FINDER_USAGE: &str = "usage: finder <root_dir> <target_line_count> <tolerance> (e.g. `finder /data/minisrc 100 20`); use -v to enable logging";
const LABELER_USAGE: &str = "usage: labeler <file_list.bin> <output.csv> <sample_size> <label_name> to start labeling, or labeler <output.csv> to continue; use -v to enable logging";

/// Flags shared by both binaries.
#[derive(Debug, Args)]
struct CommonArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help = "Raise log verbosity (-v informational, -vv diagnostic)"
    )]
    verbose: u8,
    #[arg(long, help = "Print the tool version and continue")]
    version: bool,
    #[arg(
        long = "log-file",
        value_name = "PATH",
        default_value = DEFAULT_LOG_FILE,
        help = "Append-only process log"
    )]
    log_file: PathBuf,
    #[arg(long = "no-log-file", help = "Log to the console only")]
    no_log_file: bool,
}

impl CommonArgs {
    fn log_config(&self) -> LogConfig {
        LogConfig {
            verbosity: Verbosity::from_count(self.verbose),
            log_file: (!self.no_log_file).then(|| self.log_file.clone()),
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "finder",
    disable_help_subcommand = true,
    disable_version_flag = true,
    about = "Find source files of a target length",
    long_about = "Walk ROOT_DIR, keep source files whose line count is within TOLERANCE of TARGET_LINE_COUNT, and save the (source, metadata) pairs for the labeler.",
    after_help = "Example: finder /data/minisrc 100 20"
)]
struct FinderCli {
    #[arg(value_name = "ROOT_DIR", help = "Directory to scan recursively")]
    root: PathBuf,
    #[arg(value_name = "TARGET_LINE_COUNT", help = "Desired number of lines")]
    target_lines: usize,
    #[arg(value_name = "TOLERANCE", help = "Accepted +/- distance from the target")]
    tolerance: usize,
    #[arg(
        long,
        value_parser = parse_positive_usize,
        help = "Line-count workers (defaults to a quarter of the available cores)"
    )]
    workers: Option<usize>,
    #[arg(
        long = "output-dir",
        value_name = "DIR",
        default_value = ".",
        help = "Directory for the saved file list"
    )]
    output_dir: PathBuf,
    #[arg(long = "follow-links", help = "Follow symlinks while scanning")]
    follow_links: bool,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Parser)]
#[command(
    name = "labeler",
    disable_help_subcommand = true,
    disable_version_flag = true,
    about = "Label a random sample of found files",
    long_about = "Start a session with <file_list.bin> <output.csv> <sample_size> <label_name>, or continue a saved table with <output.csv>.",
    after_help = "Enter `exit` at a label prompt to save progress and stop; run `labeler <output.csv>` later to continue."
)]
struct LabelerCli {
    #[arg(value_name = "ARGS", num_args = 1..=4, required = true)]
    args: Vec<String>,
    #[arg(long, help = "Seed for a reproducible sample")]
    seed: Option<u64>,
    #[arg(long = "no-exit", help = "Do not offer the `exit` label")]
    no_exit: bool,
    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug)]
enum LabelerMode {
    Fresh(FreshSession),
    Resume(ResumeSession),
}

/// Entry point of the `finder` binary.
pub fn run_finder<I>(args: I) -> ExitCode
where
    I: IntoIterator<Item = String>,
{
    let args: Vec<String> = std::iter::once("finder".to_string()).chain(args).collect();
    let cli = match parse_cli::<FinderCli, _>(&args) {
        Ok(Some(cli)) => cli,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => return usage_failure(err, &args, FINDER_USAGE),
    };
    if let Some(code) = start(&cli.common) {
        return code;
    }

    let config = ScanConfig {
        root: cli.root,
        target_lines: cli.target_lines,
        tolerance: cli.tolerance,
        workers: cli.workers.unwrap_or_else(default_workers),
        follow_links: cli.follow_links,
        ..ScanConfig::default()
    };
    match DirectoryScanner::new(config).scan_and_persist(&cli.output_dir, &Local::now()) {
        Ok((path, files)) => {
            info!(path = %path.display(), count = files.len(), "saved found files");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "scan stopped");
            ExitCode::FAILURE
        }
    }
}

/// Entry point of the `labeler` binary.
pub fn run_labeler<I>(args: I) -> ExitCode
where
    I: IntoIterator<Item = String>,
{
    run_labeler_with(args, ConsoleOperator::stdio())
}

/// `labeler` with an explicit operator.
pub fn run_labeler_with<I, O>(args: I, operator: O) -> ExitCode
where
    I: IntoIterator<Item = String>,
    O: Operator,
{
    let args: Vec<String> = std::iter::once("labeler".to_string()).chain(args).collect();
    let cli = match parse_cli::<LabelerCli, _>(&args) {
        Ok(Some(cli)) => cli,
        Ok(None) => return ExitCode::SUCCESS,
        Err(err) => return usage_failure(err, &args, LABELER_USAGE),
    };
    if let Some(code) = start(&cli.common) {
        return code;
    }
    let mode = match labeler_mode(&cli) {
        Ok(mode) => mode,
        Err(err) => {
            error!(error = %err, "{LABELER_USAGE}");
            return ExitCode::FAILURE;
        }
    };

    let mut session = LabelingSession::new(operator);
    let outcome = match mode {
        LabelerMode::Fresh(request) => session.run_fresh(request),
        LabelerMode::Resume(request) => session.run_resume(request),
    };
    match outcome {
        Ok(report) => {
            log_report(&report);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!(error = %err, state = ?session.state(), "labeling stopped");
            ExitCode::FAILURE
        }
    }
}

fn labeler_mode(cli: &LabelerCli) -> Result<LabelerMode, LabelerError> {
    let config = LabelConfig {
        exit_label: !cli.no_exit,
        seed: cli.seed,
        ..LabelConfig::default()
    };
    match cli.args.as_slice() {
        [file_list, output, sample_size, label_name] => {
            let sample_size = parse_positive_usize(sample_size).map_err(|_| {
                LabelerError::InvalidArgument(format!(
                    "sample size '{sample_size}' is not a positive integer"
                ))
            })?;
            Ok(LabelerMode::Fresh(FreshSession {
                file_list_path: PathBuf::from(file_list),
                output_path: PathBuf::from(output),
                sample_size,
                config: LabelConfig {
                    label_name: label_name.clone(),
                    ..config
                },
            }))
        }
        [table] => {
            let table_path = PathBuf::from(table);
            if !is_table_path(&table_path) {
                return Err(LabelerError::InvalidArgument(format!(
                    "'{table}' is not a CSV file"
                )));
            }
            Ok(LabelerMode::Resume(ResumeSession { table_path, config }))
        }
        other => Err(LabelerError::InvalidArgument(format!(
            "expected 1 or 4 arguments, got {}",
            other.len()
        ))),
    }
}

fn log_report(report: &SessionReport) {
    info!(
        state = ?report.state,
        labeled = report.labeled,
        skipped = report.skipped,
        pending = report.pending,
        path = %report.output_path.display(),
        "labeling finished"
    );
}

/// Install logging and print the version when asked; `Some` means stop with that code.
fn start(common: &CommonArgs) -> Option<ExitCode> {
    if let Err(err) = init_logging(&common.log_config()) {
        eprintln!("failed to open log file: {err}");
        return Some(ExitCode::FAILURE);
    }
    if common.version {
        print_version();
    }
    None
}

fn print_version() {
    println!("{}", env!("CARGO_PKG_VERSION"));
}

/// True if `--version` appears among the flags (before any `--`).
fn version_requested(args: &[String]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|arg| arg.as_str() != "--")
        .any(|arg| arg == "--version")
}

/// Report a parse failure; `--version` is still honored first.
fn usage_failure(err: clap::Error, args: &[String], usage: &str) -> ExitCode {
    if version_requested(args) {
        print_version();
    }
    if let Err(log_err) = init_logging(&LogConfig::default()) {
        eprintln!("failed to open log file: {log_err}");
    }
    let err = LabelerError::InvalidArgument(err.to_string().trim().to_string());
    error!(error = %err, "{usage}");
    ExitCode::FAILURE
}

fn parse_positive_usize(raw: &str) -> Result<usize, String> {
    let parsed = raw
        .parse::<usize>()
        .map_err(|_| format!("Could not parse '{raw}' as a positive integer"))?;
    if parsed == 0 {
        return Err("value must be greater than zero".to_string());
    }
    Ok(parsed)
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, clap::Error>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = err.print();
                Ok(None)
            }
            _ => Err(err),
        },
    }
}
