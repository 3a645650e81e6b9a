/*!
 * orbit-snapshot CLI
 *
 * Run from cron or a systemd timer, typically once a day:
 *
 *     orbit-snapshot /etc/orbit/snapshots.toml
 */

use chrono::Local;
use clap::{Parser, ValueEnum};
use orbit_snapshot::{
    config::{LogLevel, SnapshotConfig},
    core::{RunSummary, Runner, SnapshotMatcher},
    error::{Result, EXIT_PARTIAL, EXIT_SUCCESS},
    logging,
    system::{DryRunSystem, ZfsSystem},
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "orbit-snapshot")]
#[command(version, about = "Rotate daily, weekly and monthly ZFS snapshots", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Show what would be created and destroyed without changing anything
    #[arg(short = 'n', long)]
    dry_run: bool,

    /// Verbose logging (same as --log-level debug)
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Log level
    #[arg(long, value_enum)]
    log_level: Option<LogLevelArg>,

    /// Append JSON logs to this file instead of stderr
    #[arg(long = "log", value_name = "FILE")]
    log: Option<PathBuf>,

    /// Path to the zfs binary
    #[arg(long, value_name = "PATH")]
    zfs_binary: Option<PathBuf>,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevelArg> for LogLevel {
    fn from(arg: LogLevelArg) -> Self {
        match arg {
            LogLevelArg::Error => LogLevel::Error,
            LogLevelArg::Warn => LogLevel::Warn,
            LogLevelArg::Info => LogLevel::Info,
            LogLevelArg::Debug => LogLevel::Debug,
            LogLevelArg::Trace => LogLevel::Trace,
        }
    }
}

fn main() {
    let code = match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();

    let mut config = SnapshotConfig::from_file(&cli.config)?;
    if cli.dry_run {
        config.dry_run = true;
    }
    if cli.verbose {
        config.verbose = true;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level.into();
    }
    if let Some(log) = cli.log {
        config.log_file = Some(log);
    }
    if let Some(binary) = cli.zfs_binary {
        config.zfs_binary = binary;
    }

    if let Err(e) = logging::init_logging(&config) {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    let matcher = SnapshotMatcher::new()?;
    let zfs = ZfsSystem::with_binary(&config.zfs_binary, matcher.clone());
    let today = Local::now().date_naive();

    info!(
        volumes = config.volumes.len(),
        dry_run = config.dry_run,
        zfs = %zfs.binary().display(),
        "Starting snapshot rotation for {}",
        today
    );

    let summary = if config.dry_run {
        let runner = Runner::from_config(DryRunSystem::new(zfs), matcher, &config);
        let result = runner.run(&config.volumes, today);
        // Print the plan even when an abort cut the run short
        for op in runner.system().operations() {
            println!("would {}", op);
        }
        result?
    } else {
        Runner::from_config(zfs, matcher, &config).run(&config.volumes, today)?
    };

    Ok(report(&summary))
}

/// Print continue-mode failures and pick the exit code
fn report(summary: &RunSummary) -> i32 {
    for failure in &summary.failures {
        eprintln!("Error: {}", failure);
    }
    if summary.is_success() {
        EXIT_SUCCESS
    } else {
        EXIT_PARTIAL
    }
}
