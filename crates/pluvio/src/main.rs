mod config;
mod deadline;

use std::{io, path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use config::{DeviceConfig, Overrides};
use deadline::{DeadlineError, run_blocking};
use pluvio_battery::{BatteryError, BatteryMonitor, FixedVoltage};
use pluvio_core::{DateClock, DatePartition, PluvioError, Resolution, today};
use pluvio_platform::{PlatformError, VolumeOps};
use pluvio_storage::{LocationResolver, VolumeSurvey};
use serde::Serialize;
use thiserror::Error;
use tokio::runtime;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[cfg(unix)]
use pluvio_platform_unix::UnixVolumeOps;

#[derive(Debug, Parser)]
#[command(name = "pluvio", about = "Rain-gauge data storage resolver")]
struct Cli {
    /// JSON configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory whose entries are probed as removable volumes.
    #[arg(long, global = true)]
    mount_root: Option<PathBuf>,
    /// Minimum free megabytes for a volume to be used.
    #[arg(long, global = true)]
    min_free_mb: Option<u64>,
    /// Fallback location when no volume qualifies.
    #[arg(long, global = true)]
    backup_path: Option<PathBuf>,
    /// Log per-candidate decisions.
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve and create the data directory for a date (default: today on the device clock).
    Resolve {
        date: Option<String>,
        /// Default to today's UTC date instead of the local one.
        #[arg(long)]
        utc: bool,
        #[arg(long)]
        json: bool,
        /// Give up if resolution takes longer than this.
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
    /// List mount-root entries with their mount state and free space.
    Scan {
        #[arg(long)]
        json: bool,
    },
    /// Calibrate and classify a raw battery voltage.
    Battery {
        #[arg(long)]
        raw: f64,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Pluvio(#[from] PluvioError),
    #[error(transparent)]
    Battery(#[from] BatteryError),
    #[error(transparent)]
    Deadline(#[from] DeadlineError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error("failed to encode json output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct ScanRow {
    path: PathBuf,
    mounted: bool,
    writable: bool,
    free_mb: Option<u64>,
}

impl From<VolumeSurvey> for ScanRow {
    fn from(survey: VolumeSurvey) -> Self {
        Self {
            path: survey.candidate.path,
            mounted: survey.candidate.mounted,
            writable: survey.candidate.writable,
            free_mb: survey.capacity.map(|report| report.free_mb()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("pluvio error: {err}");
            return ExitCode::from(1);
        }
    };
    let result = runtime.block_on(run(cli));
    // Do not wait on a resolution abandoned at its deadline.
    runtime.shutdown_background();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("pluvio error: {err}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let overrides = Overrides {
        mount_root: cli.mount_root,
        min_free_mb: cli.min_free_mb,
        backup_path: cli.backup_path,
    };
    let config = DeviceConfig::resolve(cli.config.as_deref(), &overrides)?;

    match cli.command {
        Command::Resolve {
            date,
            utc,
            json,
            timeout_secs,
        } => {
            let resolver = LocationResolver::new(config.storage, select_platform()?)?;
            let clock = if utc { DateClock::Utc } else { DateClock::Local };
            let date = date.unwrap_or_else(|| DatePartition::from(today(clock)).to_string());
            info!(
                date = %date,
                mount_root = %resolver.config().mount_root.display(),
                min_free_mb = resolver.config().min_free_mb,
                "resolving storage path"
            );

            let limit = timeout_secs.map(Duration::from_secs);
            let resolution = run_blocking(limit, move || resolver.resolve(&date)).await??;
            print_resolution(&resolution, json)
        }
        Command::Scan { json } => {
            let resolver = LocationResolver::new(config.storage, select_platform()?)?;
            let rows: Vec<ScanRow> = resolver.survey().into_iter().map(ScanRow::from).collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else if rows.is_empty() {
                println!("no entries under {}", resolver.config().mount_root.display());
            } else {
                for row in rows {
                    println!(
                        "{}\tmounted={}\twritable={}\tfree_mb={}",
                        row.path.display(),
                        row.mounted,
                        row.writable,
                        row.free_mb
                            .map_or_else(|| "-".to_string(), |mb| mb.to_string())
                    );
                }
            }
            Ok(())
        }
        Command::Battery { raw, json } => {
            let mut monitor = BatteryMonitor::new(FixedVoltage(raw), config.battery)?;
            let reading = monitor.read_all()?;
            if json {
                println!("{}", serde_json::to_string(&reading)?);
            } else {
                println!("{:.2} V ({})", reading.voltage, reading.status.as_str());
            }
            Ok(())
        }
    }
}

fn print_resolution(resolution: &Resolution, json: bool) -> Result<(), CliError> {
    if json {
        println!("{}", serde_json::to_string_pretty(resolution)?);
    } else {
        println!("{}", resolution.path.display());
    }
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(unix)]
fn select_platform() -> Result<Arc<dyn VolumeOps>, PlatformError> {
    Ok(Arc::new(UnixVolumeOps::new()))
}

#[cfg(not(unix))]
fn select_platform() -> Result<Arc<dyn VolumeOps>, PlatformError> {
    Err(PlatformError::Unsupported(
        "no volume backend configured for this target".to_string(),
    ))
}
