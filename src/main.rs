use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use hivestats::{Category, HiveStats, TickOutcome};
use tracing_subscriber::{fmt, EnvFilter};

/// Hive OS pool statistics snapshots and reports.
#[derive(Parser)]
#[command(name = "hivestats", version, about)]
struct Cli {
    /// Directory holding snapshot files.
    #[arg(short, long, default_value = "data")]
    data_dir: PathBuf,

    /// Logging verbosity level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Take one snapshot if the latest is stale.
    Snapshot {
        /// Ignore the staleness check.
        #[arg(long)]
        force: bool,
    },
    /// Keep taking snapshots on a fixed interval until interrupted.
    Run {
        /// Seconds between ticks.
        #[arg(long, default_value_t = 3600)]
        interval: u64,
    },
    /// Write the snapshot, differences, and pivot exports.
    Export {
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },
    /// List every name recorded in a category.
    Names { category: Category },
    /// Print the daily-mean series of one name.
    Series { category: Category, name: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level)
        .with_context(|| format!("invalid log level: {}", cli.log_level))?;
    fmt().with_env_filter(filter).with_target(true).init();

    let mut builder = HiveStats::builder().data_dir(&cli.data_dir);
    if let Command::Run { interval } = &cli.command {
        builder = builder.interval(Duration::from_secs((*interval).max(1)));
    }
    let stats = builder
        .build()
        .with_context(|| format!("opening data directory {}", cli.data_dir.display()))?;

    match cli.command {
        Command::Snapshot { force } => match stats.snapshot(force) {
            TickOutcome::Completed(report) => {
                println!("Data created: {}", report.raw.display());
                println!("Data created: {}", report.cleaned.display());
            }
            TickOutcome::Skipped { latest } => {
                println!("Latest snapshot from {latest} is still fresh; use --force to take another.");
            }
            TickOutcome::Busy => bail!("another snapshot is in progress"),
            TickOutcome::Failed(e) => return Err(e).context("snapshot failed"),
        },
        Command::Run { .. } => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
                .context("building tokio runtime")?;
            rt.block_on(run(&stats))?;
        }
        Command::Export { out } => {
            let report = stats.export(&out).context("writing exports")?;
            for dir in [
                report.snapshot,
                report.differences,
                report.daily_pivot,
                report.monthly_pivot,
            ] {
                println!("Data created: {}", dir.display());
            }
        }
        Command::Names { category } => {
            for name in stats.names(category) {
                println!("{name}");
            }
        }
        Command::Series { category, name } => {
            let series = stats.series(category, &name);
            if series.is_empty() {
                bail!("no data for {name} in {}", category.label());
            }
            for point in series {
                match point.amount {
                    Some(amount) => println!("{}\t{amount:.4}", point.day),
                    None => println!("{}\t-", point.day),
                }
            }
        }
    }

    Ok(())
}

async fn run(stats: &HiveStats) -> Result<()> {
    let handle = stats.start();

    shutdown_signal().await?;

    handle.stop().await;
    tracing::info!("hivestats stopped");
    Ok(())
}

#[cfg(unix)]
async fn shutdown_signal() -> Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate()).context("registering SIGTERM handler")?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res.context("listening for SIGINT")?;
            tracing::info!("received SIGINT, shutting down");
        }
        _ = sigterm.recv() => {
            tracing::info!("received SIGTERM, shutting down");
        }
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> Result<()> {
    tokio::signal::ctrl_c().await.context("listening for ctrl-c")?;
    tracing::info!("received ctrl-c, shutting down");
    Ok(())
}
