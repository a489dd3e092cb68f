//! Periodic fetch → aggregate → store cycles.
//!
//! [`Scheduler::tick`] is the whole state machine and takes the current time
//! as an argument, so it can be driven directly. [`Scheduler::start`] wraps it
//! in a cancellable tokio task that ticks on a fixed interval.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime, TimeDelta, Timelike};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::aggregate::Aggregator;
use crate::config;
use crate::error::{HiveStatsError, Result};
use crate::fetch::SnapshotSource;
use crate::store::{read_cleaned, SnapshotKind, SnapshotStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
}

/// Files produced by one successful cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub at: NaiveDateTime,
    pub raw: PathBuf,
    pub cleaned: PathBuf,
    pub records: usize,
}

#[derive(Debug)]
pub enum TickOutcome {
    Completed(CycleReport),
    /// The latest cleaned snapshot is still fresh.
    Skipped { latest: NaiveDateTime },
    /// Another cycle was already in flight.
    Busy,
    Failed(HiveStatsError),
}

impl TickOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, TickOutcome::Completed(_))
    }
}

pub struct Scheduler {
    source: Arc<dyn SnapshotSource>,
    aggregator: Aggregator,
    store: SnapshotStore,
    interval: Duration,
    staleness: TimeDelta,
    running: AtomicBool,
}

impl Scheduler {
    pub fn new(source: Arc<dyn SnapshotSource>, aggregator: Aggregator, store: SnapshotStore) -> Self {
        Self {
            source,
            aggregator,
            store,
            interval: config::DEFAULT_TICK_INTERVAL,
            staleness: to_time_delta(config::DEFAULT_STALENESS),
            running: AtomicBool::new(false),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_staleness(mut self, staleness: Duration) -> Self {
        self.staleness = to_time_delta(staleness);
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn state(&self) -> SchedulerState {
        if self.running.load(Ordering::Acquire) {
            SchedulerState::Running
        } else {
            SchedulerState::Idle
        }
    }

    /// Run a cycle if the latest cleaned snapshot is missing or older than
    /// `now - staleness`; otherwise skip.
    ///
    /// Never panics and never returns an error: failures are logged and
    /// reported as [`TickOutcome::Failed`].
    pub fn tick(&self, now: NaiveDateTime) -> TickOutcome {
        let Some(_running) = RunningGuard::acquire(&self.running) else {
            info!("cycle already in flight; skipping tick");
            return TickOutcome::Busy;
        };

        let latest = match self.store.latest(SnapshotKind::Cleaned) {
            Ok(Some(path)) => match read_cleaned(&path) {
                Ok(snapshot) => snapshot.timestamp(),
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "latest cleaned snapshot is unreadable; treating as stale"
                    );
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                error!(error = %e, "could not inspect data directory");
                return TickOutcome::Failed(e);
            }
        };

        if let Some(latest) = latest {
            let fresh = now
                .checked_sub_signed(self.staleness)
                .is_none_or(|threshold| latest >= threshold);
            if fresh {
                info!(%latest, "latest snapshot is fresh; skipping tick");
                return TickOutcome::Skipped { latest };
            }
        }

        self.cycle(now)
    }

    /// Run one cycle regardless of staleness.
    pub fn run_cycle(&self, now: NaiveDateTime) -> TickOutcome {
        let Some(_running) = RunningGuard::acquire(&self.running) else {
            info!("cycle already in flight; not starting another");
            return TickOutcome::Busy;
        };
        self.cycle(now)
    }

    fn cycle(&self, now: NaiveDateTime) -> TickOutcome {
        match self.try_cycle(now) {
            Ok(report) => {
                info!(
                    at = %report.at,
                    records = report.records,
                    cleaned = %report.cleaned.display(),
                    "snapshot cycle completed"
                );
                TickOutcome::Completed(report)
            }
            Err(e) => {
                if e.is_fetch() {
                    warn!(error = %e, "snapshot fetch failed; waiting for next tick");
                } else {
                    error!(error = %e, "snapshot cycle failed");
                }
                TickOutcome::Failed(e)
            }
        }
    }

    fn try_cycle(&self, now: NaiveDateTime) -> Result<CycleReport> {
        let at = now.with_nanosecond(0).unwrap_or(now);
        let fetched = self.source.fetch()?;
        let cleaned = self.aggregator.aggregate(&fetched.payload, at);

        let raw = self.store.store(&fetched.body, SnapshotKind::Raw, at)?;
        let cleaned_path = match self.store.store(&cleaned, SnapshotKind::Cleaned, at) {
            Ok(path) => path,
            Err(e) => {
                // A raw file without its cleaned twin would never be reported on.
                if let Err(rm) = std::fs::remove_file(&raw) {
                    warn!(path = %raw.display(), error = %rm, "could not remove orphaned raw snapshot");
                }
                return Err(e);
            }
        };

        Ok(CycleReport {
            at,
            raw,
            cleaned: cleaned_path,
            records: cleaned.record_count(),
        })
    }

    /// Spawn the periodic loop on the current tokio runtime.
    ///
    /// The first tick fires immediately. Cycles run on the blocking pool so a
    /// slow fetch never stalls the runtime.
    pub fn start(self: Arc<Self>) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(interval = ?self.interval, "scheduler started");

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let scheduler = Arc::clone(&self);
                        let now = Local::now().naive_local();
                        match tokio::task::spawn_blocking(move || scheduler.tick(now)).await {
                            Ok(outcome) => debug!(?outcome, "tick finished"),
                            Err(e) => error!(error = %e, "tick task failed"),
                        }
                    }
                }
            }

            info!("scheduler stopped");
        });

        SchedulerHandle { cancel, task }
    }
}

/// Running scheduler loop. Dropping the handle does not stop the loop.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop ticking. An in-flight cycle is allowed to finish first.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            error!(error = %e, "scheduler task ended abnormally");
        }
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Holds the Running state for the duration of one cycle.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

fn to_time_delta(d: Duration) -> TimeDelta {
    TimeDelta::from_std(d).unwrap_or(TimeDelta::MAX)
}
