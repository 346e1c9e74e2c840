//! Bounded concurrent load runner
//!
//! A run launches a fixed number of workers on the blocking thread pool. Each
//! worker calls its work unit in a tight loop until its wall-clock budget has
//! elapsed, checking the clock after every call. The caller then performs a
//! single aggregate wait bounded by [`max_wait`].
//!
//! ```text
//! LoadRun::launch(settings, work)
//!   ├── worker 0: loop { execute(); if elapsed > ttl break }
//!   ├── worker 1: ...
//!   └── worker N-1
//! LoadRun::wait() -> LoadReport { outcome: Completed | TimedOut | WorkerFailures }
//! ```
//!
//! The task set is owned by the run, so nothing accumulates across runs. A
//! timed-out wait never raises: it is reported in [`LoadOutcome`], and the
//! workers still looping are told to stop at their next iteration boundary.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::LoadSettings;
use crate::work::WorkUnit;
use crate::Result;

/// Each group of this many workers adds one time budget to the aggregate wait
pub const WORKERS_PER_WAIT_STEP: usize = 5;

// Stand-in deadline for wait bounds that overflow `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Aggregate wait bound: `thread_ttl_ms * floor(threads_count / 5)`.
///
/// Fewer than five workers yields zero.
pub fn max_wait(threads_count: usize, thread_ttl_ms: u64) -> Duration {
    let steps = (threads_count / WORKERS_PER_WAIT_STEP) as u64;
    Duration::from_millis(thread_ttl_ms.saturating_mul(steps))
}

/// What a single worker did
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStats {
    pub worker: usize,
    pub iterations: u64,
    pub errors: u64,
    pub busy: Duration,
    /// Stopped by a timed-out wait rather than its own budget
    pub cancelled: bool,
}

/// Terminal state of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LoadOutcome {
    /// Every worker finished within the wait bound
    Completed,

    /// The wait bound elapsed with workers still running
    TimedOut { pending: usize },

    /// All workers ended but some of them panicked
    WorkerFailures { failed: usize },
}

/// Result of a load run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadReport {
    pub run_id: Uuid,
    pub work_unit: String,
    pub started_at: DateTime<Utc>,
    pub settings: LoadSettings,
    pub max_wait_ms: u64,
    pub elapsed_ms: u64,
    /// Workers that finished before the wait ended, ordered by index
    pub workers: Vec<WorkerStats>,
    pub failures: Vec<String>,
    pub outcome: LoadOutcome,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.outcome == LoadOutcome::Completed
    }

    pub fn total_iterations(&self) -> u64 {
        self.workers.iter().map(|w| w.iterations).sum()
    }

    pub fn total_errors(&self) -> u64 {
        self.workers.iter().map(|w| w.errors).sum()
    }

    /// Write the report as pretty JSON into `dir`
    pub fn write_json(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("load-report.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Report written to: {}", path.display());
        Ok(path)
    }
}

/// An in-flight load run
pub struct LoadRun {
    run_id: Uuid,
    work_unit: String,
    settings: LoadSettings,
    started_at: DateTime<Utc>,
    started: Instant,
    tasks: JoinSet<WorkerStats>,
    cancel: CancellationToken,
}

impl LoadRun {
    /// Start `settings.threads_count` workers running `work`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn launch(settings: LoadSettings, work: Arc<dyn WorkUnit>) -> Self {
        let run_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let budget = settings.time_budget();
        let mut tasks = JoinSet::new();
        let started_at = Utc::now();
        let started = Instant::now();

        info!(
            %run_id,
            unit = work.name(),
            "Load run started with {} workers",
            settings.threads_count()
        );
        info!("Each worker budget is {} ms", settings.thread_ttl_ms());

        for worker in 0..settings.threads_count() {
            info!(worker, "Worker {} is starting", worker);
            let work = Arc::clone(&work);
            let cancel = cancel.clone();
            tasks.spawn_blocking(move || worker_loop(worker, budget, work.as_ref(), &cancel));
        }

        Self {
            run_id,
            work_unit: work.name().to_string(),
            settings,
            started_at,
            started,
            tasks,
            cancel,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Workers not yet collected
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for all workers, bounded by [`max_wait`] of the run's settings
    pub async fn wait(self) -> LoadReport {
        let threads_count = self.settings.threads_count();
        let bound = max_wait(threads_count, self.settings.thread_ttl_ms());
        if bound.is_zero() {
            warn!(
                threads_count,
                "Wait bound is zero with fewer than {} workers; \
                 the wait times out unless every worker is already done",
                WORKERS_PER_WAIT_STEP
            );
        }
        self.wait_with_timeout(bound).await
    }

    /// Wait for all workers, bounded by `bound`
    pub async fn wait_with_timeout(mut self, bound: Duration) -> LoadReport {
        let max_wait_ms = u64::try_from(bound.as_millis()).unwrap_or(u64::MAX);
        info!("Max waiting will be {} ms", max_wait_ms);

        let now = tokio::time::Instant::now();
        let deadline = now.checked_add(bound).unwrap_or_else(|| now + FAR_FUTURE);
        let mut workers = Vec::with_capacity(self.tasks.len());
        let mut failures = Vec::new();
        let mut timed_out = false;

        loop {
            match tokio::time::timeout_at(deadline, self.tasks.join_next()).await {
                Ok(Some(Ok(stats))) => {
                    debug!(worker = stats.worker, "Worker collected");
                    workers.push(stats);
                }
                Ok(Some(Err(e))) => {
                    error!(error = %e, "Worker task failed");
                    failures.push(e.to_string());
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    break;
                }
            }
        }

        let outcome = if timed_out {
            let pending = self.tasks.len();
            error!(
                pending,
                max_wait_ms,
                "Timed out waiting for {} of {} workers",
                pending,
                self.settings.threads_count()
            );
            self.cancel.cancel();
            self.tasks.detach_all();
            LoadOutcome::TimedOut { pending }
        } else if !failures.is_empty() {
            LoadOutcome::WorkerFailures {
                failed: failures.len(),
            }
        } else {
            LoadOutcome::Completed
        };

        workers.sort_by_key(|w| w.worker);
        let elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        info!(
            run_id = %self.run_id,
            ?outcome,
            iterations = workers.iter().map(|w| w.iterations).sum::<u64>(),
            "Load run finished in {} ms",
            elapsed_ms
        );

        LoadReport {
            run_id: self.run_id,
            work_unit: std::mem::take(&mut self.work_unit),
            started_at: self.started_at,
            settings: self.settings,
            max_wait_ms,
            elapsed_ms,
            workers,
            failures,
            outcome,
        }
    }
}

impl Drop for LoadRun {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Launch a run and wait for it
pub async fn run_load(settings: LoadSettings, work: Arc<dyn WorkUnit>) -> LoadReport {
    LoadRun::launch(settings, work).wait().await
}

fn worker_loop(
    worker: usize,
    budget: Duration,
    work: &dyn WorkUnit,
    cancel: &CancellationToken,
) -> WorkerStats {
    let started = Instant::now();
    let mut stats = WorkerStats {
        worker,
        iterations: 0,
        errors: 0,
        busy: Duration::ZERO,
        cancelled: false,
    };

    loop {
        if cancel.is_cancelled() {
            stats.cancelled = true;
            break;
        }

        if let Err(e) = work.execute() {
            stats.errors += 1;
            error!(worker, unit = work.name(), error = %e, "Work unit iteration failed");
        }
        stats.iterations += 1;

        if started.elapsed() > budget {
            break;
        }
    }

    stats.busy = started.elapsed();
    info!(
        worker,
        iterations = stats.iterations,
        errors = stats.errors,
        "Worker {} is finishing",
        worker
    );
    stats
}
