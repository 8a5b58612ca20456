use super::{Clock, DailyTime};
use crate::diagnostics::HealthRegistry;
use crate::error::LikeError;
use crate::platform::state::ActionRecord;
use crate::platform::task::{BatchSummary, LikeExecutor, REASON_SCHEDULED};
use anyhow::Result;
use chrono::NaiveDateTime;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::{self, Duration, MissedTickBehavior};

const MIN_POLL_MILLIS: u64 = 100;
pub const DAILY_LIKE_JOB: &str = "daily_like";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub name: String,
    pub at: DailyTime,
    pub next_run: NaiveDateTime,
}

/// Owned registry of daily jobs. Shared by `Arc` between the runner loop
/// and the admin API (which only reads `next_run`).
#[derive(Debug, Default)]
pub struct Scheduler {
    jobs: Mutex<Vec<Job>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Job>> {
        self.jobs
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Registers (or re-registers) `name` to run daily at `at`.
    pub fn every_day_at(&self, name: &str, at: DailyTime, now: NaiveDateTime) -> NaiveDateTime {
        let next_run = at.next_after(now);
        let mut jobs = self.lock();
        jobs.retain(|job| job.name != name);
        jobs.push(Job {
            name: name.to_string(),
            at,
            next_run,
        });
        next_run
    }

    pub fn next_run(&self) -> Option<NaiveDateTime> {
        self.lock().iter().map(|job| job.next_run).min()
    }

    pub fn jobs(&self) -> Vec<Job> {
        self.lock().clone()
    }

    /// Names of the jobs due at `now`, each rescheduled to its next
    /// occurrence strictly after `now`. A job that missed several days
    /// fires once.
    pub fn take_due(&self, now: NaiveDateTime) -> Vec<String> {
        let mut due = Vec::new();
        for job in self.lock().iter_mut() {
            if job.next_run <= now {
                due.push(job.name.clone());
                job.next_run = job.at.next_after(now);
            }
        }
        due
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FireOutcome {
    /// Schedule switch was off; state left untouched
    Skipped,
    Ran(BatchSummary),
    Failed(LikeError),
}

/// The daily like job: gated by `schedule_enabled`, runs every target.
pub struct ScheduledLike {
    executor: Arc<LikeExecutor>,
    like_times: u32,
}

impl ScheduledLike {
    pub fn new(executor: Arc<LikeExecutor>, like_times: u32) -> Self {
        Self {
            executor,
            like_times,
        }
    }

    pub async fn fire(&self) -> FireOutcome {
        let store = self.executor.store();
        if !store.get().schedule_enabled {
            tracing::info!("schedule disabled, skipping daily like");
            return FireOutcome::Skipped;
        }

        match self.executor.run_all(self.like_times, REASON_SCHEDULED).await {
            Ok(summary) => FireOutcome::Ran(summary),
            Err(error) => {
                // Batches that started have recorded themselves already.
                if matches!(error, LikeError::Busy | LikeError::InvalidArgument { .. }) {
                    store.record_action(ActionRecord::now(
                        REASON_SCHEDULED,
                        false,
                        error.to_string(),
                    ));
                }
                tracing::warn!(%error, "scheduled like failed");
                FireOutcome::Failed(error)
            }
        }
    }
}

/// Poll loop: fires due jobs until cancelled.
pub async fn run(
    scheduler: Arc<Scheduler>,
    job: Arc<ScheduledLike>,
    clock: Arc<dyn Clock>,
    poll: Duration,
    health: Arc<HealthRegistry>,
) -> Result<()> {
    let poll = poll.max(Duration::from_millis(MIN_POLL_MILLIS));
    let mut interval = time::interval(poll);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    if let Some(next_run) = scheduler.next_run() {
        tracing::info!(%next_run, "scheduler running");
    }
    health.mark_ok("scheduler");

    loop {
        interval.tick().await;

        for name in scheduler.take_due(clock.now()) {
            tracing::info!(job = %name, "scheduled job due");
            match job.fire().await {
                FireOutcome::Failed(error) => {
                    health.mark_error("scheduler", format!("job {name} failed: {error}"));
                }
                FireOutcome::Ran(summary) if !summary.all_ok() => {
                    health.mark_error(
                        "scheduler",
                        format!("job {name}: {} target(s) failed", summary.fail),
                    );
                }
                FireOutcome::Ran(_) | FireOutcome::Skipped => health.mark_ok("scheduler"),
            }
        }
    }
}
