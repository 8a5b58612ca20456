//! Single-flight like batches.
//!
//! At most one batch runs per executor. A second caller gets
//! [`LikeError::Busy`] immediately instead of queueing. Every batch that
//! acquires the lock records exactly one [`ActionRecord`] before releasing
//! it, even when the session client panics. The batch itself runs on its own
//! task, so a caller that stops waiting (client disconnect, request timeout)
//! does not cut it short.

use crate::error::{LikeError, Result};
use crate::platform::state::{ActionRecord, StateStore, local_now};
use crate::session::SessionApi;
use futures_util::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const REASON_SCHEDULED: &str = "scheduled";
pub const REASON_MANUAL: &str = "manual";

/// Per-target outcome counts of one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub success: usize,
    pub fail: usize,
    #[serde(default)]
    pub failed_targets: Vec<String>,
}

impl BatchSummary {
    pub fn all_ok(&self) -> bool {
        self.fail == 0
    }

    fn detail(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("unserializable summary: {e}"))
    }
}

pub struct LikeExecutor {
    session: Arc<dyn SessionApi>,
    store: Arc<StateStore>,
    targets: Vec<String>,
    delay: Duration,
    running: Arc<Mutex<()>>,
}

impl LikeExecutor {
    pub fn new(
        session: Arc<dyn SessionApi>,
        store: Arc<StateStore>,
        targets: Vec<String>,
        delay: Duration,
    ) -> Self {
        Self {
            session,
            store,
            targets,
            delay,
            running: Arc::new(Mutex::new(())),
        }
    }

    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    pub fn session(&self) -> &Arc<dyn SessionApi> {
        &self.session
    }

    pub fn is_running(&self) -> bool {
        self.running.try_lock().is_err()
    }

    /// Likes every configured target.
    pub async fn run_all(&self, times: u32, reason: &str) -> Result<BatchSummary> {
        self.run_batch(&self.targets, times, reason).await
    }

    pub async fn run_one(&self, user_id: &str, times: u32, reason: &str) -> Result<BatchSummary> {
        self.run_batch(&[user_id.to_string()], times, reason).await
    }

    /// Likes `targets` in order, `times` each.
    ///
    /// Preconditions are checked before the lock is taken and are not
    /// recorded. A failing target is counted and the batch moves on.
    pub async fn run_batch(
        &self,
        targets: &[String],
        times: u32,
        reason: &str,
    ) -> Result<BatchSummary> {
        if targets.is_empty() {
            return Err(LikeError::invalid_argument(
                "no targets: configure bot.targets (TARGET_FRIENDS) first",
            ));
        }
        if times < 1 {
            return Err(LikeError::invalid_argument("times must be >= 1"));
        }
        let Ok(running) = Arc::clone(&self.running).try_lock_owned() else {
            tracing::info!(reason, "like batch rejected, another batch is running");
            return Err(LikeError::Busy);
        };

        let session = Arc::clone(&self.session);
        let store = Arc::clone(&self.store);
        let delay = self.delay;
        let targets = targets.to_vec();
        let reason = reason.to_string();

        let batch = tokio::spawn(async move {
            let _running = running;
            let started_at = local_now();
            tracing::info!(%reason, targets = targets.len(), times, "like batch started");

            let outcome = AssertUnwindSafe(like_each(session.as_ref(), &targets, times, delay))
                .catch_unwind()
                .await;

            let (result, ok, detail) = match outcome {
                Ok(summary) => {
                    tracing::info!(
                        %reason,
                        success = summary.success,
                        fail = summary.fail,
                        "like batch finished"
                    );
                    let detail = summary.detail();
                    let ok = summary.all_ok();
                    (Ok(summary), ok, detail)
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    tracing::error!(%reason, %message, "like batch aborted");
                    (Err(LikeError::Internal(message.clone())), false, message)
                }
            };

            store.record_action(ActionRecord {
                reason,
                at: started_at,
                ok,
                detail,
            });
            result
        });

        batch
            .await
            .map_err(|e| LikeError::Internal(format!("like batch task failed: {e}")))?
    }
}

async fn like_each(
    session: &dyn SessionApi,
    targets: &[String],
    times: u32,
    delay: Duration,
) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for (index, user_id) in targets.iter().enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match session.send_like(user_id, times).await {
            Ok(()) => summary.success += 1,
            Err(error) => {
                tracing::warn!(user_id = %user_id, %error, "like failed");
                summary.fail += 1;
                summary.failed_targets.push(user_id.clone());
            }
        }
    }
    summary
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "like batch panicked".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::state::RunState;
    use crate::session::fake::FakeSession;
    use tokio::sync::Notify;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    fn executor(session: FakeSession) -> (Arc<LikeExecutor>, Arc<FakeSession>) {
        let session = Arc::new(session);
        let store = Arc::new(StateStore::in_memory(RunState::default()));
        let executor = LikeExecutor::new(
            Arc::clone(&session) as Arc<dyn SessionApi>,
            store,
            ids(&["10001", "10002", "10003"]),
            Duration::ZERO,
        );
        (Arc::new(executor), session)
    }

    #[tokio::test]
    async fn counts_cover_every_target() {
        let (executor, session) = executor(FakeSession::new().rejecting("10002"));

        let summary = executor.run_all(3, REASON_MANUAL).await.unwrap();

        assert_eq!(summary.success + summary.fail, 3);
        assert_eq!(summary.failed_targets, ids(&["10002"]));
        let called: Vec<String> = session.calls().into_iter().map(|(id, _)| id).collect();
        assert_eq!(called, ids(&["10001", "10002", "10003"]));
    }

    #[tokio::test]
    async fn records_outcome_after_every_batch() {
        let (executor, _) = executor(FakeSession::new().rejecting("10003"));

        executor.run_all(1, REASON_SCHEDULED).await.unwrap();
        let state = executor.store().get();
        assert!(state.last_action_at.is_some());
        assert_eq!(state.last_action_ok, Some(false));
        assert_eq!(state.last_action_reason, REASON_SCHEDULED);
        let detail: BatchSummary = serde_json::from_str(&state.last_action_detail).unwrap();
        assert_eq!(detail.fail, 1);

        executor.run_one("10001", 1, REASON_MANUAL).await.unwrap();
        let state = executor.store().get();
        assert_eq!(state.last_action_ok, Some(true));
        assert_eq!(state.last_action_reason, REASON_MANUAL);
    }

    #[tokio::test]
    async fn rejects_empty_targets_and_zero_times() {
        let (executor, session) = executor(FakeSession::new());

        let err = executor.run_batch(&[], 1, REASON_MANUAL).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");
        let err = executor.run_all(0, REASON_MANUAL).await.unwrap_err();
        assert_eq!(err.kind(), "invalid_argument");

        assert!(session.calls().is_empty());
        assert!(executor.store().get().last_action_at.is_none());
    }

    #[tokio::test]
    async fn second_batch_while_running_is_busy() {
        let gate = Arc::new(Notify::new());
        let (executor, session) = executor(FakeSession::new().gated(Arc::clone(&gate)));
        let entered = session.entered();

        let first = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.run_one("10001", 1, REASON_MANUAL).await })
        };
        entered.notified().await;
        assert!(executor.is_running());

        let err = executor.run_all(1, REASON_SCHEDULED).await.unwrap_err();
        assert_eq!(err, LikeError::Busy);

        gate.notify_one();
        let summary = first.await.unwrap().unwrap();
        assert_eq!(summary.success, 1);
        assert!(!executor.is_running());
        assert_eq!(executor.store().get().last_action_reason, REASON_MANUAL);
    }

    #[tokio::test]
    async fn panic_in_session_releases_lock_and_is_recorded() {
        let (executor, _) = executor(FakeSession::new().panicking_on("10002"));

        let err = executor.run_all(1, REASON_MANUAL).await.unwrap_err();
        assert_eq!(err.kind(), "internal");

        let state = executor.store().get();
        assert_eq!(state.last_action_ok, Some(false));
        assert!(state.last_action_detail.contains("10002"));

        assert!(!executor.is_running());
        executor.run_one("10001", 1, REASON_MANUAL).await.unwrap();
    }

    /// Opens the gate for each parked like until the batch records its outcome.
    async fn release_until_recorded(executor: &LikeExecutor, gate: &Notify) -> RunState {
        for _ in 0..200 {
            let state = executor.store().get();
            if state.last_action_at.is_some() && !executor.is_running() {
                return state;
            }
            gate.notify_one();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("batch outcome was never recorded");
    }

    #[tokio::test]
    async fn abandoned_caller_still_gets_outcome_recorded() {
        let gate = Arc::new(Notify::new());
        let (executor, session) = executor(FakeSession::new().gated(Arc::clone(&gate)));

        let waited =
            tokio::time::timeout(Duration::from_millis(50), executor.run_all(1, REASON_MANUAL))
                .await;
        assert!(waited.is_err());
        assert!(executor.is_running());
        assert!(executor.store().get().last_action_at.is_none());

        let state = release_until_recorded(&executor, &gate).await;
        assert_eq!(state.last_action_ok, Some(true));
        assert_eq!(state.last_action_reason, REASON_MANUAL);
        assert_eq!(session.calls().len(), 3);
    }

    #[tokio::test]
    async fn dropped_batch_future_keeps_lock_until_recorded() {
        let gate = Arc::new(Notify::new());
        let (executor, session) = executor(FakeSession::new().gated(Arc::clone(&gate)));
        let entered = session.entered();

        let pending = {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move { executor.run_one("10001", 1, REASON_SCHEDULED).await })
        };
        entered.notified().await;
        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());

        let err = executor.run_one("10002", 1, REASON_MANUAL).await.unwrap_err();
        assert_eq!(err, LikeError::Busy);

        let state = release_until_recorded(&executor, &gate).await;
        assert_eq!(state.last_action_reason, REASON_SCHEDULED);
        assert_eq!(state.last_action_ok, Some(true));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_targets_only() {
        let session = Arc::new(FakeSession::new());
        let store = Arc::new(StateStore::in_memory(RunState::default()));
        let executor = LikeExecutor::new(
            session,
            store,
            ids(&["1", "2", "3"]),
            Duration::from_secs(2),
        );

        let started = tokio::time::Instant::now();
        executor.run_all(1, REASON_MANUAL).await.unwrap();
        assert_eq!(started.elapsed(), Duration::from_secs(4));
    }
}
