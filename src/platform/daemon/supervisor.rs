use crate::config::ReliabilityConfig;
use crate::diagnostics::HealthRegistry;
use anyhow::Result;
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::Duration;

/// Restart policy shared by every supervised component of a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial_secs: u64,
    pub max_secs: u64,
    /// Consecutive failures before giving up; 0 = restart forever
    pub max_restarts: u32,
}

impl Backoff {
    pub fn from_config(config: &ReliabilityConfig) -> Self {
        let initial_secs = config.component_initial_backoff_secs.max(1);
        Self {
            initial_secs,
            max_secs: config.component_max_backoff_secs.max(initial_secs),
            max_restarts: config.component_max_restarts,
        }
    }
}

pub fn spawn_component_supervisor<F, Fut>(
    name: &'static str,
    backoff: Backoff,
    health: Arc<HealthRegistry>,
    mut run_component: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    tokio::spawn(async move {
        let initial = backoff.initial_secs.max(1);
        let max_backoff = backoff.max_secs.max(initial);
        let mut delay = initial;
        let mut consecutive_failures: u32 = 0;

        loop {
            tracing::info!(component = name, "component starting");
            match run_component().await {
                Ok(()) => {
                    tracing::warn!(component = name, "component exited unexpectedly");
                    health.mark_error(name, "component exited unexpectedly");
                    delay = initial;
                    consecutive_failures = consecutive_failures.saturating_add(1);
                }
                Err(e) => {
                    tracing::error!(component = name, error = %format!("{e:#}"), "component failed");
                    health.mark_error(name, format!("{e:#}"));
                    consecutive_failures = consecutive_failures.saturating_add(1);
                }
            }

            if backoff.max_restarts > 0 && consecutive_failures > backoff.max_restarts {
                tracing::error!(
                    component = name,
                    max_restarts = backoff.max_restarts,
                    "component exceeded max restarts, circuit open"
                );
                break;
            }
            health.bump_restart(name);
            tokio::time::sleep(Duration::from_secs(delay)).await;
            delay = delay.saturating_mul(2).min(max_backoff);
        }
    })
}
