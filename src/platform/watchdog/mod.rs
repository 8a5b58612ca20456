//! Liveness watchdog over bot/container pairs.
//!
//! Each cycle probes every pair in order. A pair whose session stays
//! logged out for `relogin_delay` gets its container restarted, after which
//! the timer starts over. The loop never exits on probe or restart errors.

mod entry;
mod probe;
mod remediate;

pub use entry::{Verdict, WatchEntry};
pub use probe::{HealthProbe, HttpHealthProbe};
pub use remediate::{DockerRestarter, Remediator};

use crate::config::{WatchItem, WatchdogConfig};
use crate::diagnostics::HealthRegistry;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::time::{Duration, Instant};

pub type WatchFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const MIN_CYCLE_SLEEP: Duration = Duration::from_secs(1);

/// Sleep after a cycle that took `spent`: whatever is left of `interval`,
/// never less than one second.
pub fn next_sleep(interval: Duration, spent: Duration) -> Duration {
    interval.saturating_sub(spent).max(MIN_CYCLE_SLEEP)
}

pub struct Watchdog {
    pairs: Vec<(WatchItem, WatchEntry)>,
    probe: Arc<dyn HealthProbe>,
    remediator: Arc<dyn Remediator>,
    relogin_delay: Duration,
    interval: Duration,
}

impl Watchdog {
    pub fn new(
        items: Vec<WatchItem>,
        probe: Arc<dyn HealthProbe>,
        remediator: Arc<dyn Remediator>,
        relogin_delay: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            pairs: items
                .into_iter()
                .map(|item| (item, WatchEntry::default()))
                .collect(),
            probe,
            remediator,
            relogin_delay,
            interval,
        }
    }

    pub fn from_config(config: &WatchdogConfig) -> anyhow::Result<Self> {
        let probe = HttpHealthProbe::new(config.http_timeout(), config.bot_token.clone());
        Ok(Self::new(
            config.watch_items()?,
            Arc::new(probe),
            Arc::new(DockerRestarter::from_config(config)),
            config.relogin_delay(),
            config.check_interval(),
        ))
    }

    pub fn entry(&self, bot: &str) -> Option<&WatchEntry> {
        self.pairs
            .iter()
            .find(|(item, _)| item.bot == bot)
            .map(|(_, entry)| entry)
    }

    /// One sequential pass over every pair. Returns the number of restart
    /// attempts made.
    pub async fn poll_once(&mut self) -> usize {
        let mut attempts = 0;
        for (item, entry) in &mut self.pairs {
            let (alive, reason) = match self.probe.probe(&item.bot_url).await {
                Ok(health) => {
                    let alive = health.is_logged_in();
                    let reason = if health.error.is_empty() {
                        "not logged in".to_string()
                    } else {
                        health.error
                    };
                    (alive, reason)
                }
                Err(error) => (false, error.to_string()),
            };

            let now = Instant::now();
            match entry.observe(alive, now, self.relogin_delay) {
                Verdict::Healthy => {
                    tracing::debug!(bot = %item.bot, "session logged in");
                }
                Verdict::Recovered(after) => {
                    tracing::info!(
                        bot = %item.bot,
                        after_secs = after.as_secs(),
                        "session logged in again, timer cleared"
                    );
                }
                Verdict::BecameUnhealthy => {
                    tracing::warn!(
                        bot = %item.bot,
                        %reason,
                        delay_secs = self.relogin_delay.as_secs(),
                        "session not logged in, timer started"
                    );
                }
                Verdict::Waiting(unhealthy_for) => {
                    tracing::debug!(
                        bot = %item.bot,
                        unhealthy_secs = unhealthy_for.as_secs(),
                        %reason,
                        "still not logged in"
                    );
                }
                Verdict::Remediate(unhealthy_for) => {
                    attempts += 1;
                    tracing::warn!(
                        bot = %item.bot,
                        container = %item.container,
                        unhealthy_secs = unhealthy_for.as_secs(),
                        "restarting container"
                    );
                    match self.remediator.restart(&item.container).await {
                        Ok(()) => {
                            tracing::info!(container = %item.container, "container restarted");
                        }
                        Err(error) => {
                            tracing::error!(
                                container = %item.container,
                                error = %format!("{error:#}"),
                                "restart failed"
                            );
                        }
                    }
                    entry.remediation_attempted(now);
                }
            }
        }
        attempts
    }

    /// Poll loop; runs until cancelled.
    pub async fn run(mut self, health: Arc<HealthRegistry>) -> anyhow::Result<()> {
        let pairs: Vec<String> = self
            .pairs
            .iter()
            .map(|(item, _)| format!("{}|{}", item.bot, item.container))
            .collect();
        tracing::info!(
            items = %pairs.join(","),
            interval_secs = self.interval.as_secs_f64(),
            relogin_delay_secs = self.relogin_delay.as_secs_f64(),
            "watchdog started"
        );
        if self.pairs.is_empty() {
            tracing::warn!("no watch items configured, watchdog idles");
        }

        loop {
            let started = Instant::now();
            let attempts = self.poll_once().await;
            if attempts == 0 {
                health.mark_ok("watchdog");
            } else {
                health.mark_error(
                    "watchdog",
                    format!("{attempts} container restart(s) this cycle"),
                );
            }
            tokio::time::sleep(next_sleep(self.interval, started.elapsed())).await;
        }
    }
}
