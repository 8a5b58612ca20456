use super::super::{AdminConfig, BotConfig, ManagerConfig, SessionConfig, WatchdogConfig};
use crate::platform::cron::DailyTime;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was read from - not serialized
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub admin: AdminConfig,

    #[serde(default)]
    pub manager: ManagerConfig,

    #[serde(default)]
    pub watchdog: WatchdogConfig,

    #[serde(default)]
    pub reliability: ReliabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReliabilityConfig {
    #[serde(default = "default_component_backoff_secs")]
    pub component_initial_backoff_secs: u64,
    #[serde(default = "default_component_backoff_max_secs")]
    pub component_max_backoff_secs: u64,
    /// Consecutive failures before a component's circuit opens; 0 = never
    #[serde(default = "default_component_max_restarts")]
    pub component_max_restarts: u32,
    #[serde(default = "default_scheduler_poll_millis")]
    pub scheduler_poll_millis: u64,
}

fn default_component_backoff_secs() -> u64 {
    2
}

fn default_component_backoff_max_secs() -> u64 {
    60
}

fn default_component_max_restarts() -> u32 {
    10
}

fn default_scheduler_poll_millis() -> u64 {
    1_000
}

impl Default for ReliabilityConfig {
    fn default() -> Self {
        Self {
            component_initial_backoff_secs: default_component_backoff_secs(),
            component_max_backoff_secs: default_component_backoff_max_secs(),
            component_max_restarts: default_component_max_restarts(),
            scheduler_poll_millis: default_scheduler_poll_millis(),
        }
    }
}

impl Config {
    /// Startup checks. Every error here aborts the process before any
    /// component is spawned.
    pub fn validate(&self) -> Result<()> {
        self.bot
            .schedule_time
            .parse::<DailyTime>()
            .with_context(|| {
                format!(
                    "schedule_time {:?} is malformed, expected HH:MM (e.g. 09:00)",
                    self.bot.schedule_time
                )
            })?;
        self.watchdog
            .watch_items()
            .context("invalid watchdog items")?;
        self.manager.members().context("invalid manager bots")?;
        Ok(())
    }
}
