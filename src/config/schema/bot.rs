use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// What one automation instance does and when.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Identities that receive likes, in order
    #[serde(default)]
    pub targets: Vec<String>,
    /// Likes per target per scheduled run (default: 10)
    #[serde(default = "default_like_times")]
    pub like_times: u32,
    /// Pause between two targets, in seconds (default: 2)
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    /// Daily wall-clock trigger, `HH:MM` in local time (default: 09:00)
    #[serde(default = "default_schedule_time")]
    pub schedule_time: String,
    /// Initial value of the schedule switch when no state file exists
    #[serde(default = "default_true")]
    pub schedule_enabled: bool,
    /// JSON file holding the run state; memory-only when unset
    #[serde(default)]
    pub state_file: Option<PathBuf>,
}

fn default_like_times() -> u32 {
    10
}

fn default_delay_secs() -> u64 {
    2
}

fn default_schedule_time() -> String {
    "09:00".into()
}

fn default_true() -> bool {
    true
}

impl BotConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            targets: Vec::new(),
            like_times: default_like_times(),
            delay_secs: default_delay_secs(),
            schedule_time: default_schedule_time(),
            schedule_enabled: true,
            state_file: None,
        }
    }
}

/// Per-instance admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// Serve the admin API next to the scheduler (default: false)
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_admin_host")]
    pub host: String,
    #[serde(default = "default_admin_port")]
    pub port: u16,
    /// Externally reachable URL, only used in the startup banner
    #[serde(default)]
    pub public_url: Option<String>,
    /// Shared secret; open access when unset
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_admin_host() -> String {
    "0.0.0.0".into()
}

fn default_admin_port() -> u16 {
    8080
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_admin_host(),
            port: default_admin_port(),
            public_url: None,
            token: None,
            cors_origins: Vec::new(),
        }
    }
}
