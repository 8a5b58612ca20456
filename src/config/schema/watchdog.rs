use super::manager::secs_f64_or_default;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Liveness watchdog settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchdogConfig {
    /// Monitored pairs, `bot|container`
    #[serde(default)]
    pub items: Vec<String>,
    /// Seconds between poll cycles (default: 30)
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: f64,
    /// Sustained logout duration before a restart, in seconds (default: 300)
    #[serde(default = "default_relogin_delay_secs")]
    pub relogin_delay_secs: f64,
    /// Timeout for each health probe, in seconds (default: 5)
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: f64,
    /// Port appended to bare bot service names (default: 8080)
    #[serde(default = "default_bot_port")]
    pub bot_port: u16,
    /// Token presented to bots that guard their admin API
    #[serde(default)]
    pub bot_token: Option<String>,
    /// Container runtime CLI (default: `docker`)
    #[serde(default = "default_docker_bin")]
    pub docker_bin: String,
    /// Forwarded as `DOCKER_HOST` to the runtime CLI
    #[serde(default)]
    pub docker_host: Option<String>,
    /// Grace period handed to `docker restart -t` (default: 20)
    #[serde(default = "default_restart_timeout_secs")]
    pub restart_timeout_secs: u64,
}

fn default_check_interval_secs() -> f64 {
    30.0
}

fn default_relogin_delay_secs() -> f64 {
    300.0
}

fn default_http_timeout_secs() -> f64 {
    5.0
}

fn default_bot_port() -> u16 {
    8080
}

fn default_docker_bin() -> String {
    "docker".into()
}

fn default_restart_timeout_secs() -> u64 {
    20
}

impl WatchdogConfig {
    pub fn check_interval(&self) -> Duration {
        secs_f64_or_default(self.check_interval_secs, default_check_interval_secs())
    }

    pub fn relogin_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.relogin_delay_secs)
            .unwrap_or_else(|_| Duration::from_secs_f64(default_relogin_delay_secs()))
    }

    pub fn http_timeout(&self) -> Duration {
        secs_f64_or_default(self.http_timeout_secs, default_http_timeout_secs())
    }

    pub fn watch_items(&self) -> Result<Vec<WatchItem>> {
        self.items
            .iter()
            .filter_map(|raw| {
                let raw = raw.trim();
                (!raw.is_empty()).then(|| WatchItem::parse(raw, self.bot_port))
            })
            .collect()
    }
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            check_interval_secs: default_check_interval_secs(),
            relogin_delay_secs: default_relogin_delay_secs(),
            http_timeout_secs: default_http_timeout_secs(),
            bot_port: default_bot_port(),
            bot_token: None,
            docker_bin: default_docker_bin(),
            docker_host: None,
            restart_timeout_secs: default_restart_timeout_secs(),
        }
    }
}

/// One monitored bot and the container restarted when its session dies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchItem {
    /// Bot service name as written in the config, used as the map key
    pub bot: String,
    pub bot_url: String,
    pub container: String,
}

impl WatchItem {
    pub fn parse(raw: &str, bot_port: u16) -> Result<Self> {
        let Some((bot, container)) = raw.split_once('|') else {
            anyhow::bail!("malformed watch item (missing '|'): {raw:?}");
        };
        let bot = bot.trim();
        let container = container.trim();
        anyhow::ensure!(
            !bot.is_empty() && !container.is_empty(),
            "malformed watch item (empty field): {raw:?}"
        );

        let bot_url = if bot.contains("://") {
            bot.trim_end_matches('/').to_string()
        } else {
            format!("http://{bot}:{bot_port}")
        };

        Ok(Self {
            bot: bot.to_string(),
            bot_url,
            container: container.to_string(),
        })
    }
}
