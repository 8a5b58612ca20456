use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fleet manager settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerConfig {
    #[serde(default = "default_manager_host")]
    pub host: String,
    #[serde(default = "default_manager_port")]
    pub port: u16,
    /// Timeout for each upstream call, in seconds (default: 5)
    #[serde(default = "default_manager_timeout_secs")]
    pub http_timeout_secs: f64,
    /// Instance directory entries, `name=url` or bare `url`
    #[serde(default)]
    pub bots: Vec<String>,
    /// Token presented to every instance (their `admin.token`)
    #[serde(default)]
    pub instance_token: Option<String>,
    /// Shared secret guarding the manager API itself; open when unset
    #[serde(default)]
    pub token: Option<String>,
}

fn default_manager_host() -> String {
    "0.0.0.0".into()
}

fn default_manager_port() -> u16 {
    8090
}

fn default_manager_timeout_secs() -> f64 {
    5.0
}

impl ManagerConfig {
    pub fn http_timeout(&self) -> Duration {
        secs_f64_or_default(self.http_timeout_secs, default_manager_timeout_secs())
    }

    pub fn members(&self) -> Result<Vec<FleetMember>> {
        self.bots
            .iter()
            .filter_map(|raw| {
                let raw = raw.trim();
                (!raw.is_empty()).then(|| FleetMember::parse(raw))
            })
            .collect()
    }
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            host: default_manager_host(),
            port: default_manager_port(),
            http_timeout_secs: default_manager_timeout_secs(),
            bots: Vec::new(),
            instance_token: None,
            token: None,
        }
    }
}

/// One entry of the fleet directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetMember {
    pub name: String,
    pub base_url: String,
}

impl FleetMember {
    /// Parses `name=url` or a bare `url`. Without a name the entry text, as
    /// written, is the name. A missing scheme defaults to `http://`; trailing
    /// slashes are dropped from the base URL only.
    pub fn parse(raw: &str) -> Result<Self> {
        let (name, url) = match raw.split_once('=') {
            Some((name, url)) => (name.trim(), url.trim()),
            None => ("", raw.trim()),
        };

        let written = url;
        let url = url.trim_end_matches('/');
        anyhow::ensure!(!url.is_empty(), "bot entry {raw:?} has an empty URL");

        let base_url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("http://{url}")
        };
        url::Url::parse(&base_url).with_context(|| format!("bot entry {raw:?} is not a URL"))?;

        let name = if name.is_empty() {
            written.to_string()
        } else {
            name.to_string()
        };
        Ok(Self { name, base_url })
    }
}

pub(super) fn secs_f64_or_default(secs: f64, fallback: f64) -> Duration {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .unwrap_or_else(|| Duration::from_secs_f64(fallback))
}
