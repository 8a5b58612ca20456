use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for the OneBot HTTP session API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Base URL of the OneBot HTTP API (default: `http://localhost:3000`)
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Bearer token sent as `Authorization: Bearer <token>`
    #[serde(default)]
    pub access_token: Option<String>,
    /// Per-call timeout in seconds (default: 10)
    #[serde(default = "default_session_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:3000".into()
}

fn default_session_timeout_secs() -> u64 {
    10
}

impl SessionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            access_token: None,
            timeout_secs: default_session_timeout_secs(),
        }
    }
}
