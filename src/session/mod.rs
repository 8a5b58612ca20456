#[cfg(test)]
pub(crate) mod fake;
mod onebot;
mod traits;

pub use onebot::{OneBotClient, envelope_ok};
pub use traits::{MAX_LIKES_PER_CALL, SessionApi, SessionFuture, clamp_like_times};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session health as served at `GET /api/napcat` and read back by the
/// watchdog and the fleet manager.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionHealth {
    /// First transport error of the two probes, empty when both answered
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub login: Option<Value>,
}

impl SessionHealth {
    /// True when no probe failed and the login envelope names an account.
    pub fn is_logged_in(&self) -> bool {
        if !self.error.is_empty() {
            return false;
        }
        self.login
            .as_ref()
            .and_then(|login| login.get("data"))
            .and_then(|data| data.get("user_id"))
            .is_some_and(is_truthy)
    }

    pub fn online(&self) -> Option<bool> {
        self.status
            .as_ref()
            .and_then(|status| status.pointer("/data/online"))
            .and_then(Value::as_bool)
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Probes status and login identity. Both probes always run; the first
/// error wins the `error` field.
pub async fn probe_health(api: &dyn SessionApi) -> SessionHealth {
    let (status, login) = tokio::join!(api.get_status(), api.get_login_info());
    let mut health = SessionHealth::default();

    match status {
        Ok(value) => health.status = Some(value),
        Err(e) => health.error = e.to_string(),
    }
    match login {
        Ok(value) => health.login = Some(value),
        Err(e) => {
            if health.error.is_empty() {
                health.error = e.to_string();
            }
        }
    }

    if !health.error.is_empty() {
        tracing::debug!(endpoint = api.endpoint(), error = %health.error, "session probe failed");
    }
    health
}
