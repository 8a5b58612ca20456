//! reqwest-backed client for the OneBot v11 HTTP API.
//!
//! Every action is a `POST {api_url}/{action}` with a JSON body; responses
//! are envelopes of the shape `{status, retcode, data, message, wording}`.

use super::traits::{SessionApi, SessionFuture, clamp_like_times};
use crate::config::SessionConfig;
use crate::error::{LikeError, Result};
use crate::utils::http_client::build_http_client;
use crate::utils::text::clip;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

const MAX_ERROR_BODY_CHARS: usize = 200;

pub struct OneBotClient {
    api_url: String,
    access_token: Option<String>,
    client: Client,
}

impl OneBotClient {
    pub fn new(api_url: &str, access_token: Option<&str>, timeout: Duration) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: access_token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(ToOwned::to_owned),
            client: build_http_client(timeout),
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            &config.api_url,
            config.access_token.as_deref(),
            config.timeout(),
        )
    }

    /// Posts one action. `target` labels errors (the action name, or the
    /// identity for per-target calls).
    async fn call(&self, action: &str, params: Value, target: &str) -> Result<Value> {
        let url = format!("{}/{}", self.api_url, action.trim_start_matches('/'));
        let mut request = self.client.post(&url).json(&params);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LikeError::unreachable(target, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LikeError::UpstreamUnreachable {
                target: target.to_string(),
                status: Some(status.as_u16()),
                message: clip(&body, MAX_ERROR_BODY_CHARS),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| LikeError::UpstreamUnreachable {
                target: target.to_string(),
                status: Some(status.as_u16()),
                message: format!("invalid JSON response: {e}"),
            })
    }
}

/// `status == "ok"` or `retcode == 0`.
pub fn envelope_ok(envelope: &Value) -> bool {
    envelope.get("status").and_then(Value::as_str) == Some("ok")
        || envelope.get("retcode").and_then(Value::as_i64) == Some(0)
}

fn envelope_rejection(target: &str, envelope: &Value) -> LikeError {
    let message = ["wording", "message", "msg"]
        .iter()
        .find_map(|key| envelope.get(*key).and_then(Value::as_str))
        .filter(|text| !text.is_empty())
        .map_or_else(
            || clip(&envelope.to_string(), MAX_ERROR_BODY_CHARS),
            ToOwned::to_owned,
        );
    LikeError::UpstreamRejected {
        target: target.to_string(),
        retcode: envelope.get("retcode").and_then(Value::as_i64),
        message,
    }
}

impl SessionApi for OneBotClient {
    fn endpoint(&self) -> &str {
        &self.api_url
    }

    fn get_status(&self) -> SessionFuture<'_, Value> {
        Box::pin(async move { self.call("get_status", json!({}), "get_status").await })
    }

    fn get_login_info(&self) -> SessionFuture<'_, Value> {
        Box::pin(async move {
            self.call("get_login_info", json!({}), "get_login_info")
                .await
        })
    }

    fn get_friend_list(&self) -> SessionFuture<'_, Vec<Value>> {
        Box::pin(async move {
            let envelope = self
                .call("get_friend_list", json!({}), "get_friend_list")
                .await?;
            if !envelope_ok(&envelope) {
                return Err(envelope_rejection("get_friend_list", &envelope));
            }
            Ok(envelope
                .get("data")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default())
        })
    }

    fn send_like<'a>(&'a self, user_id: &'a str, times: u32) -> SessionFuture<'a, ()> {
        Box::pin(async move {
            let times = clamp_like_times(times);
            let envelope = self
                .call(
                    "send_like",
                    json!({ "user_id": user_id, "times": times }),
                    user_id,
                )
                .await?;
            if envelope_ok(&envelope) {
                tracing::info!(user_id, times, "like sent");
                Ok(())
            } else {
                Err(envelope_rejection(user_id, &envelope))
            }
        })
    }
}
