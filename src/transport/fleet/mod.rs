//! Fleet aggregator: one control surface over many bot instances.
//!
//! Holds nothing but the static instance directory. Every snapshot is
//! rebuilt from scratch by polling each instance's admin API; a failing
//! instance degrades its own record and never the others.

mod server;

pub use server::{ManagerState, build_manager_app, run_manager, run_manager_with_listener};

use crate::config::{FleetMember, ManagerConfig};
use crate::error::{LikeError, Result};
use crate::utils::http_client::build_http_client;
use crate::utils::text::clip;
use futures_util::future::join_all;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

/// Control commands relayed to one instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetCommand {
    ToggleSchedule,
    Run,
}

impl FleetCommand {
    fn path(self) -> &'static str {
        match self {
            Self::ToggleSchedule => "/api/toggle_schedule",
            Self::Run => "/api/run",
        }
    }
}

/// Last known view of one instance. Fields whose read failed are `{}`
/// (or `""` for `next_run`) and the failures are listed in `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub name: String,
    pub base_url: String,
    pub config: Value,
    pub state: Value,
    pub next_run: String,
    pub napcat: Value,
    pub error: String,
}

pub type FleetSnapshot = Vec<InstanceRecord>;

pub struct FleetClient {
    members: Vec<FleetMember>,
    client: Client,
    token: Option<String>,
}

impl FleetClient {
    pub fn new(members: Vec<FleetMember>, timeout: Duration, token: Option<&str>) -> Self {
        Self {
            members,
            client: build_http_client(timeout),
            token: token
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(ToOwned::to_owned),
        }
    }

    pub fn from_config(config: &ManagerConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            config.members()?,
            config.http_timeout(),
            config.instance_token.as_deref(),
        ))
    }

    pub fn members(&self) -> &[FleetMember] {
        &self.members
    }

    fn member(&self, name: &str) -> Result<&FleetMember> {
        self.members
            .iter()
            .find(|member| member.name == name)
            .ok_or_else(|| LikeError::UnknownInstance {
                name: name.to_string(),
            })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json(&self, request: RequestBuilder, url: &str) -> Result<Value> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| LikeError::unreachable(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LikeError::UpstreamUnreachable {
                target: url.to_string(),
                status: Some(status.as_u16()),
                message: clip(&body, 200),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| LikeError::unreachable(url, format!("invalid JSON response: {e}")))
    }

    async fn get_json(&self, base_url: &str, path: &str) -> Result<Value> {
        let url = format!("{base_url}{path}");
        self.read_json(self.client.get(&url), &url).await
    }

    /// Polls every instance concurrently, four reads each.
    pub async fn list_snapshot(&self) -> FleetSnapshot {
        join_all(self.members.iter().map(|member| self.fetch_instance(member))).await
    }

    async fn fetch_instance(&self, member: &FleetMember) -> InstanceRecord {
        let base = member.base_url.as_str();
        let (config, state, next_run, napcat) = tokio::join!(
            self.get_json(base, "/api/config"),
            self.get_json(base, "/api/state"),
            self.get_json(base, "/api/next_run"),
            self.get_json(base, "/api/napcat"),
        );

        let mut errors = Vec::new();
        let mut field = |read: Result<Value>| match read {
            Ok(value) => value,
            Err(error) => {
                errors.push(error.to_string());
                json!({})
            }
        };
        let config = field(config);
        let state = field(state);
        let next_run = field(next_run);
        let napcat = field(napcat);

        if !errors.is_empty() {
            tracing::debug!(bot = %member.name, errors = errors.len(), "instance partially unreachable");
        }

        InstanceRecord {
            name: member.name.clone(),
            base_url: member.base_url.clone(),
            config,
            state,
            next_run: next_run
                .get("next_run")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            napcat,
            error: errors.join("; "),
        }
    }

    /// Relays one command to the instance named `name` and returns its
    /// JSON answer verbatim.
    pub async fn forward(&self, name: &str, command: FleetCommand, payload: Value) -> Result<Value> {
        let member = self.member(name)?;
        let url = format!("{}{}", member.base_url, command.path());
        tracing::info!(bot = %member.name, ?command, "forwarding command");
        self.read_json(self.client.post(&url).json(&payload), &url)
            .await
    }
}
