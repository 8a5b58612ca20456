//! Per-instance admin API.
//!
//! JSON endpoints for reading the run state and the session health and
//! for triggering manual batches. Everything under `/api` sits behind the
//! shared secret; `/health` is always public.

mod handlers;
mod server;

pub use server::{build_app, run_gateway, run_gateway_with_listener};

use crate::config::Config;
use crate::diagnostics::HealthRegistry;
use crate::platform::cron::Scheduler;
use crate::platform::task::LikeExecutor;
use crate::transport::auth::SharedSecret;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Static view of the instance configuration served at `GET /api/config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub api_url: String,
    pub targets: Vec<String>,
    pub like_times: u32,
    pub delay: u64,
    pub schedule_time: String,
    pub state_file: String,
}

impl InstanceConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            api_url: config.session.api_url.trim_end_matches('/').to_string(),
            targets: config.bot.targets.clone(),
            like_times: config.bot.like_times,
            delay: config.bot.delay_secs,
            schedule_time: config.bot.schedule_time.clone(),
            state_file: config
                .bot
                .state_file
                .as_ref()
                .map(|path| path.display().to_string())
                .unwrap_or_default(),
        }
    }
}

/// Shared state for all axum handlers
#[derive(Clone)]
pub struct AppState {
    pub instance: Arc<InstanceConfig>,
    pub executor: Arc<LikeExecutor>,
    pub scheduler: Arc<Scheduler>,
    pub health: Arc<HealthRegistry>,
    pub secret: SharedSecret,
}

impl AppState {
    pub fn new(
        config: &Config,
        executor: Arc<LikeExecutor>,
        scheduler: Arc<Scheduler>,
        health: Arc<HealthRegistry>,
    ) -> Self {
        Self {
            instance: Arc::new(InstanceConfig::from_config(config)),
            executor,
            scheduler,
            health,
            secret: SharedSecret::new(config.admin.token.as_deref()),
        }
    }
}
