//! Process roles: wiring plus supervision.
//!
//! Each role builds its components from the validated [`Config`], runs the
//! long-lived ones under [`spawn_component_supervisor`] and waits for
//! Ctrl-C.

mod supervisor;

pub use supervisor::{Backoff, spawn_component_supervisor};

use crate::config::{AdminConfig, Config};
use crate::diagnostics::HealthRegistry;
use crate::platform::cron::scheduler::{self, DAILY_LIKE_JOB};
use crate::platform::cron::{Clock, DailyTime, ScheduledLike, Scheduler};
use crate::platform::state::{RunState, StateStore};
use crate::platform::task::LikeExecutor;
use crate::platform::watchdog::Watchdog;
use crate::session::{OneBotClient, SessionApi};
use crate::transport::fleet::{FleetClient, ManagerState};
use crate::transport::gateway::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Everything one automation instance owns.
pub struct BotInstance {
    pub executor: Arc<LikeExecutor>,
    pub scheduler: Arc<Scheduler>,
    pub job: Arc<ScheduledLike>,
    pub clock: Arc<dyn Clock>,
}

impl BotInstance {
    /// Opens the state store and registers the daily job.
    pub fn build(
        config: &Config,
        session: Arc<dyn SessionApi>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let at: DailyTime = config
            .bot
            .schedule_time
            .parse()
            .with_context(|| format!("invalid schedule_time {:?}", config.bot.schedule_time))?;

        let defaults = RunState::with_schedule_enabled(config.bot.schedule_enabled);
        let store = Arc::new(StateStore::open(config.bot.state_file.clone(), defaults));
        let executor = Arc::new(LikeExecutor::new(
            session,
            store,
            config.bot.targets.clone(),
            config.bot.delay(),
        ));

        let scheduler = Arc::new(Scheduler::new());
        let next_run = scheduler.every_day_at(DAILY_LIKE_JOB, at, clock.now());
        tracing::debug!(job = DAILY_LIKE_JOB, %next_run, "daily job registered");

        let job = Arc::new(ScheduledLike::new(
            Arc::clone(&executor),
            config.bot.like_times,
        ));

        Ok(Self {
            executor,
            scheduler,
            job,
            clock,
        })
    }

    pub fn app_state(&self, config: &Config, health: Arc<HealthRegistry>) -> AppState {
        AppState::new(
            config,
            Arc::clone(&self.executor),
            Arc::clone(&self.scheduler),
            health,
        )
    }
}

/// `likebot bot`: scheduler plus, when enabled, the admin API.
pub async fn run_bot(config: Arc<Config>, clock: Arc<dyn Clock>) -> Result<()> {
    let session: Arc<dyn SessionApi> = Arc::new(OneBotClient::from_config(&config.session));
    let instance = BotInstance::build(&config, session, clock)?;
    let health = Arc::new(HealthRegistry::new());
    let backoff = Backoff::from_config(&config.reliability);

    tracing::info!(
        api_url = %config.session.api_url,
        schedule_time = %config.bot.schedule_time,
        like_times = config.bot.like_times,
        delay_secs = config.bot.delay_secs,
        targets = config.bot.targets.len(),
        schedule_enabled = instance.executor.store().get().schedule_enabled,
        "like bot started"
    );
    if config.bot.targets.is_empty() {
        tracing::warn!("no targets configured; scheduled runs will fail");
    }

    let mut handles = Vec::new();

    let poll = Duration::from_millis(config.reliability.scheduler_poll_millis);
    let (sched, job, clock, sched_health) = (
        Arc::clone(&instance.scheduler),
        Arc::clone(&instance.job),
        Arc::clone(&instance.clock),
        Arc::clone(&health),
    );
    handles.push(spawn_component_supervisor(
        "scheduler",
        backoff,
        Arc::clone(&health),
        move || {
            scheduler::run(
                Arc::clone(&sched),
                Arc::clone(&job),
                Arc::clone(&clock),
                poll,
                Arc::clone(&sched_health),
            )
        },
    ));

    if config.admin.enabled {
        let state = instance.app_state(&config, Arc::clone(&health));
        let public_url = admin_public_url(&config.admin);
        tracing::info!(%public_url, token = config.admin.token.is_some(), "admin API enabled");

        let admin = Arc::new(config.admin.clone());
        handles.push(spawn_component_supervisor(
            "gateway",
            backoff,
            Arc::clone(&health),
            move || {
                let admin = Arc::clone(&admin);
                let state = state.clone();
                async move {
                    crate::transport::gateway::run_gateway(
                        &admin.host,
                        admin.port,
                        state,
                        &admin.cors_origins,
                    )
                    .await
                }
            },
        ));
    }

    wait_for_shutdown(handles, &health).await
}

/// `likebot manager`: the fleet aggregator API.
pub async fn run_manager(config: Arc<Config>) -> Result<()> {
    let fleet = Arc::new(FleetClient::from_config(&config.manager)?);
    let health = Arc::new(HealthRegistry::new());
    let backoff = Backoff::from_config(&config.reliability);

    let names: Vec<&str> = fleet.members().iter().map(|m| m.name.as_str()).collect();
    tracing::info!(bots = %names.join(","), "like manager started");

    let state = ManagerState::new(fleet, Arc::clone(&health), config.manager.token.as_deref());
    let server_config = Arc::clone(&config);
    let handle = spawn_component_supervisor("manager", backoff, Arc::clone(&health), move || {
        let config = Arc::clone(&server_config);
        let state = state.clone();
        async move {
            crate::transport::fleet::run_manager(
                &config.manager.host,
                config.manager.port,
                state,
                &config.admin.cors_origins,
            )
            .await
        }
    });

    wait_for_shutdown(vec![handle], &health).await
}

/// `likebot watchdog`: the liveness loop over every watch item.
pub async fn run_watchdog(config: Arc<Config>) -> Result<()> {
    // Fail fast on a malformed watch list before supervising anything.
    Watchdog::from_config(&config.watchdog)?;

    let health = Arc::new(HealthRegistry::new());
    let backoff = Backoff::from_config(&config.reliability);
    let loop_health = Arc::clone(&health);
    let handle = spawn_component_supervisor("watchdog", backoff, Arc::clone(&health), move || {
        let config = Arc::clone(&config);
        let health = Arc::clone(&loop_health);
        async move { Watchdog::from_config(&config.watchdog)?.run(health).await }
    });

    wait_for_shutdown(vec![handle], &health).await
}

/// Where operators reach the admin API, for the startup log.
fn admin_public_url(admin: &AdminConfig) -> String {
    admin
        .public_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| format!("http://localhost:{}", admin.port))
}

async fn wait_for_shutdown(handles: Vec<JoinHandle<()>>, health: &HealthRegistry) -> Result<()> {
    tracing::info!("press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("listen for shutdown signal")?;
    tracing::info!("shutdown requested");
    health.mark_error("daemon", "shutdown requested");

    for handle in &handles {
        handle.abort();
    }
    for handle in handles {
        let _ = handle.await;
    }

    Ok(())
}
