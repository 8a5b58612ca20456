use crate::cli::commands::{Cli, Commands};
use anyhow::{Context, Result, bail};
use likebot::Config;
use likebot::platform::cron::{Clock, SystemClock};
use likebot::platform::daemon::{self, BotInstance};
use likebot::platform::task::REASON_MANUAL;
use likebot::session::{OneBotClient, SessionApi, clamp_like_times};
use std::sync::Arc;

/// One-shot batch for `likebot like`. Prints the summary as JSON.
async fn run_like(config: &Config, user: Option<String>, times: Option<u32>) -> Result<()> {
    let session: Arc<dyn SessionApi> = Arc::new(OneBotClient::from_config(&config.session));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let instance = BotInstance::build(config, session, clock)?;

    let times = clamp_like_times(times.unwrap_or(config.bot.like_times));
    let summary = match user.as_deref().map(str::trim) {
        Some("") => bail!("--user must not be empty"),
        Some(user_id) => instance.executor.run_one(user_id, times, REASON_MANUAL).await?,
        None => instance.executor.run_all(times, REASON_MANUAL).await?,
    };

    let rendered = serde_json::to_string_pretty(&summary).context("render summary")?;
    println!("{rendered}");
    if !summary.all_ok() {
        bail!("{} of {} target(s) failed", summary.fail, summary.success + summary.fail);
    }
    Ok(())
}

pub async fn dispatch(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Commands::Bot { host, port, admin } => {
            if let Some(host) = host {
                config.admin.host = host;
            }
            if let Some(port) = port {
                config.admin.port = port;
            }
            config.admin.enabled |= admin;
            daemon::run_bot(Arc::new(config), Arc::new(SystemClock)).await
        }
        Commands::Manager { host, port } => {
            if let Some(host) = host {
                config.manager.host = host;
            }
            if let Some(port) = port {
                config.manager.port = port;
            }
            daemon::run_manager(Arc::new(config)).await
        }
        Commands::Watchdog => daemon::run_watchdog(Arc::new(config)).await,
        Commands::Like { user, times } => run_like(&config, user, times).await,
    }
}
