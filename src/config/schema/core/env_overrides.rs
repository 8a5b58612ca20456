use super::Config;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

impl Config {
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`. Blank values are ignored;
    /// numeric values that do not parse are errors.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        // ── Session ─────────────────────────────────────────────────────
        if let Some(url) = get("API_URL") {
            self.session.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(token) = get("ACCESS_TOKEN") {
            self.session.access_token = Some(token);
        }

        // ── Bot ─────────────────────────────────────────────────────────
        if let Some(raw) = get("TARGET_FRIENDS") {
            self.bot.targets = split_list(&raw);
        }
        if let Some(raw) = get("LIKE_TIMES") {
            self.bot.like_times = parse_number("LIKE_TIMES", &raw)?;
        }
        if let Some(raw) = get("DELAY") {
            self.bot.delay_secs = parse_number("DELAY", &raw)?;
        }
        if let Some(time) = get("SCHEDULE_TIME") {
            self.bot.schedule_time = time;
        }
        if let Some(raw) = get("SCHEDULE_ENABLED") {
            self.bot.schedule_enabled = parse_bool(&raw);
        }
        if let Some(path) = get("STATE_FILE") {
            self.bot.state_file = Some(PathBuf::from(path));
        }

        // ── Admin API ───────────────────────────────────────────────────
        if let Some(raw) = get("ADMIN_ENABLE") {
            self.admin.enabled = parse_bool(&raw);
        }
        if let Some(host) = get("ADMIN_HOST") {
            self.admin.host = host;
        }
        if let Some(raw) = get("ADMIN_PORT") {
            self.admin.port = parse_number("ADMIN_PORT", &raw)?;
        }
        if let Some(url) = get("ADMIN_PUBLIC_URL") {
            self.admin.public_url = Some(url);
        }
        if let Some(token) = get("ADMIN_TOKEN") {
            self.admin.token = Some(token);
        }

        // ── Manager ─────────────────────────────────────────────────────
        if let Some(raw) = get("LIKE_BOTS") {
            self.manager.bots = split_list(&raw);
        }
        if let Some(host) = get("MANAGER_HOST") {
            self.manager.host = host;
        }
        if let Some(raw) = get("MANAGER_PORT") {
            self.manager.port = parse_number("MANAGER_PORT", &raw)?;
        }
        if let Some(raw) = get("MANAGER_HTTP_TIMEOUT") {
            self.manager.http_timeout_secs = parse_number("MANAGER_HTTP_TIMEOUT", &raw)?;
        }

        // ── Watchdog ────────────────────────────────────────────────────
        if let Some(raw) = get("WATCH_ITEMS") {
            self.watchdog.items = split_list(&raw);
        }
        if let Some(raw) = get("CHECK_INTERVAL") {
            self.watchdog.check_interval_secs = parse_number("CHECK_INTERVAL", &raw)?;
        }
        if let Some(raw) = get("RELOGIN_DELAY") {
            self.watchdog.relogin_delay_secs = parse_number("RELOGIN_DELAY", &raw)?;
        }
        if let Some(raw) = get("HTTP_TIMEOUT") {
            self.watchdog.http_timeout_secs = parse_number("HTTP_TIMEOUT", &raw)?;
        }
        if let Some(host) = get("DOCKER_HOST") {
            self.watchdog.docker_host = Some(host);
        }

        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse::<T>()
        .with_context(|| format!("{key} must be a number, got {raw:?}"))
}

/// Truthy spellings accepted for boolean switches; anything else is false.
pub fn parse_bool(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "t" | "yes" | "y" | "on"
    )
}
