use super::WatchFuture;
use crate::config::WatchdogConfig;
use crate::utils::text::clip;
use anyhow::{Context, Result, bail};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Headroom on top of the container stop grace period.
const COMMAND_SLACK: Duration = Duration::from_secs(30);

/// Restarts the container backing a dead session.
pub trait Remediator: Send + Sync {
    fn restart<'a>(&'a self, container: &'a str) -> WatchFuture<'a, Result<()>>;
}

/// `docker restart -t <grace> <container>` through the runtime CLI.
pub struct DockerRestarter {
    docker_bin: String,
    docker_host: Option<String>,
    grace_secs: u64,
}

impl DockerRestarter {
    pub fn new(docker_bin: &str, docker_host: Option<&str>, grace_secs: u64) -> Self {
        Self {
            docker_bin: docker_bin.to_string(),
            docker_host: docker_host
                .map(str::trim)
                .filter(|host| !host.is_empty())
                .map(ToOwned::to_owned),
            grace_secs,
        }
    }

    pub fn from_config(config: &WatchdogConfig) -> Self {
        Self::new(
            &config.docker_bin,
            config.docker_host.as_deref(),
            config.restart_timeout_secs,
        )
    }

    fn command(&self, container: &str) -> Command {
        let mut command = Command::new(&self.docker_bin);
        command
            .args(["restart", "-t", &self.grace_secs.to_string(), container])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(host) = &self.docker_host {
            command.env("DOCKER_HOST", host);
        }
        command
    }
}

impl Remediator for DockerRestarter {
    fn restart<'a>(&'a self, container: &'a str) -> WatchFuture<'a, Result<()>> {
        Box::pin(async move {
            let deadline = Duration::from_secs(self.grace_secs) + COMMAND_SLACK;
            let output = tokio::time::timeout(deadline, self.command(container).output())
                .await
                .with_context(|| format!("{} restart {container} timed out", self.docker_bin))?
                .with_context(|| format!("failed to run {}", self.docker_bin))?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                bail!(
                    "{} restart {container} exited with {}: {}",
                    self.docker_bin,
                    output.status,
                    clip(&stderr, 300)
                );
            }
            Ok(())
        })
    }
}
