use tokio::time::{Duration, Instant};

/// Debounce/cooldown timer of one monitored pair.
///
/// `unhealthy_since` never moves backwards while the pair stays unhealthy,
/// clears on a healthy observation and restarts from "now" right after a
/// remediation attempt, whatever its outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchEntry {
    unhealthy_since: Option<Instant>,
    last_remediation_at: Option<Instant>,
}

/// What one observation means for the pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    /// Healthy again after having been unhealthy for the given time
    Recovered(Duration),
    /// First bad observation; the timer starts now
    BecameUnhealthy,
    /// Still unhealthy, below the remediation threshold
    Waiting(Duration),
    /// Unhealthy for at least the threshold; restart the container now
    Remediate(Duration),
}

impl WatchEntry {
    pub fn unhealthy_since(&self) -> Option<Instant> {
        self.unhealthy_since
    }

    pub fn last_remediation_at(&self) -> Option<Instant> {
        self.last_remediation_at
    }

    pub fn observe(&mut self, alive: bool, now: Instant, relogin_delay: Duration) -> Verdict {
        if alive {
            return match self.unhealthy_since.take() {
                Some(since) => Verdict::Recovered(now.saturating_duration_since(since)),
                None => Verdict::Healthy,
            };
        }

        let Some(since) = self.unhealthy_since else {
            self.unhealthy_since = Some(now);
            return Verdict::BecameUnhealthy;
        };
        let unhealthy_for = now.saturating_duration_since(since);
        if unhealthy_for < relogin_delay {
            Verdict::Waiting(unhealthy_for)
        } else {
            Verdict::Remediate(unhealthy_for)
        }
    }

    /// Re-arms the timer after a restart attempt.
    pub fn remediation_attempted(&mut self, now: Instant) {
        self.unhealthy_since = Some(now);
        self.last_remediation_at = Some(now);
    }
}
