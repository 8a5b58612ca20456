mod clock;
pub mod scheduler;

#[cfg(test)]
pub(crate) use clock::FakeClock;
pub use clock::{Clock, SystemClock};
pub use scheduler::{FireOutcome, Job, ScheduledLike, Scheduler};

use crate::error::LikeError;
use chrono::{Days, NaiveDateTime, NaiveTime, Timelike};
use std::fmt;
use std::str::FromStr;

/// Wall-clock time of day for a daily job, `HH:MM` or `HH:MM:SS` (24h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DailyTime(NaiveTime);

impl DailyTime {
    pub fn time(self) -> NaiveTime {
        self.0
    }

    /// First occurrence strictly after `now`: today if still ahead,
    /// otherwise tomorrow.
    pub fn next_after(self, now: NaiveDateTime) -> NaiveDateTime {
        let today = now.date().and_time(self.0);
        if today > now {
            return today;
        }
        now.date()
            .checked_add_days(Days::new(1))
            .map_or(today, |tomorrow| tomorrow.and_time(self.0))
    }
}

impl FromStr for DailyTime {
    type Err = LikeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let malformed = || LikeError::invalid_argument(format!("{raw:?} is not HH:MM"));
        let parts: Vec<&str> = raw.trim().split(':').collect();
        if !(2..=3).contains(&parts.len()) {
            return Err(malformed());
        }

        let field = |index: usize, max_len: usize, limit: u32| -> Result<u32, LikeError> {
            let Some(text) = parts.get(index) else {
                return Ok(0);
            };
            if text.is_empty() || text.len() > max_len || !text.bytes().all(|b| b.is_ascii_digit())
            {
                return Err(malformed());
            }
            text.parse::<u32>()
                .ok()
                .filter(|value| *value < limit)
                .ok_or_else(malformed)
        };

        let hour = field(0, 2, 24)?;
        let minute = field(1, 2, 60)?;
        let second = field(2, 2, 60)?;
        if parts.iter().any(|part| part.len() != 2) {
            return Err(malformed());
        }

        NaiveTime::from_hms_opt(hour, minute, second)
            .map(Self)
            .ok_or_else(malformed)
    }
}

impl fmt::Display for DailyTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.second() == 0 {
            write!(f, "{}", self.0.format("%H:%M"))
        } else {
            write!(f, "{}", self.0.format("%H:%M:%S"))
        }
    }
}
