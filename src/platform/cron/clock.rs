use chrono::{Local, NaiveDateTime};

/// Source of local wall-clock time for the scheduler.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

#[cfg(test)]
pub(crate) struct FakeClock(std::sync::Mutex<NaiveDateTime>);

#[cfg(test)]
impl FakeClock {
    pub(crate) fn at(now: NaiveDateTime) -> Self {
        Self(std::sync::Mutex::new(now))
    }

    pub(crate) fn set(&self, now: NaiveDateTime) {
        *self.0.lock().unwrap() = now;
    }
}

#[cfg(test)]
impl Clock for FakeClock {
    fn now(&self) -> NaiveDateTime {
        *self.0.lock().unwrap()
    }
}
