// Clock abstraction so reporters can be tested with fixed times

use crate::model::Time;

pub trait Clock: Send {
    fn now(&self) -> Time;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Time {
        #[cfg(miri)]
        {
            chrono::DateTime::UNIX_EPOCH
        }
        #[cfg(not(miri))]
        {
            chrono::Utc::now()
        }
    }
}

/// Clock that always reports the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Time);

impl Clock for FixedClock {
    fn now(&self) -> Time {
        self.0
    }
}

pub fn now() -> Time {
    SystemClock.now()
}

/// Milliseconds elapsed between two instants, clamped at zero
pub fn millis_between(start: Time, end: Time) -> u64 {
    (end - start).num_milliseconds().max(0) as u64
}
