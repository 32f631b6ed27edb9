//! Wall-clock source for year rollover
//!
//! The tracker never calls `Local::now()` directly so that year boundaries
//! can be crossed deterministically.

use chrono::{DateTime, Datelike, Local};
#[cfg(any(test, feature = "test-util"))]
use std::sync::{Arc, Mutex};

pub trait Clock {
    fn now(&self) -> DateTime<Local>;

    /// Current local calendar year
    fn year(&self) -> i32 {
        self.now().year()
    }
}

/// The system's local time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same instant, so a test can hand one clone to the tracker
/// and keep another to travel through time. Test-only; enable the
/// `test-util` feature to use it outside this crate.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

#[cfg(any(test, feature = "test-util"))]
impl ManualClock {
    pub fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn move_to(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

#[cfg(any(test, feature = "test-util"))]
impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}
