use std::sync::Mutex;

/// Source of the current local time. Day boundaries are computed in the
/// zone the returned value carries.
pub trait Clock: Send + Sync {
    fn now(&self) -> jiff::Zoned;
}

/// Wall clock in the system time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> jiff::Zoned {
        jiff::Zoned::now()
    }
}

/// Settable clock for tests.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<jiff::Zoned>,
}

impl FixedClock {
    pub fn new(now: jiff::Zoned) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: jiff::Zoned) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> jiff::Zoned {
        self.now.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
