//! Simulated clock for deterministic scheduling tests

use async_trait::async_trait;
use cadence_core::effects::{ClockEffects, TimeError};
use cadence_core::Timestamp;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Debug)]
struct ClockState {
    now: Mutex<Timestamp>,
    auto_advance: bool,
    changed: Notify,
    sleeps: Mutex<Vec<Timestamp>>,
}

/// Virtual clock.
///
/// In auto-advance mode `sleep_until` jumps the clock to the deadline and
/// returns at once, so a whole session plays out instantly. In manual mode
/// sleepers block until the test moves time forward with [`advance`] or
/// [`set_time`].
///
/// [`advance`]: SimulatedClock::advance
/// [`set_time`]: SimulatedClock::set_time
#[derive(Debug, Clone)]
pub struct SimulatedClock {
    state: Arc<ClockState>,
}

impl SimulatedClock {
    /// Clock that jumps to each sleep deadline
    pub fn auto(start: Timestamp) -> Self {
        Self::build(start, true)
    }

    /// Clock that only moves when told to
    pub fn manual(start: Timestamp) -> Self {
        Self::build(start, false)
    }

    fn build(start: Timestamp, auto_advance: bool) -> Self {
        Self {
            state: Arc::new(ClockState {
                now: Mutex::new(start),
                auto_advance,
                changed: Notify::new(),
                sleeps: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn current(&self) -> Timestamp {
        *self.state.now.lock()
    }

    pub fn advance(&self, by: Duration) {
        {
            let mut now = self.state.now.lock();
            *now = *now + by;
        }
        self.state.changed.notify_waiters();
    }

    /// Move the clock to `to`; never moves backwards
    pub fn set_time(&self, to: Timestamp) {
        {
            let mut now = self.state.now.lock();
            if to > *now {
                *now = to;
            }
        }
        self.state.changed.notify_waiters();
    }

    /// Every deadline passed to `sleep_until`, in call order
    pub fn sleep_deadlines(&self) -> Vec<Timestamp> {
        self.state.sleeps.lock().clone()
    }
}

#[async_trait]
impl ClockEffects for SimulatedClock {
    async fn now(&self) -> Timestamp {
        self.current()
    }

    async fn sleep_until(&self, deadline: Timestamp) -> Result<(), TimeError> {
        self.state.sleeps.lock().push(deadline);
        if self.state.auto_advance {
            self.set_time(deadline);
            // Let other tasks observe the new time before the sleeper resumes.
            tokio::task::yield_now().await;
            return Ok(());
        }
        loop {
            let changed = self.state.changed.notified();
            if self.current() >= deadline {
                return Ok(());
            }
            changed.await;
        }
    }

    fn resolution(&self) -> Duration {
        Duration::from_nanos(1)
    }
}
