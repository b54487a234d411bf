//! Cooperative scheduling of render work.
//!
//! The engine never blocks. After each processed job it decides how it wants
//! to be called back and registers that with a [`Scheduler`] supplied by the
//! host event loop:
//!
//! ```text
//!            queued / visible area
//!   ─────────────┬──────────────┬──────────────►
//!     < low (1%) │  hysteresis  │ > high (10%)
//!   Delayed(50ms)│  keep as is  │ Now(Redraw)
//! ```
//!
//! While the source is still loading, the engine always yields at
//! background priority.

mod host;

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

pub use host::{drive, run_until_idle, ManualScheduler};

/// Priority of an immediate callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Priority {
    /// Run when the host is otherwise idle
    Background,
    /// Run ahead of ordinary idle work
    Redraw,
}

/// A persistent callback registration.
///
/// A registration stays in effect, calling the engine back repeatedly, until
/// it is replaced or cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Registration {
    Now(Priority),
    After(Duration),
}

/// Host capability for calling the engine back later.
pub trait Scheduler {
    /// Replace any current registration with an immediate one.
    fn schedule_now(&mut self, priority: Priority);

    /// Replace any current registration with a delayed one.
    fn schedule_after(&mut self, delay: Duration);

    /// Drop the current registration.
    fn cancel(&mut self);

    /// Apply a registration decision.
    fn register(&mut self, registration: Registration) {
        match registration {
            Registration::Now(priority) => self.schedule_now(priority),
            Registration::After(delay) => self.schedule_after(delay),
        }
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Adaptive priority selection with hysteresis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulePolicy {
    /// Queued percentage above which the redraw priority is used
    pub high_percent: f64,

    /// Queued percentage below which the engine waits
    pub low_percent: f64,

    /// Wait used below the low threshold
    pub delay: Duration,
}

impl Default for SchedulePolicy {
    fn default() -> Self {
        Self {
            high_percent: 10.0,
            low_percent: 1.0,
            delay: Duration::from_millis(50),
        }
    }
}

impl SchedulePolicy {
    /// Choose the next registration.
    ///
    /// Returns `None` when the current registration should be kept. `force`
    /// requests a registration even inside the hysteresis band (used when
    /// nothing is registered yet).
    pub fn decide(
        &self,
        queued_area: i64,
        visible_area: i64,
        loading: bool,
        force: bool,
    ) -> Option<Registration> {
        if loading {
            debug!("redraw priority: loading");
            return Some(Registration::Now(Priority::Background));
        }

        let percent = if visible_area <= 0 {
            100.0
        } else {
            100.0 * queued_area as f64 / visible_area as f64
        };

        if percent > self.high_percent {
            debug!("redraw priority: high {:.2} %", percent);
            return Some(Registration::Now(Priority::Redraw));
        }

        if percent < self.low_percent || force {
            debug!("redraw priority: wait {:.2} %", percent);
            return Some(Registration::After(self.delay));
        }

        debug!("redraw priority: no change {:.2} %", percent);
        None
    }
}

// =============================================================================
// Tests
// =============================================================================
