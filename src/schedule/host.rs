//! Host-side drivers for the engine's callback registrations.

use std::time::Duration;

use tracing::trace;

use crate::render::TileRenderer;
use crate::source::ImageSource;

use super::{Priority, Registration, Scheduler};

/// Scheduler that only records what the engine asked for.
///
/// Useful for hosts that poll [`TileRenderer::registration`] themselves, and
/// for tests.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    current: Option<Registration>,
    history: Vec<Registration>,
    cancellations: usize,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// The registration currently in effect.
    pub fn current(&self) -> Option<Registration> {
        self.current
    }

    /// Every registration made, oldest first.
    pub fn history(&self) -> &[Registration] {
        &self.history
    }

    pub fn cancellations(&self) -> usize {
        self.cancellations
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_now(&mut self, priority: Priority) {
        let registration = Registration::Now(priority);
        self.current = Some(registration);
        self.history.push(registration);
    }

    fn schedule_after(&mut self, delay: Duration) {
        let registration = Registration::After(delay);
        self.current = Some(registration);
        self.history.push(registration);
    }

    fn cancel(&mut self) {
        if self.current.take().is_some() {
            self.cancellations += 1;
        }
    }
}

/// Process jobs synchronously until the engine disarms, ignoring delays.
///
/// Stops after `max_ticks` callbacks; returns the number of callbacks run.
pub fn run_until_idle<P, S>(engine: &mut TileRenderer<P, S>, max_ticks: usize) -> usize
where
    P: ImageSource,
    S: Scheduler,
{
    let mut ticks = 0;
    while engine.registration().is_some() && ticks < max_ticks {
        engine.process_next();
        ticks += 1;
    }
    ticks
}

/// Drive the engine on the current tokio runtime until it disarms.
///
/// Delayed registrations sleep, background registrations yield to other
/// tasks first, redraw registrations run immediately.
pub async fn drive<P, S>(engine: &mut TileRenderer<P, S>) -> usize
where
    P: ImageSource,
    S: Scheduler,
{
    let mut ticks = 0;
    while let Some(registration) = engine.registration() {
        match registration {
            Registration::After(delay) => tokio::time::sleep(delay).await,
            Registration::Now(Priority::Background) => tokio::task::yield_now().await,
            Registration::Now(Priority::Redraw) => {}
        }
        trace!(?registration, "Engine callback");
        engine.process_next();
        ticks += 1;
    }
    ticks
}

// =============================================================================
// Tests
// =============================================================================
