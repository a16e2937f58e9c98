//! Frame tick sources.
//!
//! A [`TickSource`] delivers host frame timestamps in milliseconds. Real hosts
//! call [`Confetti::tick`](crate::confetti::Confetti::tick) from their own
//! frame callback; tests and the headless runner instead hand a tick source to
//! [`Confetti::run_until_idle`](crate::confetti::Confetti::run_until_idle) to
//! drive deterministic virtual time.

use std::collections::VecDeque;

/// Nominal display refresh interval, in milliseconds.
pub const NOMINAL_FRAME_MS: f64 = 1000.0 / 60.0;

/// Something that can deliver the next frame timestamp.
pub trait TickSource {
    /// Next timestamp in milliseconds, or `None` when the source is exhausted.
    fn next_tick(&mut self) -> Option<f64>;
}

/// Evenly spaced virtual frames.
#[derive(Debug, Clone)]
pub struct FixedStepTicks {
    next: f64,
    step: f64,
    remaining: Option<u64>,
}

impl FixedStepTicks {
    /// Unbounded ticks starting at `start`, `step` milliseconds apart.
    pub fn new(start: f64, step: f64) -> Self {
        Self {
            next: start,
            step,
            remaining: None,
        }
    }

    /// 60 Hz ticks starting at `start`.
    pub fn sixty_hz(start: f64) -> Self {
        Self::new(start, NOMINAL_FRAME_MS)
    }

    /// Stop after `frames` ticks.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl TickSource for FixedStepTicks {
    fn next_tick(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        let t = self.next;
        self.next += self.step;
        Some(t)
    }
}

/// A fixed list of timestamps, delivered in order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTicks {
    ticks: VecDeque<f64>,
}

impl ScriptedTicks {
    pub fn new(ticks: impl IntoIterator<Item = f64>) -> Self {
        Self {
            ticks: ticks.into_iter().collect(),
        }
    }
}

impl TickSource for ScriptedTicks {
    fn next_tick(&mut self) -> Option<f64> {
        self.ticks.pop_front()
    }
}
