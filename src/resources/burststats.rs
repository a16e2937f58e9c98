use bevy_ecs::prelude::Resource;

use crate::completion::BurstResult;
use crate::error::ConfettiError;

/// Running totals over all bursts of a [`Confetti`](crate::confetti::Confetti) driver.
#[derive(Resource, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BurstStats {
    pub started: u64,
    pub completed: u64,
    pub cancelled: u64,
    pub failed: u64,
    pub visuals_released: u64,
}

impl BurstStats {
    /// Count a settled burst.
    pub fn record(&mut self, outcome: &BurstResult, released: usize) {
        match outcome {
            Ok(()) => self.completed += 1,
            Err(ConfettiError::Cancelled) => self.cancelled += 1,
            Err(_) => self.failed += 1,
        }
        self.visuals_released += released as u64;
    }

    /// Bursts started but not yet settled.
    pub fn in_flight(&self) -> u64 {
        self.started
            .saturating_sub(self.completed + self.cancelled + self.failed)
    }
}
