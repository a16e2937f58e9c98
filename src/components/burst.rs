//! Confetti burst component: one animation run.
//!
//! A [`ConfettiBurst`] entity aggregates everything a single run needs: the
//! container it draws into, the timing settings resolved from
//! [`ConfettiConfig`](crate::resources::confetticonfig::ConfettiConfig), the
//! ordered list of its fetti entities, the lazily bound start time, the frame
//! values computed on the latest tick, and the completion channel.
//!
//! # Lifecycle
//!
//! 1. [`spawn_burst`](crate::systems::factory::spawn_burst) spawns it in
//!    [`BurstState::NotStarted`]
//! 2. The first tick binds `start_time` and moves it to [`BurstState::Running`]
//! 3. The tick where `elapsed >= duration` (or an abort, or a sink failure)
//!    moves it to [`BurstState::Terminated`]
//! 4. [`burst_cleanup_system`](crate::systems::scheduler::burst_cleanup_system)
//!    releases the visuals, settles the signal and despawns everything

use bevy_ecs::prelude::*;

use crate::completion::{AbortHandle, BurstResult, CompletionSender};
use crate::error::ConfettiError;
use crate::resources::confetticonfig::Damping;
use crate::resources::rendersink::ContainerId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BurstState {
    NotStarted,
    Running,
    Terminated,
}

/// Timing settings copied from the resolved configuration.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BurstSettings {
    /// Run length in milliseconds.
    pub duration: f64,
    /// Milliseconds between successive fetti activations. 0 activates all at once.
    pub stagger: f64,
    pub damping: Damping,
}

/// Values computed for the current tick.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BurstFrame {
    /// Milliseconds since `start_time`.
    pub elapsed: f64,
    /// Completion fraction. 0 on the first tick, 1 on the terminal tick.
    pub progress: f64,
    /// Number of fettis stepped this tick, counted in activation order.
    pub active_count: usize,
    /// True on the tick where `elapsed >= duration`.
    pub terminal: bool,
}

/// One confetti animation run.
#[derive(Component, Debug)]
pub struct ConfettiBurst {
    pub container: ContainerId,
    pub settings: BurstSettings,
    /// Fetti entities in activation order.
    pub fettis: Vec<Entity>,
    /// Timestamp of the first tick, bound lazily.
    pub start_time: Option<f64>,
    pub state: BurstState,
    pub frame: BurstFrame,
    /// Set when the run stops early; settles the signal as a rejection.
    pub failure: Option<ConfettiError>,
    /// True once the visuals have been handed back to the sink.
    pub released: bool,
    pub completion: CompletionSender,
    pub abort: AbortHandle,
}

impl ConfettiBurst {
    pub fn new(
        container: ContainerId,
        settings: BurstSettings,
        completion: CompletionSender,
        abort: AbortHandle,
    ) -> Self {
        ConfettiBurst {
            container,
            settings,
            fettis: Vec::new(),
            start_time: None,
            state: BurstState::NotStarted,
            frame: BurstFrame::default(),
            failure: None,
            released: false,
            completion,
            abort,
        }
    }

    pub fn count(&self) -> usize {
        self.fettis.len()
    }

    /// Stop the run and record why. The first recorded failure is kept.
    pub fn fail(&mut self, error: ConfettiError) {
        if self.failure.is_none() {
            self.failure = Some(error);
        }
        self.state = BurstState::Terminated;
    }

    /// Outcome to settle the completion signal with.
    pub fn outcome(&self) -> BurstResult {
        match &self.failure {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}
