//! Burst completion events.
//!
//! When a confetti burst settles its completion signal, the cleanup system
//! triggers a [`BurstFinished`] event. Observers can subscribe to it to keep
//! statistics or chain follow-up effects.
//!
//! # Example
//!
//! ```ignore
//! world.add_observer(|trigger: On<BurstFinished>| {
//!     if let Err(e) = &trigger.event().outcome {
//!         log::warn!("confetti burst failed: {}", e);
//!     }
//! });
//! ```
//!
//! # Related
//!
//! - [`crate::systems::scheduler::burst_cleanup_system`] – the system that triggers it
//! - [`crate::systems::scheduler::burst_stats_observer`] – the built-in observer

use bevy_ecs::prelude::*;

use crate::completion::BurstResult;
use crate::resources::rendersink::ContainerId;

/// Event triggered once per burst, right after its signal settled.
#[derive(Event, Debug, Clone)]
pub struct BurstFinished {
    /// The burst entity. It is despawned in the same command flush.
    pub burst: Entity,
    /// Container the burst drew into.
    pub container: ContainerId,
    /// Outcome delivered to the completion signal.
    pub outcome: BurstResult,
    /// Number of visuals handed back to the sink during cleanup.
    pub released: usize,
}
