//! Host frame clock.
//!
//! Holds the timestamp of the frame currently being processed, in
//! milliseconds, exactly as delivered by the host. Bursts derive elapsed time
//! from these timestamps rather than from a frame counter, so irregular frame
//! intervals do not distort their timing.
use bevy_ecs::prelude::Resource;

#[derive(Resource, Clone, Copy, Debug, Default)]
pub struct FrameClock {
    /// Timestamp of the current tick, in milliseconds.
    pub now: f64,
    /// Milliseconds since the previous tick (0 on the first one).
    pub delta: f64,
    /// Number of ticks delivered so far.
    pub frame_count: u64,
}
