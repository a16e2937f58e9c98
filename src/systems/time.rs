//! Frame clock update.
//!
//! Writes the host timestamp of the current tick into the shared
//! [`FrameClock`](crate::resources::frameclock::FrameClock) resource before the
//! burst systems run.
use bevy_ecs::prelude::*;

use crate::resources::frameclock::FrameClock;

/// Store `now` (milliseconds) as the current tick time.
///
/// `delta` is 0 on the first tick. Timestamps are taken as delivered; a host
/// clock that steps backwards yields a negative delta.
pub fn update_frame_clock(world: &mut World, now: f64) {
    let mut clock = world.resource_mut::<FrameClock>();
    clock.delta = if clock.frame_count == 0 {
        0.0
    } else {
        now - clock.now
    };
    clock.now = now;
    clock.frame_count += 1;
}
