//! Burst scheduling systems.
//!
//! - [`burst_clock_system`] – binds start times, handles aborts and computes
//!   each burst's [`BurstFrame`] from the host timestamp
//! - [`burst_cleanup_system`] – releases the visuals of finished bursts,
//!   settles their completion signal and despawns them
//! - [`burst_stats_observer`] – tallies [`BurstFinished`] events
//!
//! # System Flow
//!
//! Each tick:
//!
//! 1. `burst_clock_system` computes elapsed time, progress and the active
//!    fetti count for every burst that has not terminated
//! 2. `fetti_physics_system` steps the active fettis
//!    ([`crate::systems::physics`])
//! 3. `burst_cleanup_system` finishes bursts whose frame was terminal, or
//!    that were aborted or failed
//!
//! # Stagger
//!
//! With `stagger > 0` the number of active fettis is
//! `min(count, ceil(elapsed / stagger))`, so nothing moves on the very first
//! tick and one more fetti wakes up every `stagger` milliseconds. With
//! `stagger == 0` every fetti is active from the first tick.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::components::burst::{BurstFrame, BurstSettings, BurstState, ConfettiBurst};
use crate::components::fetti::Fetti;
use crate::error::ConfettiError;
use crate::events::burst::BurstFinished;
use crate::resources::burststats::BurstStats;
use crate::resources::frameclock::FrameClock;
use crate::resources::rendersink::{ContainerId, RenderSink, SinkRes, VisualHandle};

/// Number of fettis active `elapsed` milliseconds after the start.
pub fn active_count(count: usize, elapsed: f64, stagger: f64) -> usize {
    if stagger <= 0.0 {
        return count;
    }
    let woken = (elapsed.max(0.0) / stagger).ceil();
    if woken >= count as f64 {
        count
    } else {
        woken as usize
    }
}

/// Frame values of a burst started at `start` for a tick at `now`.
///
/// Progress is `0` on the first tick and `1` on the terminal one.
pub fn frame_at(settings: &BurstSettings, count: usize, start: f64, now: f64) -> BurstFrame {
    let elapsed = (now - start).max(0.0);
    let terminal = elapsed >= settings.duration;
    let progress = if terminal {
        1.0
    } else if now == start {
        0.0
    } else {
        elapsed / settings.duration
    };
    BurstFrame {
        elapsed,
        progress,
        active_count: active_count(count, elapsed, settings.stagger),
        terminal,
    }
}

/// Advance every live burst to the current host timestamp.
///
/// The first tick a burst sees becomes its start time. An aborted burst is
/// terminated before anything else happens on that tick.
pub fn burst_clock_system(clock: Res<FrameClock>, mut bursts: Query<&mut ConfettiBurst>) {
    for mut burst in bursts.iter_mut() {
        if burst.state == BurstState::Terminated {
            continue;
        }
        if burst.abort.is_aborted() {
            debug!("Confetti burst in {:?} aborted", burst.container);
            burst.fail(ConfettiError::Cancelled);
            continue;
        }

        let start = *burst.start_time.get_or_insert(clock.now);
        burst.state = BurstState::Running;
        let frame = frame_at(&burst.settings, burst.count(), start, clock.now);
        burst.frame = frame;
    }
}

/// Hand one visual back to the sink if it is still attached to `container`.
///
/// The slot is emptied in every case, so calling this again for the same fetti
/// never releases twice. Returns whether the sink released something.
pub fn release_visual<S: RenderSink>(
    sink: &mut S,
    container: ContainerId,
    slot: &mut Option<VisualHandle>,
) -> bool {
    let Some(handle) = slot.take() else {
        return false;
    };
    if !sink.contains(container, handle) {
        return false;
    }
    match sink.release(container, handle) {
        Ok(()) => true,
        Err(e) => {
            warn!("Failed to release visual {:?} from {:?}: {}", handle, container, e);
            false
        }
    }
}

/// Release all visuals of a burst. A second call is a no-op.
pub fn release_burst_visuals<S: RenderSink>(
    burst: &mut ConfettiBurst,
    fettis: &mut Query<&mut Fetti>,
    sink: &mut S,
) -> usize {
    if burst.released {
        return 0;
    }
    let mut released = 0;
    for &entity in &burst.fettis {
        if let Ok(mut fetti) = fettis.get_mut(entity) {
            if release_visual(sink, burst.container, &mut fetti.handle) {
                released += 1;
            }
        }
    }
    burst.released = true;
    released
}

/// Finish bursts that reached their terminal frame, were aborted or failed.
///
/// Releases the burst's visuals, settles its completion signal exactly once,
/// triggers [`BurstFinished`] and despawns the burst with its fettis.
pub fn burst_cleanup_system<S: RenderSink>(
    mut commands: Commands,
    mut bursts: Query<(Entity, &mut ConfettiBurst)>,
    mut fettis: Query<&mut Fetti>,
    mut sink: ResMut<SinkRes<S>>,
) {
    for (entity, mut burst) in bursts.iter_mut() {
        if !burst.frame.terminal && burst.state != BurstState::Terminated {
            continue;
        }
        let burst = &mut *burst;
        burst.state = BurstState::Terminated;

        let released = release_burst_visuals(burst, &mut fettis, &mut sink.0);
        let outcome = burst.outcome();
        if burst.completion.settle(outcome.clone()) {
            debug!(
                "Confetti burst {:?} in {:?} finished after {:.0}ms: {:?}, {} visuals released",
                entity, burst.container, burst.frame.elapsed, outcome, released
            );
            commands.trigger(BurstFinished {
                burst: entity,
                container: burst.container,
                outcome,
                released,
            });
        }

        for &fetti in &burst.fettis {
            commands.entity(fetti).try_despawn();
        }
        commands.entity(entity).try_despawn();
    }
}

/// Observer that records finished bursts in [`BurstStats`].
pub fn burst_stats_observer(trigger: On<BurstFinished>, mut stats: ResMut<BurstStats>) {
    let event = trigger.event();
    stats.record(&event.outcome, event.released);
}
