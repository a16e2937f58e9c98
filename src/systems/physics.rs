//! Fetti physics stepper.
//!
//! [`step`] advances one fetti by one frame and [`render_state`] turns the
//! result into what the render sink receives. Both are pure; the
//! [`fetti_physics_system`] applies them to the active fettis of every running
//! burst and forwards the result to the sink.
//!
//! # Motion model
//!
//! A stylized approximation, not projectile physics:
//!
//! - move along the launch angles by the current velocity
//! - damp velocity, by a multiplicative decay or by drag friction
//! - add a constant downward bias ([`GRAVITY`])
//! - spin the wobble phase and the tilt angle
//!
//! The wobble is a purely visual offset of radius [`WOBBLE_RADIUS`] around the
//! physical position and is never fed back into it.
//!
//! Screen coordinates: Y+ is down, so a 90° launch angle points up.

use bevy_ecs::prelude::*;
use log::warn;
use raylib::prelude::Vector3;

use crate::components::burst::{BurstState, ConfettiBurst};
use crate::components::fetti::{Fetti, FettiPhysics};
use crate::resources::confetticonfig::Damping;
use crate::resources::rendersink::{FettiTransform, RenderSink, SinkRes};

/// Downward displacement added every frame, in distance units.
pub const GRAVITY: f32 = 3.0;
/// Radius of the visual wobble around the physical position.
pub const WOBBLE_RADIUS: f32 = 10.0;
/// Axis of the tilt rotation.
pub const TILT_AXIS: Vector3 = Vector3 {
    x: 1.0,
    y: 1.0,
    z: 1.0,
};

/// Advance a fetti by one frame.
pub fn step(mut p: FettiPhysics, damping: Damping) -> FettiPhysics {
    p.position.x += p.angle_2d.cos() * p.velocity;
    p.position.y += p.angle_2d.sin() * p.velocity;
    p.position.z += p.angle_3d.sin() * p.velocity;
    p.wobble += p.wobble_speed;

    p.velocity = match damping {
        Damping::Decay(factor) => p.velocity * factor,
        Damping::Drag(friction) => p.velocity - p.velocity * friction,
    }
    .max(0.0);

    p.position.y += GRAVITY;
    p.tilt_angle += p.tilt_speed;
    p
}

/// What the render sink receives for one fetti on one frame.
#[derive(Debug, Clone, Copy)]
pub struct FettiRender {
    pub transform: FettiTransform,
    pub opacity: f32,
}

/// Opacity for a given burst progress: `1 - progress`, clamped to `[0, 1]`.
pub fn opacity_for(progress: f64) -> f32 {
    (1.0 - progress.clamp(0.0, 1.0)) as f32
}

/// Placement and opacity of a fetti, including the wobble offset.
pub fn render_state(p: &FettiPhysics, progress: f64) -> FettiRender {
    FettiRender {
        transform: FettiTransform {
            translate: Vector3 {
                x: p.position.x + WOBBLE_RADIUS * p.wobble.cos(),
                y: p.position.y + WOBBLE_RADIUS * p.wobble.sin(),
                z: p.position.z,
            },
            axis: TILT_AXIS,
            rotation: p.tilt_angle,
        },
        opacity: opacity_for(progress),
    }
}

/// Step the active fettis of every running burst and push them to the sink.
///
/// Only the first [`active_count`](crate::components::burst::BurstFrame::active_count)
/// fettis of a burst, in activation order, are touched. A sink failure stops
/// the burst on the spot: the remaining fettis of that burst are skipped and
/// the cleanup system rejects its signal.
///
/// # Ordering
///
/// Runs after `burst_clock_system` and before `burst_cleanup_system`.
pub fn fetti_physics_system<S: RenderSink>(
    mut bursts: Query<&mut ConfettiBurst>,
    mut fettis: Query<(&mut Fetti, &mut FettiPhysics)>,
    mut sink: ResMut<SinkRes<S>>,
) {
    for mut burst in bursts.iter_mut() {
        if burst.state != BurstState::Running {
            continue;
        }
        let burst = &mut *burst;
        let active = burst.frame.active_count.min(burst.fettis.len());
        let mut failure = None;

        for &entity in &burst.fettis[..active] {
            let Ok((mut fetti, mut physics)) = fettis.get_mut(entity) else {
                continue;
            };
            let Some(handle) = fetti.handle else {
                continue;
            };

            *physics = step(*physics, burst.settings.damping);
            let render = render_state(&physics, burst.frame.progress);
            // Stepped fettis show from their first step on
            fetti.visible = true;
            if let Err(e) = sink
                .0
                .update(handle, &render.transform, render.opacity, fetti.visible)
            {
                warn!(
                    "Render sink rejected fetti {} of burst in {:?}: {}",
                    fetti.activation_index, burst.container, e
                );
                failure = Some(e);
                break;
            }
        }

        if let Some(e) = failure {
            burst.fail(e.into());
        }
    }
}
