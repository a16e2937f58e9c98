//! Fetti factory.
//!
//! Builds the randomized physics records of a burst and spawns the burst and
//! its fettis into the ECS world.
//!
//! # Randomness
//!
//! Every random value comes from the injected source, seven draws per fetti in
//! this order: wobble, wobble speed, velocity, 2D angle, 3D angle, tilt angle,
//! tilt speed. Feeding a fixed sequence therefore yields a fully deterministic
//! burst.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use bevy_ecs::prelude::*;
use log::{debug, warn};
use raylib::prelude::Vector3;

use crate::completion::{AbortHandle, CompletionSignal};
use crate::components::burst::{BurstSettings, ConfettiBurst};
use crate::components::fetti::{Fetti, FettiPhysics};
use crate::error::ConfettiError;
use crate::resources::burststats::BurstStats;
use crate::resources::confetticonfig::ConfettiConfig;
use crate::resources::rendersink::{ContainerId, FettiStyle, RenderSink, SinkRes, VisualHandle};
use crate::systems::scheduler::release_visual;

/// Draw the physics record of one fetti.
///
/// `angle` and `spread` are in degrees. `random` must return values in `[0, 1)`.
pub fn random_physics(
    angle: f32,
    spread: f32,
    start_velocity: f32,
    random: &mut impl FnMut() -> f32,
) -> FettiPhysics {
    let rad_angle = angle.to_radians();
    let rad_spread = spread.to_radians();

    let wobble = random() * 10.0;
    let wobble_speed = 0.1 + random() * 0.1;
    let velocity = start_velocity * 0.5 + random() * start_velocity;
    let angle_2d = -rad_angle + (0.5 * rad_spread - random() * rad_spread);
    let angle_3d = -FRAC_PI_4 + random() * FRAC_PI_2;
    let tilt_angle = random() * PI;
    let tilt_speed = 0.1 + random() * 0.3;

    FettiPhysics {
        position: Vector3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        },
        wobble,
        wobble_speed,
        velocity,
        angle_2d,
        angle_3d,
        tilt_angle,
        tilt_speed,
    }
}

/// Draw `count` physics records, in activation order.
pub fn create_fettis(
    count: usize,
    angle: f32,
    spread: f32,
    start_velocity: f32,
    random: &mut impl FnMut() -> f32,
) -> Vec<FettiPhysics> {
    (0..count)
        .map(|_| random_physics(angle, spread, start_velocity, &mut *random))
        .collect()
}

/// Release every handle in `handles` that is still attached to `container`.
fn release_allocated<S: RenderSink>(
    sink: &mut S,
    container: ContainerId,
    handles: Vec<VisualHandle>,
) -> usize {
    handles
        .into_iter()
        .filter(|&handle| release_visual(sink, container, &mut Some(handle)))
        .count()
}

/// Start a burst: set the container perspective, draw the physics, allocate
/// one hidden visual per fetti and spawn the entities.
///
/// The burst does not move until the next tick binds its start time. If the
/// sink fails here, the visuals allocated so far are released and the
/// returned signal is already rejected.
pub fn spawn_burst<S: RenderSink>(
    world: &mut World,
    container: ContainerId,
    mut config: ConfettiConfig,
) -> CompletionSignal {
    let physics = create_fettis(
        config.element_count,
        config.angle,
        config.spread,
        config.start_velocity,
        &mut config.random,
    );

    let allocated = {
        let sink = &mut world.resource_mut::<SinkRes<S>>().into_inner().0;
        allocate_visuals(sink, container, &config)
    };

    let handles = match allocated {
        Ok(handles) => handles,
        Err(e) => {
            warn!("Confetti burst in {:?} failed to start: {}", container, e);
            let outcome = Err(e);
            let mut stats = world.resource_mut::<BurstStats>();
            stats.started += 1;
            stats.record(&outcome, 0);
            return CompletionSignal::settled(outcome);
        }
    };

    let abort = AbortHandle::new();
    let (sender, signal) = CompletionSignal::channel(abort.clone());
    let settings = BurstSettings {
        duration: config.duration,
        stagger: config.stagger,
        damping: config.damping,
    };
    let burst = world
        .spawn(ConfettiBurst::new(container, settings, sender, abort))
        .id();

    let fettis: Vec<Entity> = physics
        .into_iter()
        .zip(handles)
        .enumerate()
        .map(|(index, (physics, handle))| {
            world.spawn((Fetti::new(burst, index, handle), physics)).id()
        })
        .collect();

    debug!(
        "Spawned confetti burst {:?} in {:?}: {} fettis, {}ms, stagger {}ms, {:?}",
        burst,
        container,
        fettis.len(),
        settings.duration,
        settings.stagger,
        settings.damping
    );

    if let Some(mut b) = world.get_mut::<ConfettiBurst>(burst) {
        b.fettis = fettis;
    }
    world.resource_mut::<BurstStats>().started += 1;

    signal
}

/// Set the perspective and allocate the visuals, undoing the allocations on failure.
fn allocate_visuals<S: RenderSink>(
    sink: &mut S,
    container: ContainerId,
    config: &ConfettiConfig,
) -> Result<Vec<VisualHandle>, ConfettiError> {
    sink.set_perspective(container, &config.perspective)?;

    let mut handles = Vec::with_capacity(config.element_count);
    for index in 0..config.element_count {
        let style = FettiStyle {
            color: config.color_for(index).to_string(),
            width: config.width.clone(),
            height: config.height.clone(),
        };
        match sink.allocate(container, &style) {
            Ok(handle) => handles.push(handle),
            Err(e) => {
                release_allocated(sink, container, handles);
                return Err(e.into());
            }
        }
    }
    Ok(handles)
}
