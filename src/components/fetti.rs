//! Fetti components: a single confetti piece.
//!
//! Each fetti entity carries two components:
//! - [`FettiPhysics`] – the motion state advanced once per frame by
//!   [`crate::systems::physics::step`]
//! - [`Fetti`] – ownership data: the burst it belongs to, its place in the
//!   stagger order and its visual handle in the render sink
//!
//! Fettis are spawned by [`crate::systems::factory::spawn_burst`] and
//! despawned together with their burst by
//! [`crate::systems::scheduler::burst_cleanup_system`].

use bevy_ecs::prelude::*;
use raylib::prelude::Vector3;

use crate::resources::rendersink::VisualHandle;

/// Motion state of one fetti.
///
/// All fields are drawn once by the factory. Only the stepper changes
/// `position`, `wobble`, `velocity` and `tilt_angle` afterwards.
#[derive(Component, Clone, Copy, Debug)]
pub struct FettiPhysics {
    /// Untransformed position, starts at the origin.
    pub position: Vector3,
    /// Wobble phase in radians.
    pub wobble: f32,
    /// Wobble phase increment per frame.
    pub wobble_speed: f32,
    /// Speed along the launch angles. Never negative.
    pub velocity: f32,
    /// Launch angle in the screen plane, radians.
    pub angle_2d: f32,
    /// Launch angle towards the viewer, radians.
    pub angle_3d: f32,
    /// Rotation about the (1, 1, 1) axis, radians.
    pub tilt_angle: f32,
    /// Rotation increment per frame.
    pub tilt_speed: f32,
}

/// Ownership and visibility data of a fetti.
#[derive(Component, Clone, Debug)]
pub struct Fetti {
    /// The [`ConfettiBurst`](super::burst::ConfettiBurst) entity that owns this fetti.
    pub burst: Entity,
    /// Position in the stagger order, `0..count`.
    pub activation_index: usize,
    /// Visual handle in the render sink. `None` once released.
    pub handle: Option<VisualHandle>,
    /// Set after the first step.
    pub visible: bool,
}

impl Fetti {
    pub fn new(burst: Entity, activation_index: usize, handle: VisualHandle) -> Self {
        Fetti {
            burst,
            activation_index,
            handle: Some(handle),
            visible: false,
        }
    }
}
