//! Render sink contract and the ECS resource that carries it.
//!
//! The confetti core never draws anything itself. It talks to a
//! [`RenderSink`], which owns the visual representation of each fetti inside a
//! host container (a DOM node, a raylib layer, an in-memory table...).
//!
//! The core only ever:
//! 1. sets the container perspective once when a burst starts,
//! 2. allocates one hidden visual per fetti,
//! 3. updates visuals while the burst runs,
//! 4. releases the visuals that are still attached to the container.
//!
//! Several bursts may share one container; a sink must keep the handles it
//! hands out distinct so bursts never touch each other's visuals.

use std::fmt;

use bevy_ecs::prelude::Resource;
use raylib::prelude::Vector3;

use crate::error::SinkError;

/// Opaque identifier of a host container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

/// Opaque identifier of one fetti visual, created by the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualHandle(pub u64);

/// Per-fetti visual attributes. The core passes them through untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct FettiStyle {
    pub color: String,
    pub width: String,
    pub height: String,
}

/// Placement of a fetti for one frame: a 3D translation followed by a
/// rotation of `rotation` radians about `axis`.
#[derive(Debug, Clone, Copy)]
pub struct FettiTransform {
    pub translate: Vector3,
    pub axis: Vector3,
    pub rotation: f32,
}

impl fmt::Display for FettiTransform {
    /// CSS transform notation, handy for DOM-like sinks and logs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "translate3d({}px, {}px, {}px) rotate3d({}, {}, {}, {}rad)",
            self.translate.x,
            self.translate.y,
            self.translate.z,
            self.axis.x,
            self.axis.y,
            self.axis.z,
            self.rotation
        )
    }
}

/// External collaborator that owns fetti visuals.
pub trait RenderSink: Send + Sync + 'static {
    /// Set the container's 3D perspective. Called once per burst, before any allocation.
    fn set_perspective(&mut self, container: ContainerId, perspective: &str)
    -> Result<(), SinkError>;

    /// Create a hidden visual inside `container`.
    fn allocate(
        &mut self,
        container: ContainerId,
        style: &FettiStyle,
    ) -> Result<VisualHandle, SinkError>;

    /// Place, fade and show/hide a visual.
    fn update(
        &mut self,
        handle: VisualHandle,
        transform: &FettiTransform,
        opacity: f32,
        visible: bool,
    ) -> Result<(), SinkError>;

    /// Whether `handle` is still attached to `container`.
    fn contains(&self, container: ContainerId, handle: VisualHandle) -> bool;

    /// Remove a visual from `container`.
    fn release(&mut self, container: ContainerId, handle: VisualHandle) -> Result<(), SinkError>;
}

/// ECS resource wrapping the active sink.
#[derive(Resource)]
pub struct SinkRes<S: RenderSink>(pub S);
