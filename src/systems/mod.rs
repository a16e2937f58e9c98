//! Engine systems.
//!
//! Submodules overview
//! - [`factory`] – draw randomized fetti physics and spawn bursts
//! - [`physics`] – advance fettis one frame and push them to the render sink
//! - [`render`] – draw a [`RaylibSink`](crate::resources::raylibsink::RaylibSink) with raylib
//! - [`scheduler`] – burst clock, stagger gating, cleanup and completion
//! - [`time`] – update the frame clock from host timestamps

pub mod factory;
pub mod physics;
pub mod render;
pub mod scheduler;
pub mod time;
