//! Confetti burst library.
//!
//! A short-lived particle animation engine: a burst of confetti pieces
//! ("fettis") is launched into a host container, advanced once per host frame
//! and cleaned up after a fixed duration, with a one-shot completion signal.
//!
//! This module exposes the engine's ECS components, resources, systems, and
//! events for use in integration tests and as a reusable library. Most hosts
//! only need [`confetti::Confetti`], [`resources::confetticonfig::ConfettiOptions`]
//! and a [`resources::rendersink::RenderSink`].

pub mod completion;
pub mod components;
pub mod confetti;
pub mod error;
pub mod events;
pub mod resources;
pub mod systems;
