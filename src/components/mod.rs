//! ECS components for confetti entities.
//!
//! Submodules overview:
//! - [`burst`] – one confetti animation run and its timing state
//! - [`fetti`] – physics and ownership data of a single confetti piece

pub mod burst;
pub mod fetti;
