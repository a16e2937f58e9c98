//! Event types used by the engine.
//!
//! Submodules:
//! - [`burst`] – notification triggered when a burst settles its completion signal
pub mod burst;
