//! ECS resources and host-facing collaborators.
//!
//! Overview
//! - `burststats` – running totals of started and settled bursts
//! - `confetticonfig` – burst options, defaults, legacy migration and validation
//! - `frameclock` – timestamp of the tick being processed
//! - `memorysink` – headless render sink that records every call
//! - `raylibsink` – render sink backing the raylib renderer
//! - `rendersink` – the render sink contract and its ECS resource
//! - `ticksource` – virtual frame timestamps for tests and headless runs
pub mod burststats;
pub mod confetticonfig;
pub mod frameclock;
pub mod memorysink;
pub mod raylibsink;
pub mod rendersink;
pub mod ticksource;
