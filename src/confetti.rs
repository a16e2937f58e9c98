//! Host-facing confetti driver.
//!
//! [`Confetti`] owns the ECS world, the burst schedule and the render sink.
//! A host starts bursts with [`Confetti::start_confetti`] and calls
//! [`Confetti::tick`] from its frame callback with the frame timestamp in
//! milliseconds. Between ticks nothing runs: pacing is entirely up to the host.
//!
//! # Example
//!
//! ```ignore
//! let mut confetti = Confetti::new(MemorySink::new());
//! let signal = confetti.start_confetti(
//!     ContainerId(1),
//!     ConfettiOptions::new().with_spread(180.0).with_decay(0.7),
//! )?;
//! confetti.run_until_idle(&mut FixedStepTicks::sixty_hz(0.0));
//! futures::executor::block_on(signal)?;
//! ```

use std::marker::PhantomData;

use bevy_ecs::observer::Observer;
use bevy_ecs::prelude::*;
use log::debug;

use crate::completion::CompletionSignal;
use crate::components::burst::ConfettiBurst;
use crate::error::ConfettiError;
use crate::resources::burststats::BurstStats;
use crate::resources::confetticonfig::{ConfettiConfig, ConfettiOptions};
use crate::resources::frameclock::FrameClock;
use crate::resources::rendersink::{ContainerId, RenderSink, SinkRes};
use crate::resources::ticksource::TickSource;
use crate::systems::factory::spawn_burst;
use crate::systems::physics::fetti_physics_system;
use crate::systems::scheduler::{burst_cleanup_system, burst_clock_system, burst_stats_observer};
use crate::systems::time::update_frame_clock;

/// Confetti engine bound to one render sink.
pub struct Confetti<S: RenderSink> {
    world: World,
    update: Schedule,
    _sink: PhantomData<S>,
}

impl<S: RenderSink> Confetti<S> {
    pub fn new(sink: S) -> Self {
        let mut world = World::new();
        world.insert_resource(FrameClock::default());
        world.insert_resource(BurstStats::default());
        world.insert_resource(SinkRes(sink));
        world.spawn(Observer::new(burst_stats_observer));
        // Ensure the observer is registered before any burst can finish.
        world.flush();

        let mut update = Schedule::default();
        update.add_systems(
            (
                burst_clock_system,
                fetti_physics_system::<S>,
                burst_cleanup_system::<S>,
            )
                .chain(),
        );

        Confetti {
            world,
            update,
            _sink: PhantomData,
        }
    }

    /// Start a burst in `container`.
    ///
    /// Invalid options are rejected here, before anything is allocated. A sink
    /// failure while allocating is reported through the returned signal, which
    /// is then already rejected. Otherwise the burst starts moving on the next
    /// [`tick`](Self::tick).
    pub fn start_confetti(
        &mut self,
        container: ContainerId,
        options: ConfettiOptions,
    ) -> Result<CompletionSignal, ConfettiError> {
        let config = ConfettiConfig::resolve(options)?;
        Ok(spawn_burst::<S>(&mut self.world, container, config))
    }

    /// Deliver one host frame at `now` milliseconds.
    pub fn tick(&mut self, now: f64) {
        update_frame_clock(&mut self.world, now);
        self.update.run(&mut self.world);
    }

    /// Deliver ticks from `ticks` until every burst has settled or the source
    /// runs dry. Returns the number of ticks delivered.
    pub fn run_until_idle(&mut self, ticks: &mut impl TickSource) -> u64 {
        let mut delivered = 0;
        while !self.is_idle() {
            let Some(now) = ticks.next_tick() else {
                debug!("Tick source exhausted with {} bursts in flight", self.active_bursts());
                break;
            };
            self.tick(now);
            delivered += 1;
        }
        delivered
    }

    /// Number of bursts that have not settled yet.
    pub fn active_bursts(&mut self) -> usize {
        self.world
            .query::<&ConfettiBurst>()
            .iter(&self.world)
            .count()
    }

    pub fn is_idle(&mut self) -> bool {
        self.active_bursts() == 0
    }

    pub fn stats(&self) -> BurstStats {
        *self.world.resource::<BurstStats>()
    }

    pub fn clock(&self) -> FrameClock {
        *self.world.resource::<FrameClock>()
    }

    pub fn sink(&self) -> &S {
        &self.world.resource::<SinkRes<S>>().0
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.world.resource_mut::<SinkRes<S>>().into_inner().0
    }

    /// The underlying ECS world, for inspection.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}
