//! Burst tick integration tests: factory, stepper, scheduler and completion
//! driven through the `Confetti` driver with virtual time.

use std::f32::consts::PI;

use bevy_ecs::prelude::*;
use futures::executor::block_on;

use confettiburst::components::fetti::{Fetti, FettiPhysics};
use confettiburst::confetti::Confetti;
use confettiburst::error::{ConfettiError, SinkError};
use confettiburst::events::burst::BurstFinished;
use confettiburst::resources::confetticonfig::{ConfettiOptions, seeded_random};
use confettiburst::resources::memorysink::MemorySink;
use confettiburst::resources::rendersink::{
    ContainerId, FettiStyle, FettiTransform, RenderSink, VisualHandle,
};
use confettiburst::resources::ticksource::{FixedStepTicks, ScriptedTicks, TickSource};
use confettiburst::systems::scheduler::release_visual;

const EPSILON: f32 = 1e-4;
const CONTAINER: ContainerId = ContainerId(1);

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn single_fetti_options() -> ConfettiOptions {
    ConfettiOptions::new()
        .with_element_count(1)
        .with_angle(90.0)
        .with_spread(0.0)
        .with_start_velocity(45.0)
        .with_decay(1.0)
        .with_duration(1000.0)
        .with_random(|| 0.5)
}

/// Physics records of all live fettis, in activation order.
fn physics_of(confetti: &mut Confetti<MemorySink>) -> Vec<FettiPhysics> {
    let world = confetti.world_mut();
    let mut query = world.query::<(&Fetti, &FettiPhysics)>();
    let mut records: Vec<(usize, FettiPhysics)> = query
        .iter(world)
        .map(|(fetti, physics)| (fetti.activation_index, *physics))
        .collect();
    records.sort_by_key(|(index, _)| *index);
    records.into_iter().map(|(_, physics)| physics).collect()
}

/// Distinct handles updated since the last `clear_updates`.
fn updated_handles(sink: &MemorySink) -> Vec<VisualHandle> {
    let mut handles: Vec<VisualHandle> = sink.updates().iter().map(|u| u.handle).collect();
    handles.sort();
    handles.dedup();
    handles
}

#[test]
fn single_fetti_first_step_matches_motion_model() {
    let mut confetti = Confetti::new(MemorySink::new());
    let _signal = confetti
        .start_confetti(CONTAINER, single_fetti_options())
        .unwrap();

    let before = physics_of(&mut confetti);
    assert_eq!(before.len(), 1);
    assert!(approx_eq(before[0].angle_2d, -PI / 2.0));
    assert!(approx_eq(before[0].velocity, 45.0));

    confetti.tick(0.0);

    let after = physics_of(&mut confetti);
    assert!(approx_eq(after[0].position.x, 0.0));
    assert!(approx_eq(after[0].position.y, -42.0));
    assert!(approx_eq(after[0].position.z, 0.0));

    let updates = confetti.sink().updates();
    assert_eq!(updates.len(), 1);
    let record = updates[0];
    let wobble = 5.0_f32 + 0.15;
    assert!(approx_eq(record.transform.translate.x, 10.0 * wobble.cos()));
    assert!(approx_eq(record.transform.translate.y, -42.0 + 10.0 * wobble.sin()));
    assert!(approx_eq(record.transform.rotation, PI / 2.0 + 0.25));
    assert_eq!(record.opacity, 1.0);
    assert!(record.visible);
}

#[test]
fn visuals_start_hidden_with_cycled_colors() {
    let mut confetti = Confetti::new(MemorySink::new());
    let _signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(3)
                .with_colors(["#111111", "#222222"])
                .with_size("4px", "6px")
                .with_perspective("500px"),
        )
        .unwrap();

    let sink = confetti.sink();
    assert_eq!(sink.allocations, 3);
    assert_eq!(sink.perspective(CONTAINER), Some("500px"));
    let colors: Vec<String> = (0..3)
        .map(|i| {
            let visual = sink.visual(VisualHandle(i)).unwrap();
            assert!(!visual.visible);
            assert_eq!(visual.style.width, "4px");
            assert_eq!(visual.style.height, "6px");
            visual.style.color.clone()
        })
        .collect();
    assert_eq!(colors, ["#111111", "#222222", "#111111"]);
}

#[test]
fn stagger_gates_active_fettis() {
    let mut confetti = Confetti::new(MemorySink::new());
    let _signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(10)
                .with_stagger(100.0)
                .with_duration(3000.0)
                .with_random(seeded_random(11)),
        )
        .unwrap();

    confetti.tick(1000.0);
    assert!(confetti.sink().updates().is_empty());

    confetti.tick(1250.0);
    let handles = updated_handles(confetti.sink());
    assert_eq!(handles, [VisualHandle(0), VisualHandle(1), VisualHandle(2)]);

    // Fettis that were never stepped are still hidden and unmoved
    let physics = physics_of(&mut confetti);
    assert!(approx_eq(physics[3].position.x, 0.0));
    assert!(approx_eq(physics[3].position.y, 0.0));
    assert!(!confetti.sink().visual(VisualHandle(3)).unwrap().visible);
}

#[test]
fn active_count_never_decreases() {
    let mut confetti = Confetti::new(MemorySink::new());
    let _signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(8)
                .with_stagger(45.0)
                .with_duration(600.0),
        )
        .unwrap();

    let mut ticks = FixedStepTicks::sixty_hz(0.0);
    let mut last = 0;
    while !confetti.is_idle() {
        confetti.sink_mut().clear_updates();
        confetti.tick(ticks.next_tick().unwrap());
        let active = updated_handles(confetti.sink()).len();
        assert!(active >= last);
        last = active;
    }
    assert_eq!(last, 8);
}

#[test]
fn opacity_fades_to_zero_on_terminal_tick() {
    let mut confetti = Confetti::new(MemorySink::new());
    let mut signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(4)
                .with_duration(100.0)
                .with_random(seeded_random(5)),
        )
        .unwrap();

    let frames = confetti.run_until_idle(&mut FixedStepTicks::sixty_hz(0.0));
    assert!(frames >= 7);
    assert_eq!(signal.try_outcome(), Some(Ok(())));

    let sink = confetti.sink();
    for update in sink.updates() {
        assert!(update.opacity >= 0.0 && update.opacity <= 1.0);
    }
    for i in 0..4 {
        let last = sink.updates_for(VisualHandle(i)).last().unwrap();
        assert_eq!(last.opacity, 0.0);
    }
}

#[test]
fn irregular_ticks_use_host_timestamps() {
    let mut confetti = Confetti::new(MemorySink::new());
    let mut signal = confetti
        .start_confetti(CONTAINER, single_fetti_options())
        .unwrap();

    let delivered =
        confetti.run_until_idle(&mut ScriptedTicks::new([10.0, 15.0, 110.0, 111.0, 910.0, 1010.0]));
    assert_eq!(delivered, 6);
    assert_eq!(signal.try_outcome(), Some(Ok(())));

    let opacities: Vec<f32> = confetti.sink().updates().iter().map(|u| u.opacity).collect();
    let expected = [1.0, 0.995, 0.9, 0.899, 0.1, 0.0];
    assert_eq!(opacities.len(), expected.len());
    for (got, want) in opacities.iter().zip(expected) {
        assert!(approx_eq(*got, want), "{got} != {want}");
    }
}

#[test]
fn completed_burst_releases_every_visual() {
    let mut confetti = Confetti::new(MemorySink::new());
    let signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(25)
                .with_duration(500.0),
        )
        .unwrap();

    confetti.run_until_idle(&mut FixedStepTicks::sixty_hz(0.0));

    assert_eq!(block_on(signal), Ok(()));
    let sink = confetti.sink();
    assert_eq!(sink.allocations, 25);
    assert_eq!(sink.releases, 25);
    assert_eq!(sink.live(), 0);
    assert_eq!(confetti.active_bursts(), 0);

    let stats = confetti.stats();
    assert_eq!(stats.started, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.visuals_released, 25);
    assert_eq!(stats.in_flight(), 0);

    // Every fetti entity is gone with its burst
    let world = confetti.world_mut();
    assert_eq!(world.query::<&Fetti>().iter(world).count(), 0);
}

#[test]
fn zero_fettis_resolve_without_allocations() {
    let mut confetti = Confetti::new(MemorySink::new());
    let mut signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(0)
                .with_duration(200.0),
        )
        .unwrap();

    confetti.run_until_idle(&mut FixedStepTicks::sixty_hz(0.0));

    assert_eq!(signal.try_outcome(), Some(Ok(())));
    assert_eq!(confetti.sink().allocations, 0);
    assert_eq!(confetti.sink().releases, 0);
    assert!(confetti.sink().updates().is_empty());
}

#[test]
fn zero_duration_terminates_on_first_tick() {
    let mut confetti = Confetti::new(MemorySink::new());
    let mut signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(3)
                .with_duration(0.0),
        )
        .unwrap();

    confetti.tick(42.0);

    assert_eq!(signal.try_outcome(), Some(Ok(())));
    let sink = confetti.sink();
    assert_eq!(sink.updates().len(), 3);
    assert!(sink.updates().iter().all(|u| u.opacity == 0.0));
    assert_eq!(sink.releases, 3);
}

#[test]
fn stagger_longer_than_duration_still_releases_everything() {
    let mut confetti = Confetti::new(MemorySink::new());
    let mut signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(5)
                .with_stagger(1000.0)
                .with_duration(500.0),
        )
        .unwrap();

    confetti.run_until_idle(&mut ScriptedTicks::new([0.0, 250.0, 500.0]));

    assert_eq!(signal.try_outcome(), Some(Ok(())));
    let sink = confetti.sink();
    assert_eq!(updated_handles(sink), [VisualHandle(0)]);
    assert_eq!(sink.releases, 5);
    assert_eq!(sink.live(), 0);
}

#[test]
fn legacy_delay_staggers_activation() {
    let mut confetti = Confetti::new(MemorySink::new());
    let options = ConfettiOptions::from_json(r#"{ "elementCount": 6, "delay": 50 }"#).unwrap();
    let _signal = confetti.start_confetti(CONTAINER, options).unwrap();

    confetti.tick(0.0);
    confetti.tick(120.0);
    assert_eq!(updated_handles(confetti.sink()).len(), 3);
}

#[test]
fn decay_keeps_velocity_non_increasing() {
    let mut confetti = Confetti::new(MemorySink::new());
    let _signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(20)
                .with_spread(180.0)
                .with_decay(0.9)
                .with_random(seeded_random(99)),
        )
        .unwrap();

    let mut previous: Vec<f32> = physics_of(&mut confetti).iter().map(|p| p.velocity).collect();
    let mut ticks = FixedStepTicks::sixty_hz(0.0);
    for _ in 0..30 {
        confetti.tick(ticks.next_tick().unwrap());
        let current: Vec<f32> = physics_of(&mut confetti).iter().map(|p| p.velocity).collect();
        for (now, before) in current.iter().zip(&previous) {
            assert!(now <= before);
            assert!(*now >= 0.0);
        }
        previous = current;
    }
}

#[test]
fn invalid_options_fail_before_allocation() {
    let mut confetti = Confetti::new(MemorySink::new());
    let result = confetti.start_confetti(CONTAINER, ConfettiOptions::new().with_duration(-5.0));
    assert!(matches!(result, Err(ConfettiError::InvalidConfig(_))));
    let result = confetti.start_confetti(CONTAINER, ConfettiOptions::new().with_element_count(-1));
    assert!(matches!(result, Err(ConfettiError::InvalidConfig(_))));
    let result = confetti.start_confetti(CONTAINER, ConfettiOptions::new().with_stagger(-1.0));
    assert!(matches!(result, Err(ConfettiError::InvalidConfig(_))));

    assert_eq!(confetti.sink().allocations, 0);
    assert_eq!(confetti.sink().perspective(CONTAINER), None);
    assert_eq!(confetti.stats().started, 0);
}

#[test]
fn detached_container_rejects_once_and_stops_ticking() {
    let mut confetti = Confetti::new(MemorySink::new());
    let mut signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(5)
                .with_duration(1000.0),
        )
        .unwrap();

    confetti.tick(0.0);
    confetti.tick(16.0);
    assert!(signal.try_outcome().is_none());

    confetti.sink_mut().detach_container(CONTAINER);
    confetti.sink_mut().clear_updates();
    confetti.tick(33.0);

    assert_eq!(
        signal.try_outcome(),
        Some(Err(ConfettiError::RenderSinkFailure(
            SinkError::ContainerDetached(CONTAINER)
        )))
    );
    assert_eq!(confetti.active_bursts(), 0);
    assert_eq!(confetti.sink().releases, 0);
    assert_eq!(confetti.stats().failed, 1);

    confetti.tick(50.0);
    confetti.tick(66.0);
    assert!(confetti.sink().updates().is_empty());
    assert_eq!(confetti.stats().failed, 1);
}

#[test]
fn detached_container_fails_at_start() {
    let mut confetti = Confetti::new(MemorySink::new());
    confetti.sink_mut().detach_container(CONTAINER);

    let mut signal = confetti
        .start_confetti(CONTAINER, ConfettiOptions::new())
        .unwrap();

    assert_eq!(
        signal.try_outcome(),
        Some(Err(ConfettiError::RenderSinkFailure(
            SinkError::ContainerDetached(CONTAINER)
        )))
    );
    assert_eq!(confetti.sink().allocations, 0);
    assert!(confetti.is_idle());
}

/// Sink that runs out of visuals after a fixed number of allocations.
struct LimitedSink {
    inner: MemorySink,
    allocations_left: usize,
}

impl RenderSink for LimitedSink {
    fn set_perspective(
        &mut self,
        container: ContainerId,
        perspective: &str,
    ) -> Result<(), SinkError> {
        self.inner.set_perspective(container, perspective)
    }

    fn allocate(
        &mut self,
        container: ContainerId,
        style: &FettiStyle,
    ) -> Result<VisualHandle, SinkError> {
        if self.allocations_left == 0 {
            return Err(SinkError::Backend("out of visuals".to_string()));
        }
        self.allocations_left -= 1;
        self.inner.allocate(container, style)
    }

    fn update(
        &mut self,
        handle: VisualHandle,
        transform: &FettiTransform,
        opacity: f32,
        visible: bool,
    ) -> Result<(), SinkError> {
        self.inner.update(handle, transform, opacity, visible)
    }

    fn contains(&self, container: ContainerId, handle: VisualHandle) -> bool {
        self.inner.contains(container, handle)
    }

    fn release(&mut self, container: ContainerId, handle: VisualHandle) -> Result<(), SinkError> {
        self.inner.release(container, handle)
    }
}

#[test]
fn allocation_failure_releases_partial_allocations() {
    let mut confetti = Confetti::new(LimitedSink {
        inner: MemorySink::new(),
        allocations_left: 3,
    });

    let mut signal = confetti
        .start_confetti(CONTAINER, ConfettiOptions::new().with_element_count(5))
        .unwrap();

    assert!(matches!(
        signal.try_outcome(),
        Some(Err(ConfettiError::RenderSinkFailure(SinkError::Backend(_))))
    ));
    let sink = &confetti.sink().inner;
    assert_eq!(sink.allocations, 3);
    assert_eq!(sink.releases, 3);
    assert_eq!(sink.live(), 0);
    assert!(confetti.is_idle());
    assert_eq!(confetti.stats().failed, 1);
    assert_eq!(confetti.stats().in_flight(), 0);
}

#[test]
fn aborted_burst_is_cancelled_and_cleaned_up() {
    let mut confetti = Confetti::new(MemorySink::new());
    let mut signal = confetti
        .start_confetti(CONTAINER, ConfettiOptions::new().with_element_count(6))
        .unwrap();

    confetti.tick(0.0);
    signal.abort_handle().abort();
    confetti.sink_mut().clear_updates();
    confetti.tick(16.0);

    assert_eq!(signal.try_outcome(), Some(Err(ConfettiError::Cancelled)));
    assert!(confetti.sink().updates().is_empty());
    assert_eq!(confetti.sink().releases, 6);
    assert_eq!(confetti.stats().cancelled, 1);
}

#[test]
fn concurrent_bursts_in_one_container_are_independent() {
    let mut confetti = Confetti::new(MemorySink::new());
    let first = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(5)
                .with_duration(400.0),
        )
        .unwrap();
    let second = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(7)
                .with_duration(400.0),
        )
        .unwrap();
    assert_eq!(confetti.sink().live_in(CONTAINER), 12);

    confetti.tick(0.0);
    first.abort_handle().abort();
    confetti.tick(16.0);

    assert_eq!(confetti.sink().releases, 5);
    assert_eq!(confetti.sink().live_in(CONTAINER), 7);
    assert_eq!(confetti.active_bursts(), 1);

    confetti.run_until_idle(&mut FixedStepTicks::new(32.0, 16.0));

    assert_eq!(block_on(first), Err(ConfettiError::Cancelled));
    assert_eq!(block_on(second), Ok(()));
    assert_eq!(confetti.sink().releases, 12);
    assert_eq!(confetti.sink().live(), 0);
}

#[test]
fn releasing_twice_never_double_releases() {
    let mut sink = MemorySink::new();
    let style = FettiStyle {
        color: "#ffffff".to_string(),
        width: "10px".to_string(),
        height: "10px".to_string(),
    };
    let mut slot = Some(sink.allocate(CONTAINER, &style).unwrap());

    assert!(release_visual(&mut sink, CONTAINER, &mut slot));
    assert!(!release_visual(&mut sink, CONTAINER, &mut slot));
    assert_eq!(sink.releases, 1);
    assert!(slot.is_none());
}

#[test]
fn release_skips_visuals_of_other_containers() {
    let mut sink = MemorySink::new();
    let style = FettiStyle {
        color: "#ffffff".to_string(),
        width: "10px".to_string(),
        height: "10px".to_string(),
    };
    let mut slot = Some(sink.allocate(ContainerId(2), &style).unwrap());

    assert!(!release_visual(&mut sink, CONTAINER, &mut slot));
    assert_eq!(sink.releases, 0);
    assert_eq!(sink.live_in(ContainerId(2)), 1);
}

#[test]
fn observers_see_burst_finished() {
    let mut confetti = Confetti::new(MemorySink::new());
    confetti.world_mut().add_observer(
        |trigger: On<BurstFinished>| {
            assert_eq!(trigger.event().released, 2);
            assert_eq!(trigger.event().container, CONTAINER);
            assert_eq!(trigger.event().outcome, Ok(()));
        },
    );
    confetti.world_mut().flush();

    let _signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(2)
                .with_duration(50.0),
        )
        .unwrap();
    confetti.run_until_idle(&mut FixedStepTicks::sixty_hz(0.0));

    assert_eq!(confetti.stats().completed, 1);
    assert_eq!(confetti.stats().visuals_released, 2);
}

#[test]
fn dropped_driver_abandons_pending_bursts() {
    let mut confetti = Confetti::new(MemorySink::new());
    let signal = confetti
        .start_confetti(CONTAINER, ConfettiOptions::new())
        .unwrap();
    confetti.tick(0.0);
    drop(confetti);

    assert_eq!(block_on(signal), Err(ConfettiError::Abandoned));
}

#[test]
fn failed_start_keeps_in_flight_in_step_with_running_bursts() {
    let mut confetti = Confetti::new(LimitedSink {
        inner: MemorySink::new(),
        allocations_left: 5,
    });

    let _running = confetti
        .start_confetti(CONTAINER, ConfettiOptions::new().with_element_count(5))
        .unwrap();
    let mut failed = confetti
        .start_confetti(CONTAINER, ConfettiOptions::new().with_element_count(5))
        .unwrap();
    assert!(matches!(
        failed.try_outcome(),
        Some(Err(ConfettiError::RenderSinkFailure(_)))
    ));

    confetti.tick(0.0);

    let stats = confetti.stats();
    assert_eq!(stats.started, 2);
    assert_eq!(stats.failed, 1);
    assert_eq!(confetti.active_bursts(), 1);
    assert_eq!(stats.in_flight(), confetti.active_bursts() as u64);
}

#[test]
fn fettis_become_visible_on_their_first_step() {
    let mut confetti = Confetti::new(MemorySink::new());
    let _signal = confetti
        .start_confetti(
            CONTAINER,
            ConfettiOptions::new()
                .with_element_count(4)
                .with_stagger(100.0)
                .with_duration(2000.0),
        )
        .unwrap();

    confetti.tick(0.0);
    confetti.tick(150.0);

    let world = confetti.world_mut();
    let mut query = world.query::<&Fetti>();
    let mut visibility: Vec<(usize, bool)> = query
        .iter(world)
        .map(|fetti| (fetti.activation_index, fetti.visible))
        .collect();
    visibility.sort();
    assert_eq!(visibility, [(0, true), (1, true), (2, false), (3, false)]);

    let sink = confetti.sink();
    assert!(sink.updates().iter().all(|u| u.visible));
    assert!(sink.visual(VisualHandle(1)).unwrap().visible);
    assert!(!sink.visual(VisualHandle(2)).unwrap().visible);
}
