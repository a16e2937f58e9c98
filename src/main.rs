//! Confetti burst demo entry point.
//!
//! Fires confetti bursts using:
//! - **raylib** for the window and drawing
//! - **bevy_ecs** for the burst/fetti entities and systems
//!
//! # Modes
//!
//! - Window (default): SPACE or a left click fires a burst into each of two
//!   containers, one on each side of the screen.
//! - `--headless`: runs the requested bursts against an in-memory sink with
//!   virtual 60 Hz frames and prints a summary.
//!
//! Options come from an optional INI file (`--config`, `[confetti]` section)
//! with command line flags layered on top.
//!
//! # Running
//!
//! ```sh
//! cargo run --release -- --spread 180 --start-velocity 40 --decay 0.7
//! cargo run --release -- --headless --bursts 3 --seed 7
//! ```

use std::path::PathBuf;

use clap::Parser;
use confettiburst::completion::CompletionSignal;
use confettiburst::confetti::Confetti;
use confettiburst::resources::confetticonfig::{ConfettiOptions, seeded_random};
use confettiburst::resources::memorysink::MemorySink;
use confettiburst::resources::raylibsink::RaylibSink;
use confettiburst::resources::rendersink::{ContainerId, RenderSink};
use confettiburst::resources::ticksource::FixedStepTicks;
use confettiburst::systems::render::render_confetti;
use raylib::prelude::*;

const WINDOW_WIDTH: i32 = 1280;
const WINDOW_HEIGHT: i32 = 720;
const LEFT_CONTAINER: ContainerId = ContainerId(0);
const RIGHT_CONTAINER: ContainerId = ContainerId(1);

/// Confetti burst demo
#[derive(Parser)]
#[command(version, about = "Fire confetti bursts in a raylib window or headless.")]
struct Cli {
    /// INI file with a [confetti] section providing default options.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Launch direction in degrees (90 = up).
    #[arg(long, allow_negative_numbers = true)]
    angle: Option<f32>,

    /// Launch angle variance in degrees.
    #[arg(long)]
    spread: Option<f32>,

    /// Base launch speed.
    #[arg(long)]
    start_velocity: Option<f32>,

    /// Fettis per burst.
    #[arg(long)]
    count: Option<i64>,

    /// Burst length in milliseconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Milliseconds between fetti activations.
    #[arg(long)]
    stagger: Option<f64>,

    /// Linear velocity decay per frame.
    #[arg(long)]
    drag_friction: Option<f32>,

    /// Multiplicative velocity decay per frame; overrides drag friction.
    #[arg(long)]
    decay: Option<f32>,

    /// Container perspective, e.g. "600px".
    #[arg(long)]
    perspective: Option<String>,

    /// Seed for reproducible bursts.
    #[arg(long)]
    seed: Option<u64>,

    /// Run with virtual time and an in-memory sink instead of opening a window.
    #[arg(long)]
    headless: bool,

    /// Number of bursts to fire in headless mode.
    #[arg(long, default_value_t = 1)]
    bursts: u32,
}

impl Cli {
    fn flag_options(&self) -> ConfettiOptions {
        ConfettiOptions {
            angle: self.angle,
            spread: self.spread,
            start_velocity: self.start_velocity,
            element_count: self.count,
            duration: self.duration,
            stagger: self.stagger,
            drag_friction: self.drag_friction,
            decay: self.decay,
            perspective: self.perspective.clone(),
            ..ConfettiOptions::default()
        }
    }
}

/// Options for the `index`-th burst, seeded when a seed was given.
fn burst_options(base: &ConfettiOptions, seed: Option<u64>, index: u64) -> ConfettiOptions {
    let mut options = base.clone_settings();
    if let Some(seed) = seed {
        options.random = Some(seeded_random(seed.wrapping_add(index)));
    }
    options
}

/// Start a burst, exiting on invalid options.
fn fire<S: RenderSink>(
    confetti: &mut Confetti<S>,
    container: ContainerId,
    options: ConfettiOptions,
) -> CompletionSignal {
    match confetti.start_confetti(container, options) {
        Ok(signal) => signal,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

/// Drop settled signals, logging their outcome.
fn collect_settled(pending: &mut Vec<CompletionSignal>) {
    pending.retain_mut(|signal| match signal.try_outcome() {
        Some(Ok(())) => {
            log::debug!("Confetti burst finished");
            false
        }
        Some(Err(e)) => {
            log::warn!("Confetti burst failed: {}", e);
            false
        }
        None => true,
    });
}

fn run_headless(cli: &Cli, base: &ConfettiOptions) {
    let mut confetti = Confetti::new(MemorySink::new());
    let mut pending: Vec<CompletionSignal> = (0..cli.bursts as u64)
        .map(|i| {
            let container = if i % 2 == 0 {
                LEFT_CONTAINER
            } else {
                RIGHT_CONTAINER
            };
            fire(&mut confetti, container, burst_options(base, cli.seed, i))
        })
        .collect();

    let frames = confetti.run_until_idle(&mut FixedStepTicks::sixty_hz(0.0));
    collect_settled(&mut pending);

    let stats = confetti.stats();
    let sink = confetti.sink();
    log::info!(
        "Headless run finished after {} frames ({:.0}ms)",
        frames,
        confetti.clock().now
    );
    println!(
        "bursts: {} started, {} completed, {} cancelled, {} failed",
        stats.started, stats.completed, stats.cancelled, stats.failed
    );
    println!(
        "visuals: {} allocated, {} released, {} updates, {} still live",
        sink.allocations,
        sink.releases,
        sink.updates().len(),
        sink.live()
    );
}

fn run_window(cli: &Cli, base: &ConfettiOptions) {
    let (mut rl, thread) = raylib::init()
        .size(WINDOW_WIDTH, WINDOW_HEIGHT)
        .resizable()
        .title("Confetti Burst")
        .build();
    rl.set_target_fps(60);

    let mut confetti = Confetti::new(RaylibSink::new());
    let mut pending: Vec<CompletionSignal> = Vec::new();
    let mut fired: u64 = 0;

    while !rl.window_should_close() {
        // Containers follow the window size
        let (w, h) = (rl.get_screen_width() as f32, rl.get_screen_height() as f32);
        let sink = confetti.sink_mut();
        sink.set_origin(LEFT_CONTAINER, Vector2 { x: w * 0.3, y: h * 0.6 });
        sink.set_origin(RIGHT_CONTAINER, Vector2 { x: w * 0.7, y: h * 0.6 });

        if rl.is_key_pressed(KeyboardKey::KEY_SPACE)
            || rl.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT)
        {
            for container in [LEFT_CONTAINER, RIGHT_CONTAINER] {
                let options = burst_options(base, cli.seed, fired);
                pending.push(fire(&mut confetti, container, options));
                fired += 1;
            }
        }

        confetti.tick(rl.get_time() * 1000.0);
        collect_settled(&mut pending);

        let mut d = rl.begin_drawing(&thread);
        d.clear_background(Color::RAYWHITE);
        render_confetti(&mut d, confetti.sink());
        d.draw_text("SPACE or click: confetti!", 10, 10, 20, Color::DARKGRAY);
        let text = format!("Bursts in flight: {}", pending.len());
        d.draw_text(&text, 10, 36, 10, Color::GRAY);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let file_options = match &cli.config {
        Some(path) => match ConfettiOptions::load_from_file(path) {
            Ok(options) => options,
            Err(e) => {
                eprintln!("Error: {e}");
                std::process::exit(1);
            }
        },
        None => ConfettiOptions::default(),
    };
    let base = file_options.overlay(cli.flag_options());

    if cli.headless {
        run_headless(&cli, &base);
    } else {
        log::info!("Press SPACE or click to fire confetti");
        run_window(&cli, &base);
    }
}
