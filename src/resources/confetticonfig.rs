//! Confetti burst options and their resolved configuration.
//!
//! Callers describe a burst with [`ConfettiOptions`], where every field is
//! optional. Before a burst starts, the options go through
//! [`migrate_legacy_options`] and are then merged over the defaults below into
//! a validated [`ConfettiConfig`].
//!
//! # Defaults
//!
//! | option          | default |
//! |-----------------|---------|
//! | `angle`         | 90 degrees |
//! | `spread`        | 45 degrees |
//! | `startVelocity` | 45 |
//! | `elementCount`  | 50 |
//! | `width`         | `"10px"` |
//! | `height`        | `"10px"` |
//! | `perspective`   | `""` |
//! | `colors`        | `#a17fb9 #5ec2de #ef3e4c #54c26f #efac1f` |
//! | `duration`      | 3000 ms |
//! | `stagger`       | 0 ms |
//! | `dragFriction`  | 0.1 |
//! | `decay`         | unset (drag friction applies) |
//! | `random`        | a fresh [`fastrand::Rng`] |
//!
//! # JSON
//!
//! ```json
//! { "angle": 90, "spread": 180, "startVelocity": 40, "elementCount": 50, "decay": 0.7 }
//! ```
//!
//! # INI
//!
//! ```ini
//! [confetti]
//! angle = 90
//! spread = 180
//! start_velocity = 40
//! element_count = 50
//! decay = 0.7
//! colors = #a17fb9, #5ec2de
//! ```

use std::path::Path;

use configparser::ini::Ini;
use log::info;
use serde::Deserialize;

use crate::error::ConfettiError;

const DEFAULT_ANGLE: f32 = 90.0;
const DEFAULT_SPREAD: f32 = 45.0;
const DEFAULT_START_VELOCITY: f32 = 45.0;
const DEFAULT_ELEMENT_COUNT: i64 = 50;
const DEFAULT_WIDTH: &str = "10px";
const DEFAULT_HEIGHT: &str = "10px";
const DEFAULT_PERSPECTIVE: &str = "";
const DEFAULT_DURATION: f64 = 3000.0;
const DEFAULT_STAGGER: f64 = 0.0;
const DEFAULT_DRAG_FRICTION: f32 = 0.1;
pub const DEFAULT_COLORS: [&str; 5] = ["#a17fb9", "#5ec2de", "#ef3e4c", "#54c26f", "#efac1f"];

/// Latest option schema. Version 1 accepted `delay` where version 2 uses `stagger`.
pub const OPTIONS_SCHEMA_VERSION: u32 = 2;

const INI_SECTION: &str = "confetti";

/// Injectable uniform randomness source returning values in `[0, 1)`.
pub type RandomFn = Box<dyn FnMut() -> f32 + Send + Sync>;

/// Build the default randomness source.
pub fn default_random() -> RandomFn {
    let mut rng = fastrand::Rng::new();
    Box::new(move || rng.f32())
}

/// Build a reproducible randomness source from a seed.
pub fn seeded_random(seed: u64) -> RandomFn {
    let mut rng = fastrand::Rng::with_seed(seed);
    Box::new(move || rng.f32())
}

/// Caller-facing burst options. Unset fields fall back to the defaults.
#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfettiOptions {
    pub angle: Option<f32>,
    pub spread: Option<f32>,
    pub start_velocity: Option<f32>,
    pub element_count: Option<i64>,
    pub width: Option<String>,
    pub height: Option<String>,
    pub perspective: Option<String>,
    pub colors: Option<Vec<String>>,
    pub duration: Option<f64>,
    pub stagger: Option<f64>,
    pub drag_friction: Option<f32>,
    pub decay: Option<f32>,
    /// Legacy name of `stagger`, see [`migrate_legacy_options`].
    pub delay: Option<f64>,
    #[serde(skip)]
    pub random: Option<RandomFn>,
}

impl ConfettiOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON object using the camelCase option names.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load options from the `[confetti]` section of an INI file.
    ///
    /// Keys use snake_case (`start_velocity`, `element_count`, ...). Missing
    /// keys stay unset. `colors` is a comma separated list.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, String> {
        let path = path.as_ref();
        // '#' starts hex colors here, so only ';' comments are recognized
        let mut defaults = Ini::new().defaults();
        defaults.comment_symbols = vec![';'];
        let mut ini = Ini::new_from_defaults(defaults);
        ini.load(path)
            .map_err(|e| format!("Failed to load confetti config file: {}", e))?;

        let float = |key: &str| ini.getfloat(INI_SECTION, key).ok().flatten();
        let text = |key: &str| ini.get(INI_SECTION, key);

        let options = Self {
            angle: float("angle").map(|v| v as f32),
            spread: float("spread").map(|v| v as f32),
            start_velocity: float("start_velocity").map(|v| v as f32),
            element_count: ini.getint(INI_SECTION, "element_count").ok().flatten(),
            width: text("width"),
            height: text("height"),
            perspective: text("perspective"),
            colors: text("colors").map(|list| {
                list.split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect()
            }),
            duration: float("duration"),
            stagger: float("stagger"),
            drag_friction: float("drag_friction").map(|v| v as f32),
            decay: float("decay").map(|v| v as f32),
            delay: float("delay"),
            random: None,
        };

        info!("Loaded confetti options from {}", path.display());
        Ok(options)
    }

    pub fn with_angle(mut self, angle: f32) -> Self {
        self.angle = Some(angle);
        self
    }
    pub fn with_spread(mut self, spread: f32) -> Self {
        self.spread = Some(spread);
        self
    }
    pub fn with_start_velocity(mut self, start_velocity: f32) -> Self {
        self.start_velocity = Some(start_velocity);
        self
    }
    pub fn with_element_count(mut self, count: i64) -> Self {
        self.element_count = Some(count);
        self
    }
    pub fn with_size(mut self, width: impl Into<String>, height: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self.height = Some(height.into());
        self
    }
    pub fn with_perspective(mut self, perspective: impl Into<String>) -> Self {
        self.perspective = Some(perspective.into());
        self
    }
    pub fn with_colors<I, C>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.colors = Some(colors.into_iter().map(Into::into).collect());
        self
    }
    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.duration = Some(duration_ms);
        self
    }
    pub fn with_stagger(mut self, stagger_ms: f64) -> Self {
        self.stagger = Some(stagger_ms);
        self
    }
    pub fn with_drag_friction(mut self, drag_friction: f32) -> Self {
        self.drag_friction = Some(drag_friction);
        self
    }
    pub fn with_decay(mut self, decay: f32) -> Self {
        self.decay = Some(decay);
        self
    }
    pub fn with_random(mut self, random: impl FnMut() -> f32 + Send + Sync + 'static) -> Self {
        self.random = Some(Box::new(random));
        self
    }

    /// Copy every option except the randomness source, which cannot be cloned.
    pub fn clone_settings(&self) -> Self {
        Self {
            angle: self.angle,
            spread: self.spread,
            start_velocity: self.start_velocity,
            element_count: self.element_count,
            width: self.width.clone(),
            height: self.height.clone(),
            perspective: self.perspective.clone(),
            colors: self.colors.clone(),
            duration: self.duration,
            stagger: self.stagger,
            drag_friction: self.drag_friction,
            decay: self.decay,
            delay: self.delay,
            random: None,
        }
    }

    /// Overlay every option set in `other` on top of `self`.
    ///
    /// Used to layer CLI flags over an INI file.
    pub fn overlay(self, other: ConfettiOptions) -> Self {
        Self {
            angle: other.angle.or(self.angle),
            spread: other.spread.or(self.spread),
            start_velocity: other.start_velocity.or(self.start_velocity),
            element_count: other.element_count.or(self.element_count),
            width: other.width.or(self.width),
            height: other.height.or(self.height),
            perspective: other.perspective.or(self.perspective),
            colors: other.colors.or(self.colors),
            duration: other.duration.or(self.duration),
            stagger: other.stagger.or(self.stagger),
            drag_friction: other.drag_friction.or(self.drag_friction),
            decay: other.decay.or(self.decay),
            delay: other.delay.or(self.delay),
            random: other.random.or(self.random),
        }
    }
}

/// Upgrade options written against an older schema to [`OPTIONS_SCHEMA_VERSION`].
///
/// A legacy `delay` becomes `stagger` when `stagger` is absent. An explicit
/// `stagger` always wins. `delay` is cleared either way.
pub fn migrate_legacy_options(mut options: ConfettiOptions) -> ConfettiOptions {
    if let Some(delay) = options.delay.take() {
        if options.stagger.is_none() {
            options.stagger = Some(delay);
        }
    }
    options
}

/// Velocity damping policy, fixed for the lifetime of a burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Damping {
    /// `velocity *= factor`
    Decay(f32),
    /// `velocity -= velocity * friction`
    Drag(f32),
}

impl Damping {
    /// Pick the policy for a burst.
    ///
    /// A configured, non-zero `decay` selects [`Damping::Decay`]; an unset or
    /// zero `decay` falls back to drag friction.
    pub fn resolve(decay: Option<f32>, drag_friction: f32) -> Self {
        match decay {
            Some(factor) if factor != 0.0 => Damping::Decay(factor),
            _ => Damping::Drag(drag_friction),
        }
    }
}

/// Fully resolved and validated burst configuration.
pub struct ConfettiConfig {
    pub angle: f32,
    pub spread: f32,
    pub start_velocity: f32,
    pub element_count: usize,
    pub width: String,
    pub height: String,
    pub perspective: String,
    pub colors: Vec<String>,
    pub duration: f64,
    pub stagger: f64,
    pub damping: Damping,
    pub random: RandomFn,
}

impl ConfettiConfig {
    /// Migrate, merge over the defaults and validate.
    pub fn resolve(options: ConfettiOptions) -> Result<Self, ConfettiError> {
        let options = migrate_legacy_options(options);

        let element_count = options.element_count.unwrap_or(DEFAULT_ELEMENT_COUNT);
        if element_count < 0 {
            return Err(ConfettiError::InvalidConfig(format!(
                "elementCount must not be negative, got {element_count}"
            )));
        }
        let duration = options.duration.unwrap_or(DEFAULT_DURATION);
        if !duration.is_finite() || duration < 0.0 {
            return Err(ConfettiError::InvalidConfig(format!(
                "duration must be a finite, non-negative number of milliseconds, got {duration}"
            )));
        }
        let stagger = options.stagger.unwrap_or(DEFAULT_STAGGER);
        if !stagger.is_finite() || stagger < 0.0 {
            return Err(ConfettiError::InvalidConfig(format!(
                "stagger must be a finite, non-negative number of milliseconds, got {stagger}"
            )));
        }
        let colors = options
            .colors
            .unwrap_or_else(|| DEFAULT_COLORS.iter().map(|c| c.to_string()).collect());
        if colors.is_empty() && element_count > 0 {
            return Err(ConfettiError::InvalidConfig(
                "colors must contain at least one entry".to_string(),
            ));
        }

        Ok(Self {
            angle: options.angle.unwrap_or(DEFAULT_ANGLE),
            spread: options.spread.unwrap_or(DEFAULT_SPREAD),
            start_velocity: options.start_velocity.unwrap_or(DEFAULT_START_VELOCITY),
            element_count: element_count as usize,
            width: options.width.unwrap_or_else(|| DEFAULT_WIDTH.to_string()),
            height: options.height.unwrap_or_else(|| DEFAULT_HEIGHT.to_string()),
            perspective: options
                .perspective
                .unwrap_or_else(|| DEFAULT_PERSPECTIVE.to_string()),
            colors,
            duration,
            stagger,
            damping: Damping::resolve(
                options.decay,
                options.drag_friction.unwrap_or(DEFAULT_DRAG_FRICTION),
            ),
            random: options.random.unwrap_or_else(default_random),
        })
    }

    /// Color for the fetti at `index`, cycling through the palette.
    pub fn color_for(&self, index: usize) -> &str {
        &self.colors[index % self.colors.len()]
    }
}
