//! Raylib render sink.
//!
//! [`RaylibSink`] keeps the state the raylib renderer needs for every fetti
//! visual: parsed color and size, latest transform, opacity and visibility.
//! Drawing happens in [`crate::systems::render::render_confetti`], inside the
//! host's raylib drawing scope.
//!
//! Each container has a screen-space origin (where its fettis launch from) and
//! an optional perspective distance parsed from CSS-like strings (`"600px"`).

use raylib::prelude::{Color, Vector2};
use rustc_hash::FxHashMap;

use crate::error::SinkError;
use crate::resources::rendersink::{
    ContainerId, FettiStyle, FettiTransform, RenderSink, VisualHandle,
};

/// Fallback size when a style value cannot be parsed.
const DEFAULT_SIZE: f32 = 10.0;

/// Parse `#rrggbb` or `#rrggbbaa` into a raylib color.
pub fn parse_hex_color(text: &str) -> Option<Color> {
    let hex = text.trim().trim_start_matches('#');
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        6 => Some(Color::new(channel(0)?, channel(2)?, channel(4)?, 255)),
        8 => Some(Color::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

/// Parse a CSS-like length (`"10px"`, `"12.5"`) into pixels.
pub fn parse_length(text: &str) -> Option<f32> {
    text.trim().trim_end_matches("px").trim().parse().ok()
}

#[derive(Debug, Clone)]
pub struct RaylibVisual {
    pub container: ContainerId,
    pub color: Color,
    pub width: f32,
    pub height: f32,
    pub transform: Option<FettiTransform>,
    pub opacity: f32,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy)]
struct RaylibContainer {
    origin: Vector2,
    perspective: Option<f32>,
}

impl Default for RaylibContainer {
    fn default() -> Self {
        RaylibContainer {
            origin: Vector2 { x: 0.0, y: 0.0 },
            perspective: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct RaylibSink {
    next_handle: u64,
    containers: FxHashMap<ContainerId, RaylibContainer>,
    visuals: FxHashMap<VisualHandle, RaylibVisual>,
}

impl RaylibSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place a container's launch point on screen.
    pub fn set_origin(&mut self, container: ContainerId, origin: Vector2) {
        self.containers.entry(container).or_default().origin = origin;
    }

    pub fn origin(&self, container: ContainerId) -> Vector2 {
        self.containers
            .get(&container)
            .map(|c| c.origin)
            .unwrap_or(Vector2 { x: 0.0, y: 0.0 })
    }

    /// Scale factor for a point at depth `z` seen through the container's perspective.
    ///
    /// Without a perspective the projection is flat (factor 1).
    pub fn depth_scale(&self, container: ContainerId, z: f32) -> f32 {
        match self.containers.get(&container).and_then(|c| c.perspective) {
            Some(p) if p > 0.0 => {
                // Keep points from crossing the eye plane
                let z = z.min(p * 0.9);
                p / (p - z)
            }
            _ => 1.0,
        }
    }

    pub fn visuals(&self) -> impl Iterator<Item = &RaylibVisual> {
        self.visuals.values()
    }

    pub fn len(&self) -> usize {
        self.visuals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visuals.is_empty()
    }
}

impl RenderSink for RaylibSink {
    fn set_perspective(
        &mut self,
        container: ContainerId,
        perspective: &str,
    ) -> Result<(), SinkError> {
        self.containers.entry(container).or_default().perspective = parse_length(perspective);
        Ok(())
    }

    fn allocate(
        &mut self,
        container: ContainerId,
        style: &FettiStyle,
    ) -> Result<VisualHandle, SinkError> {
        let color = parse_hex_color(&style.color)
            .ok_or_else(|| SinkError::Backend(format!("unsupported color '{}'", style.color)))?;
        let handle = VisualHandle(self.next_handle);
        self.next_handle += 1;
        self.containers.entry(container).or_default();
        self.visuals.insert(
            handle,
            RaylibVisual {
                container,
                color,
                width: parse_length(&style.width).unwrap_or(DEFAULT_SIZE),
                height: parse_length(&style.height).unwrap_or(DEFAULT_SIZE),
                transform: None,
                opacity: 1.0,
                visible: false,
            },
        );
        Ok(handle)
    }

    fn update(
        &mut self,
        handle: VisualHandle,
        transform: &FettiTransform,
        opacity: f32,
        visible: bool,
    ) -> Result<(), SinkError> {
        let visual = self
            .visuals
            .get_mut(&handle)
            .ok_or(SinkError::UnknownHandle(handle))?;
        visual.transform = Some(*transform);
        visual.opacity = opacity;
        visual.visible = visible;
        Ok(())
    }

    fn contains(&self, container: ContainerId, handle: VisualHandle) -> bool {
        self.visuals
            .get(&handle)
            .is_some_and(|v| v.container == container)
    }

    fn release(&mut self, container: ContainerId, handle: VisualHandle) -> Result<(), SinkError> {
        if !self.contains(container, handle) {
            return Err(SinkError::UnknownHandle(handle));
        }
        self.visuals.remove(&handle);
        Ok(())
    }
}
