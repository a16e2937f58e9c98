//! Confetti drawing for the raylib sink.
//!
//! Each visible fetti becomes a rotated rectangle placed at its container's
//! origin, scaled by the container perspective and faded by its opacity.

use raylib::prelude::*;

use crate::resources::raylibsink::{RaylibSink, RaylibVisual};

/// Narrowest on-screen width fraction of a fetti seen edge-on.
const MIN_FLIP: f32 = 0.15;

/// Screen rectangle, pivot and rotation (degrees) of a visible fetti.
pub fn fetti_quad(sink: &RaylibSink, visual: &RaylibVisual) -> Option<(Rectangle, Vector2, f32)> {
    if !visual.visible {
        return None;
    }
    let t = visual.transform?;
    let origin = sink.origin(visual.container);
    let scale = sink.depth_scale(visual.container, t.translate.z);

    // The rotation about (1, 1, 1) is drawn as a screen rotation plus a
    // foreshortened width, which reads as the piece flipping over.
    let flip = t.rotation.cos().abs().max(MIN_FLIP);
    let width = visual.width * scale * flip;
    let height = visual.height * scale;

    Some((
        Rectangle {
            x: origin.x + t.translate.x * scale,
            y: origin.y + t.translate.y * scale,
            width,
            height,
        },
        Vector2 {
            x: width / 2.0,
            y: height / 2.0,
        },
        t.rotation.to_degrees(),
    ))
}

/// Draw every visible fetti of the sink, faded by its opacity.
pub fn render_confetti<D: RaylibDraw>(d: &mut D, sink: &RaylibSink) {
    for visual in sink.visuals() {
        let Some((rect, pivot, degrees)) = fetti_quad(sink, visual) else {
            continue;
        };
        let alpha = (visual.opacity.clamp(0.0, 1.0) * visual.color.a as f32) as u8;
        let color = Color::new(visual.color.r, visual.color.g, visual.color.b, alpha);
        d.draw_rectangle_pro(rect, pivot, degrees, color);
    }
}
