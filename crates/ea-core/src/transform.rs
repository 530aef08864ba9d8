//! Canvas ↔ document coordinate conversion and pan/zoom gesture state.
//!
//! Pixel space has its origin at the top-left of the canvas frame. Document
//! space has its origin at the frame center and is independent of the view:
//!
//! ```text
//! pixel = center + doc * zoom + pan
//! doc   = (pixel - center - pan) / zoom
//! ```

use crate::model::DocPoint;
use kurbo::{Point, Size, Vec2};

// ─── Pure conversions ─────────────────────────────────────────────────────

fn frame_center(frame: Size) -> Point {
    frame.to_rect().center()
}

/// Convert a canvas pixel position to document space, truncating toward zero.
pub fn to_document_space(pixel: Point, frame: Size, pan: Vec2, zoom: f64) -> DocPoint {
    let doc = (pixel - frame_center(frame) - pan) / zoom;
    DocPoint::new(doc.x as i32, doc.y as i32)
}

/// Convert a document position to a canvas pixel position.
pub fn to_pixel_space(doc: DocPoint, frame: Size, pan: Vec2, zoom: f64) -> Point {
    frame_center(frame) + doc.to_vec2() * zoom + pan
}

/// The zoom at which `image` fits entirely inside `frame`.
///
/// `None` if either size has a non-positive dimension.
pub fn fit_to_frame(image: Size, frame: Size) -> Option<f64> {
    if image.width <= 0.0 || image.height <= 0.0 || frame.width <= 0.0 || frame.height <= 0.0 {
        return None;
    }
    Some((frame.width / image.width).min(frame.height / image.height))
}

// ─── View transform ───────────────────────────────────────────────────────

/// Pan and zoom of the canvas, split into committed and in-progress parts.
///
/// Pan offsets are stored in document units and scaled by the current zoom
/// when read, so a drag of N pixels moves the canvas by N pixels at any zoom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    steady_pan: Vec2,
    steady_zoom: f64,
    gesture_pan: Vec2,
    gesture_zoom: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            steady_pan: Vec2::ZERO,
            steady_zoom: 1.0,
            gesture_pan: Vec2::ZERO,
            gesture_zoom: 1.0,
        }
    }
}

impl ViewTransform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Effective zoom: committed zoom times the live pinch.
    pub fn zoom(&self) -> f64 {
        self.steady_zoom * self.gesture_zoom
    }

    /// Effective pan offset in pixels.
    pub fn pan(&self) -> Vec2 {
        (self.steady_pan + self.gesture_pan) * self.zoom()
    }

    pub fn steady_zoom(&self) -> f64 {
        self.steady_zoom
    }

    pub fn is_gesturing(&self) -> bool {
        self.gesture_pan != Vec2::ZERO || self.gesture_zoom != 1.0
    }

    /// Live pinch update. `scale` is relative to the pinch start.
    pub fn update_zoom_gesture(&mut self, scale: f64) {
        if scale > 0.0 {
            self.gesture_zoom = scale;
        }
    }

    /// Pinch finished: fold it into the committed zoom.
    pub fn end_zoom_gesture(&mut self, scale: f64) {
        if scale > 0.0 {
            self.steady_zoom *= scale;
        }
        self.gesture_zoom = 1.0;
    }

    /// Live drag update. `translation` is in pixels since the drag started.
    pub fn update_pan_gesture(&mut self, translation: Vec2) {
        self.gesture_pan = translation / self.zoom();
    }

    /// Drag finished: fold it into the committed pan.
    pub fn end_pan_gesture(&mut self, translation: Vec2) {
        self.steady_pan += translation / self.zoom();
        self.gesture_pan = Vec2::ZERO;
    }

    /// Zoom so `image` fits inside `frame` and recenter.
    ///
    /// Returns `false` and leaves the view untouched if either size is
    /// degenerate.
    pub fn zoom_to_fit(&mut self, image: Size, frame: Size) -> bool {
        let Some(zoom) = fit_to_frame(image, frame) else {
            return false;
        };
        self.steady_pan = Vec2::ZERO;
        self.steady_zoom = zoom;
        true
    }

    pub fn to_document_space(&self, pixel: Point, frame: Size) -> DocPoint {
        to_document_space(pixel, frame, self.pan(), self.zoom())
    }

    pub fn to_pixel_space(&self, doc: DocPoint, frame: Size) -> Point {
        to_pixel_space(doc, frame, self.pan(), self.zoom())
    }

    /// Convert an on-screen drag delta to a document-space delta.
    pub fn to_document_delta(&self, pixels: Vec2) -> Vec2 {
        pixels / self.zoom()
    }

    /// Font size to render a sticker of document size `size` at.
    pub fn sticker_font_size(&self, size: i32) -> f64 {
        f64::from(size) * self.zoom()
    }
}
