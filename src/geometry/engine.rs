//! Size and position math for the three resize gestures.
//!
//! All functions clamp instead of failing: there is no input that makes them panic or leave a
//! dimension at or below zero.

use crate::document::model::{CanvasFrame, Frame, ImageDocument};
use crate::foundation::core::{Size, Vec2};

/// Floor for numeric resizes.
pub const MIN_DIMENSION: f64 = 1.0;
/// Floor for drag resizes (corners and canvas edges).
pub const MIN_DRAG_DIMENSION: f64 = 50.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    /// Sign applied to each delta component when growing from this corner.
    fn signs(self) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::new(-1.0, -1.0),
            Corner::TopRight => Vec2::new(1.0, -1.0),
            Corner::BottomLeft => Vec2::new(-1.0, 1.0),
            Corner::BottomRight => Vec2::new(1.0, 1.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

/// Set the display size from a width or a height.
///
/// With `keep_aspect` only one side is authoritative (width wins when both are given) and the
/// other is derived from the document's aspect ratio. Without it each given side is applied
/// on its own. Non-finite inputs are ignored.
pub fn resize(doc: &mut ImageDocument, width: Option<f64>, height: Option<f64>, keep_aspect: bool) {
    let width = width.filter(|w| w.is_finite());
    let height = height.filter(|h| h.is_finite());
    let aspect = doc.aspect_ratio();

    if keep_aspect {
        let size = match (width, height) {
            (Some(w), _) => Size::new(w, w / aspect),
            (None, Some(h)) => Size::new(h * aspect, h),
            (None, None) => return,
        };
        doc.display_size = Size::new(
            size.width.max(MIN_DIMENSION),
            size.height.max(MIN_DIMENSION),
        );
        return;
    }

    if let Some(w) = width {
        doc.display_size.width = w.max(MIN_DIMENSION);
    }
    if let Some(h) = height {
        doc.display_size.height = h.max(MIN_DIMENSION);
    }
}

/// Grow or shrink the display size by dragging one corner.
pub fn corner_resize(doc: &mut ImageDocument, corner: Corner, delta: Vec2, keep_aspect: bool) {
    if !(delta.x.is_finite() && delta.y.is_finite()) {
        return;
    }
    let signs = corner.signs();
    let mut w = (doc.display_size.width + signs.x * delta.x).max(MIN_DRAG_DIMENSION);
    let mut h = (doc.display_size.height + signs.y * delta.y).max(MIN_DRAG_DIMENSION);

    let aspect = doc.aspect_ratio();
    if keep_aspect && aspect.is_finite() && aspect > 0.0 {
        if w / h > aspect {
            w = h * aspect;
        } else {
            h = w / aspect;
        }
        // Re-establish the floor along the ratio rather than breaking it.
        if w < MIN_DRAG_DIMENSION {
            w = MIN_DRAG_DIMENSION;
            h = w / aspect;
        }
        if h < MIN_DRAG_DIMENSION {
            h = MIN_DRAG_DIMENSION;
            w = h * aspect;
        }
    }

    doc.display_size = Size::new(w, h);
}

/// Move one canvas edge, growing or shrinking the frame around a stationary image.
///
/// The first call turns a normal frame into a canvas frame of the current display size.
/// Returns the delta actually applied after the floor clamp, in the same convention as
/// `delta`; position and image offset always follow this value, never the requested one.
pub fn edge_resize(doc: &mut ImageDocument, edge: Edge, delta: Vec2) -> Vec2 {
    let mut canvas = match doc.frame {
        Frame::Canvas(c) => c,
        Frame::Normal => CanvasFrame {
            size: doc.display_size,
            offset: Vec2::ZERO,
        },
    };
    if !(delta.x.is_finite() && delta.y.is_finite()) {
        doc.frame = Frame::Canvas(canvas);
        return Vec2::ZERO;
    }

    let applied = match edge {
        Edge::Top => {
            let h = (canvas.size.height - delta.y).max(MIN_DRAG_DIMENSION);
            let dy = canvas.size.height - h;
            canvas.size.height = h;
            canvas.offset.y -= dy;
            Vec2::new(0.0, dy)
        }
        Edge::Left => {
            let w = (canvas.size.width - delta.x).max(MIN_DRAG_DIMENSION);
            let dx = canvas.size.width - w;
            canvas.size.width = w;
            canvas.offset.x -= dx;
            Vec2::new(dx, 0.0)
        }
        Edge::Bottom => {
            let h = (canvas.size.height + delta.y).max(MIN_DRAG_DIMENSION);
            let dy = h - canvas.size.height;
            canvas.size.height = h;
            Vec2::new(0.0, dy)
        }
        Edge::Right => {
            let w = (canvas.size.width + delta.x).max(MIN_DRAG_DIMENSION);
            let dx = w - canvas.size.width;
            canvas.size.width = w;
            Vec2::new(dx, 0.0)
        }
    };

    // The frame grows about its center, so the center follows half of the edge movement.
    doc.position += applied * 0.5;
    doc.frame = Frame::Canvas(canvas);
    applied
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/engine.rs"]
mod tests;
