use crate::document::model::ImageDocument;
use crate::foundation::core::{Point, Size, Vec2};

/// Where and how large the base image was actually drawn.
///
/// The base may be letterboxed into a viewport, so this can differ from its stored geometry.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RenderedFrame {
    pub size: Option<Size>,
    pub center: Option<Point>,
}

impl RenderedFrame {
    pub fn new(size: Size, center: Point) -> Self {
        Self {
            size: Some(size),
            center: Some(center),
        }
    }

    /// Fill missing parts from `fallback`.
    pub fn or(self, fallback: RenderedFrame) -> Self {
        Self {
            size: self.size.or(fallback.size),
            center: self.center.or(fallback.center),
        }
    }

    /// Resolve against the base document's own geometry as the last resort.
    fn resolve(self, base: &ImageDocument) -> (Size, Point) {
        (
            self.size.unwrap_or(base.display_size),
            self.center.unwrap_or(base.position),
        )
    }
}

/// World position of the overlay's own anchor.
pub fn overlay_anchor_world(overlay: &ImageDocument) -> Point {
    let size = overlay.display_size.to_vec2();
    let frac = overlay.anchor_point.from_center();
    overlay.position + Vec2::new(size.x * frac.x, size.y * frac.y)
}

/// World position of the base's anchor on its rendered frame.
pub fn base_anchor_world(base: &ImageDocument, observed: RenderedFrame) -> Point {
    let (size, center) = observed.resolve(base);
    let frac = base.anchor_point.from_center();
    center + Vec2::new(size.width * frac.x, size.height * frac.y)
}

/// Offset from the base anchor to the overlay anchor.
///
/// `observed` is resolved part by part: caller-observed values first, then the workbench's cached
/// placement viewport (folded in by the caller with [`RenderedFrame::or`]), then the base's own
/// `position`/`display_size`.
pub fn relative_position(
    base: &ImageDocument,
    overlay: &ImageDocument,
    observed: RenderedFrame,
) -> Vec2 {
    overlay_anchor_world(overlay) - base_anchor_world(base, observed)
}

/// Overlay center that yields `relative` from [`relative_position`].
pub fn position_for_relative(
    base: &ImageDocument,
    overlay: &ImageDocument,
    relative: Vec2,
    observed: RenderedFrame,
) -> Point {
    let target_anchor = base_anchor_world(base, observed) + relative;
    let size = overlay.display_size.to_vec2();
    let frac = overlay.anchor_point.from_center();
    target_anchor - Vec2::new(size.x * frac.x, size.y * frac.y)
}

#[cfg(test)]
#[path = "../../tests/unit/placement/solver.rs"]
mod tests;
