use std::sync::Arc;

use crate::foundation::core::{BorderColor, DocId, Point, Size, Vec2};
use crate::foundation::error::{BenchError, BenchResult};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Raster pixels in row-major premultiplied RGBA8, top-left origin.
pub struct RasterImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes, `width * height * 4` long.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl RasterImage {
    /// Wrap existing premultiplied pixels, checking the buffer length.
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> BenchResult<Self> {
        if width == 0 || height == 0 {
            return Err(BenchError::validation("raster width/height must be > 0"));
        }
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| BenchError::validation("raster size overflow"))?;
        if rgba8_premul.len() != expected {
            return Err(BenchError::validation(format!(
                "raster buffer has {} bytes, expected {expected}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    /// Natural size in logical units (one unit per pixel).
    pub fn natural_size(&self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.rgba8_premul.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    pub(crate) fn to_image_buffer(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.rgba8_premul.as_ref().clone())
    }

    pub(crate) fn from_image_buffer(buf: image::RgbaImage) -> BenchResult<Self> {
        let (width, height) = buf.dimensions();
        Self::new(width, height, buf.into_raw())
    }
}

/// How a document's visible frame relates to its image.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Frame {
    /// The frame is the image itself at `display_size`.
    #[default]
    Normal,
    /// Canvas-resize mode: an independently sized frame with the image offset inside it.
    Canvas(CanvasFrame),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasFrame {
    pub size: Size,
    /// Top-left of the image relative to the top-left of the canvas.
    pub offset: Vec2,
}

/// One of the nine symmetric reference points of a frame.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPoint {
    TopLeft,
    Top,
    TopRight,
    Left,
    #[default]
    Center,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl AnchorPoint {
    pub const ALL: [AnchorPoint; 9] = [
        AnchorPoint::TopLeft,
        AnchorPoint::Top,
        AnchorPoint::TopRight,
        AnchorPoint::Left,
        AnchorPoint::Center,
        AnchorPoint::Right,
        AnchorPoint::BottomLeft,
        AnchorPoint::Bottom,
        AnchorPoint::BottomRight,
    ];

    /// Fractional position inside the frame: `(0,0)` top-left, `(1,1)` bottom-right.
    pub fn fraction(self) -> Vec2 {
        match self {
            AnchorPoint::TopLeft => Vec2::new(0.0, 0.0),
            AnchorPoint::Top => Vec2::new(0.5, 0.0),
            AnchorPoint::TopRight => Vec2::new(1.0, 0.0),
            AnchorPoint::Left => Vec2::new(0.0, 0.5),
            AnchorPoint::Center => Vec2::new(0.5, 0.5),
            AnchorPoint::Right => Vec2::new(1.0, 0.5),
            AnchorPoint::BottomLeft => Vec2::new(0.0, 1.0),
            AnchorPoint::Bottom => Vec2::new(0.5, 1.0),
            AnchorPoint::BottomRight => Vec2::new(1.0, 1.0),
        }
    }

    /// Offset from the frame center, as a fraction of the frame size.
    pub fn from_center(self) -> Vec2 {
        self.fraction() - Vec2::new(0.5, 0.5)
    }
}

/// Mirror view flags. Applied when rendering; the stored pixels never change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Flip {
    pub x: bool,
    pub y: bool,
}

impl Flip {
    pub fn any(self) -> bool {
        self.x || self.y
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    Horizontal,
    Vertical,
}

/// Workbench-wide interaction mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    #[default]
    SideBySide,
    Overlay,
    Animation,
    Placement,
}

/// A loaded image plus all the logical state the engine edits.
#[derive(Clone, Debug)]
pub struct ImageDocument {
    id: DocId,
    /// Display name (file name or caller-supplied label).
    pub name: String,
    source: RasterImage,
    original_size: Size,
    /// Logical size used for resizing and rendering; always > 0.
    pub display_size: Size,
    pub frame: Frame,
    /// Frame center in shared workbench coordinates.
    pub position: Point,
    /// In `[0, 1]`.
    pub overlay_opacity: f64,
    pub border_color: BorderColor,
    /// Takes part in animation playback when `true`.
    pub is_visible: bool,
    /// Seconds.
    pub frame_duration: f64,
    /// Timeline order key among visible documents; not necessarily contiguous.
    pub animation_order: i64,
    pub anchor_point: AnchorPoint,
    pub flip: Flip,
}

impl ImageDocument {
    pub(crate) fn new(
        id: DocId,
        name: impl Into<String>,
        source: RasterImage,
        position: Point,
        border_color: BorderColor,
        frame_duration: f64,
        animation_order: i64,
    ) -> Self {
        let size = source.natural_size();
        Self {
            id,
            name: name.into(),
            source,
            original_size: size,
            display_size: size,
            frame: Frame::Normal,
            position,
            overlay_opacity: 1.0,
            border_color,
            is_visible: true,
            frame_duration,
            animation_order,
            anchor_point: AnchorPoint::Center,
            flip: Flip::default(),
        }
    }

    pub fn id(&self) -> DocId {
        self.id
    }

    /// Current pixel buffer. Replaced only by a successful bake.
    pub fn source(&self) -> &RasterImage {
        &self.source
    }

    /// Natural size captured at load time; never changes.
    pub fn original_size(&self) -> Size {
        self.original_size
    }

    /// Width over height of the current source buffer.
    ///
    /// Equal to the load-time ratio until a bake installs a new buffer, which is a different
    /// logical image with its own ratio.
    pub fn aspect_ratio(&self) -> f64 {
        let size = self.source.natural_size();
        size.width / size.height
    }

    pub fn canvas_frame(&self) -> Option<CanvasFrame> {
        match self.frame {
            Frame::Normal => None,
            Frame::Canvas(c) => Some(c),
        }
    }

    pub fn canvas_size(&self) -> Option<Size> {
        self.canvas_frame().map(|c| c.size)
    }

    pub fn image_offset(&self) -> Vec2 {
        self.canvas_frame().map_or(Vec2::ZERO, |c| c.offset)
    }

    /// Size of the visible frame: the canvas while one exists, else the display size.
    pub fn frame_size(&self) -> Size {
        self.canvas_size().unwrap_or(self.display_size)
    }

    /// `true` once any user-visible property departs from its freshly loaded state.
    pub fn is_modified(&self, default_position: Point) -> bool {
        let size_changed = (self.display_size.width - self.original_size.width).abs() > 0.1
            || (self.display_size.height - self.original_size.height).abs() > 0.1;
        let moved = (self.position.x - default_position.x).abs() > 1.0
            || (self.position.y - default_position.y).abs() > 1.0;
        let faded = (self.overlay_opacity - 1.0).abs() > 0.01;
        size_changed || moved || faded || self.canvas_frame().is_some() || self.flip.any()
    }

    pub(crate) fn replace_source(&mut self, source: RasterImage) {
        self.source = source;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/model.rs"]
mod tests;
