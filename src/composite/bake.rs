use std::borrow::Cow;

use rayon::prelude::*;

use crate::composite::blend::over_row_at;
use crate::document::model::{CanvasFrame, Flip, Frame, ImageDocument, RasterImage};
use crate::foundation::core::{DocId, Size, Vec2};
use crate::foundation::error::{BenchError, BenchResult};

/// Resampling kernel used when the image is drawn at a size other than its natural one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    Triangle,
    CatmullRom,
    Gaussian,
    #[default]
    Lanczos3,
}

impl From<ResampleFilter> for image::imageops::FilterType {
    fn from(value: ResampleFilter) -> Self {
        match value {
            ResampleFilter::Nearest => image::imageops::FilterType::Nearest,
            ResampleFilter::Triangle => image::imageops::FilterType::Triangle,
            ResampleFilter::CatmullRom => image::imageops::FilterType::CatmullRom,
            ResampleFilter::Gaussian => image::imageops::FilterType::Gaussian,
            ResampleFilter::Lanczos3 => image::imageops::FilterType::Lanczos3,
        }
    }
}

/// Raster limits for compositing.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CompositorOpts {
    /// Largest width or height, in pixels, the compositor will allocate.
    pub max_dimension: u32,
    pub filter: ResampleFilter,
}

impl Default for CompositorOpts {
    fn default() -> Self {
        Self {
            max_dimension: 16_384,
            filter: ResampleFilter::default(),
        }
    }
}

/// Everything needed to bake one document, detached from the document so it can run elsewhere.
///
/// Construction requires a [`CanvasFrame`], so a job only exists when there is something to bake.
#[derive(Clone, Debug)]
pub struct BakeJob {
    doc: DocId,
    source: RasterImage,
    display_size: Size,
    canvas: CanvasFrame,
    opts: CompositorOpts,
}

/// Result of running a [`BakeJob`], applied back onto the document with [`apply_bake`].
#[derive(Clone, Debug)]
pub struct BakeOutcome {
    pub doc: DocId,
    /// Display size the job composited at.
    pub display_size: Size,
    /// Canvas frame the job composited into.
    pub canvas: CanvasFrame,
    /// `None` when compositing failed and only the size should change.
    pub pixels: Option<RasterImage>,
}

impl BakeOutcome {
    /// `true` while `doc` still has the geometry this outcome was composited from.
    pub fn is_current_for(&self, doc: &ImageDocument) -> bool {
        doc.id() == self.doc
            && doc.frame == Frame::Canvas(self.canvas)
            && doc.display_size == self.display_size
    }
}

impl BakeJob {
    pub fn new(doc: &ImageDocument, opts: CompositorOpts) -> Option<Self> {
        let Frame::Canvas(canvas) = doc.frame else {
            return None;
        };
        Some(Self {
            doc: doc.id(),
            source: doc.source().clone(),
            display_size: doc.display_size,
            canvas,
            opts,
        })
    }

    pub fn doc(&self) -> DocId {
        self.doc
    }

    /// Composite the image into a fresh canvas-sized buffer. Never fails; a compositing error
    /// produces a size-only outcome.
    pub fn run(&self) -> BakeOutcome {
        let pixels = match composite_into_frame(
            &self.source,
            self.display_size,
            self.canvas.size,
            self.canvas.offset,
            &self.opts,
        ) {
            Ok(p) => Some(p),
            Err(e) => {
                tracing::warn!(
                    doc = %self.doc,
                    error = %e,
                    "bake could not composite; keeping pixels and updating size only"
                );
                None
            }
        };
        BakeOutcome {
            doc: self.doc,
            display_size: self.display_size,
            canvas: self.canvas,
            pixels,
        }
    }
}

/// Install a bake outcome: new pixels when present, display size from the canvas, normal frame.
pub fn apply_bake(doc: &mut ImageDocument, outcome: BakeOutcome) {
    if let Some(pixels) = outcome.pixels {
        doc.replace_source(pixels);
    }
    doc.display_size = outcome.canvas.size;
    doc.frame = Frame::Normal;
}

/// Destructively rasterize a document's canvas frame into its pixel buffer.
///
/// Returns `false` and changes nothing when the document has no canvas frame.
pub fn bake(doc: &mut ImageDocument, opts: &CompositorOpts) -> bool {
    let Some(job) = BakeJob::new(doc, *opts) else {
        return false;
    };
    let outcome = job.run();
    apply_bake(doc, outcome);
    true
}

/// Pixels a document currently shows: flip view applied, scaled to its display size and, while a
/// canvas frame exists, placed inside it. The document is not modified.
pub fn render_view(doc: &ImageDocument, opts: &CompositorOpts) -> BenchResult<RasterImage> {
    let source = flip_view(doc.source(), doc.flip)?;
    composite_into_frame(
        &source,
        doc.display_size,
        doc.frame_size(),
        doc.image_offset(),
        opts,
    )
}

/// Mirrored copy of `src`; borrows when no flip is set.
pub fn flip_view(src: &RasterImage, flip: Flip) -> BenchResult<Cow<'_, RasterImage>> {
    if !flip.any() {
        return Ok(Cow::Borrowed(src));
    }
    let mut buf = src
        .to_image_buffer()
        .ok_or_else(|| BenchError::validation("raster buffer does not match its dimensions"))?;
    if flip.x {
        image::imageops::flip_horizontal_in_place(&mut buf);
    }
    if flip.y {
        image::imageops::flip_vertical_in_place(&mut buf);
    }
    RasterImage::from_image_buffer(buf).map(Cow::Owned)
}

/// Draw `source` scaled to `display` at `offset` inside a transparent `frame`-sized buffer.
///
/// `offset` is measured from the top-left corner, which is also the buffer's row origin.
fn composite_into_frame(
    source: &RasterImage,
    display: Size,
    frame: Size,
    offset: Vec2,
    opts: &CompositorOpts,
) -> BenchResult<RasterImage> {
    let (fw, fh) = pixel_dims(frame, opts)?;
    let (dw, dh) = pixel_dims(display, opts)?;
    let scaled = scale_to(source, dw, dh, opts)?;

    let stride = (fw as usize) * 4;
    let len = stride
        .checked_mul(fh as usize)
        .ok_or_else(|| BenchError::validation("frame buffer size overflow"))?;
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|e| BenchError::validation(format!("allocate {fw}x{fh} frame: {e}")))?;
    out.resize(len, 0u8);

    let ox = offset.x.round() as i64;
    let oy = offset.y.round() as i64;
    let src_stride = (scaled.width as usize) * 4;
    let src_rows = scaled.height as i64;

    out.par_chunks_mut(stride)
        .enumerate()
        .try_for_each(|(y, row)| {
            let sy = y as i64 - oy;
            if sy < 0 || sy >= src_rows {
                return Ok(());
            }
            let start = (sy as usize) * src_stride;
            over_row_at(
                row,
                &scaled.rgba8_premul[start..start + src_stride],
                ox,
                1.0,
            )
        })?;

    RasterImage::new(fw, fh, out)
}

fn scale_to<'a>(
    source: &'a RasterImage,
    width: u32,
    height: u32,
    opts: &CompositorOpts,
) -> BenchResult<Cow<'a, RasterImage>> {
    if source.width == width && source.height == height {
        return Ok(Cow::Borrowed(source));
    }
    let buf = source
        .to_image_buffer()
        .ok_or_else(|| BenchError::validation("raster buffer does not match its dimensions"))?;
    // Premultiplied input keeps the kernel from bleeding color out of transparent pixels.
    let resized = image::imageops::resize(&buf, width, height, opts.filter.into());
    RasterImage::from_image_buffer(resized).map(Cow::Owned)
}

fn pixel_dims(size: Size, opts: &CompositorOpts) -> BenchResult<(u32, u32)> {
    let to_px = |v: f64| -> BenchResult<u32> {
        if !v.is_finite() {
            return Err(BenchError::validation("non-finite frame dimension"));
        }
        let px = v.round().max(1.0);
        if px > f64::from(opts.max_dimension) {
            return Err(BenchError::validation(format!(
                "dimension {px} exceeds compositor limit {}",
                opts.max_dimension
            )));
        }
        Ok(px as u32)
    };
    Ok((to_px(size.width)?, to_px(size.height)?))
}

#[cfg(test)]
#[path = "../../tests/unit/composite/bake.rs"]
mod tests;
