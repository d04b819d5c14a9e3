use std::io::Cursor;

use anyhow::Context;

use crate::document::model::RasterImage;
use crate::foundation::error::{BenchError, BenchResult};
use crate::foundation::math::{premultiply_rgba8_in_place, unpremultiply_rgba8_in_place};

/// Encodings the workbench can export.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Bmp,
    Tiff,
}

impl ExportFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "tif" | "tiff" => Some(Self::Tiff),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Tiff => "tiff",
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Bmp => image::ImageFormat::Bmp,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

/// Turns encoded bytes into premultiplied pixels and back. The engine never touches file formats
/// any other way.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> BenchResult<RasterImage>;

    /// `quality` is 1..=100 and only meaningful for lossy formats.
    fn encode(
        &self,
        image: &RasterImage,
        format: ExportFormat,
        quality: Option<u8>,
    ) -> BenchResult<Vec<u8>>;
}

/// Codec backed by the `image` crate.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCodec;

const DEFAULT_JPEG_QUALITY: u8 = 90;

impl ImageCodec for DefaultCodec {
    fn decode(&self, bytes: &[u8]) -> BenchResult<RasterImage> {
        let dyn_img = image::load_from_memory(bytes)
            .map_err(|e| BenchError::decode(format!("decode image from memory: {e}")))?;
        let rgba = dyn_img.to_rgba8();
        let (width, height) = rgba.dimensions();

        let mut rgba8_premul = rgba.into_raw();
        premultiply_rgba8_in_place(&mut rgba8_premul);
        RasterImage::new(width, height, rgba8_premul)
    }

    fn encode(
        &self,
        image: &RasterImage,
        format: ExportFormat,
        quality: Option<u8>,
    ) -> BenchResult<Vec<u8>> {
        let mut straight = image.rgba8_premul.as_ref().clone();
        unpremultiply_rgba8_in_place(&mut straight);
        let buf = image::RgbaImage::from_raw(image.width, image.height, straight)
            .ok_or_else(|| BenchError::encode("raster buffer does not match its dimensions"))?;

        let mut out = Cursor::new(Vec::new());
        match format {
            ExportFormat::Jpeg => {
                let rgb = image::DynamicImage::ImageRgba8(buf).to_rgb8();
                let q = quality.unwrap_or(DEFAULT_JPEG_QUALITY).clamp(1, 100);
                let mut enc = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, q);
                enc.encode_image(&rgb)
                    .map_err(|e| BenchError::encode(format!("encode jpeg: {e}")))?;
            }
            _ => {
                image::DynamicImage::ImageRgba8(buf)
                    .write_to(&mut out, format.image_format())
                    .with_context(|| format!("encode {}", format.extension()))
                    .map_err(|e| BenchError::encode(format!("{e:#}")))?;
            }
        }
        Ok(out.into_inner())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/codec.rs"]
mod tests;
