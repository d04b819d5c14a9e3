use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::Context;
use rayon::prelude::*;

use crate::assets::codec::ImageCodec;
use crate::document::model::RasterImage;
use crate::foundation::error::BenchResult;

/// One image handed to the workbench by a picker or a drop.
#[derive(Clone, Debug)]
pub enum ImageSource {
    /// Already-read bytes with a display name.
    Bytes { name: String, bytes: Vec<u8> },
    /// A file to read.
    Path(PathBuf),
}

impl ImageSource {
    pub fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self::Bytes {
            name: name.into(),
            bytes,
        }
    }

    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Display name: the given name, or the file name of a path.
    pub fn name(&self) -> String {
        match self {
            Self::Bytes { name, .. } => name.clone(),
            Self::Path(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| p.display().to_string()),
        }
    }

    pub fn read(&self) -> BenchResult<Cow<'_, [u8]>> {
        match self {
            Self::Bytes { bytes, .. } => Ok(Cow::Borrowed(bytes.as_slice())),
            Self::Path(p) => {
                let bytes =
                    std::fs::read(p).with_context(|| format!("read image '{}'", p.display()))?;
                Ok(Cow::Owned(bytes))
            }
        }
    }
}

#[derive(Clone, Debug)]
pub struct DecodedSource {
    pub name: String,
    pub image: RasterImage,
}

/// Read and decode every source in parallel, returning successes in input order.
///
/// Sources that cannot be read or decoded are logged and skipped.
pub fn decode_sources(sources: &[ImageSource], codec: &dyn ImageCodec) -> Vec<DecodedSource> {
    sources
        .par_iter()
        .map(|src| {
            let name = src.name();
            match src.read().and_then(|bytes| codec.decode(&bytes)) {
                Ok(image) => Some(DecodedSource { name, image }),
                Err(e) => {
                    tracing::warn!(source = %name, error = %e, "skipping undecodable image");
                    None
                }
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/assets/source.rs"]
mod tests;
