use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::composite::bake::CompositorOpts;
use crate::foundation::core::{BorderColor, DEFAULT_PALETTE, Point};
use crate::foundation::error::{BenchError, BenchResult};

/// Session-wide settings passed explicitly into [`Workbench::new`](crate::Workbench::new).
///
/// Every field has a default, so a JSON file only needs to name what it overrides.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkbenchConfig {
    /// Where freshly loaded documents are centered; also the reference for `is_modified`.
    pub default_position: Point,
    /// Frame duration assigned to new documents, in seconds.
    pub default_frame_duration: f64,
    /// Lower bound for any frame duration, in seconds.
    pub min_frame_duration: f64,
    /// Identity colors handed out round-robin in creation order.
    pub palette: Vec<BorderColor>,
    /// Maximum number of entries kept in the recent-documents history.
    pub history_limit: usize,
    /// Longest edge of history thumbnails, in pixels.
    pub thumbnail_max_px: u32,
    /// Raster limits and resampling used when baking canvas frames.
    pub compositor: CompositorOpts,
}

impl Default for WorkbenchConfig {
    fn default() -> Self {
        Self {
            default_position: Point::new(400.0, 300.0),
            default_frame_duration: 0.5,
            min_frame_duration: 0.1,
            palette: DEFAULT_PALETTE.to_vec(),
            history_limit: 11,
            thumbnail_max_px: 128,
            compositor: CompositorOpts::default(),
        }
    }
}

impl WorkbenchConfig {
    /// Parse a config from a JSON reader and validate it.
    pub fn from_reader<R: std::io::Read>(r: R) -> BenchResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| BenchError::validation(format!("parse workbench config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> BenchResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            BenchError::validation(format!("open workbench config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.palette.is_empty() {
            return Err(BenchError::validation("palette must contain at least one color"));
        }
        if !(self.min_frame_duration.is_finite() && self.min_frame_duration > 0.0) {
            return Err(BenchError::validation("min_frame_duration must be > 0"));
        }
        if !self.default_frame_duration.is_finite()
            || self.default_frame_duration < self.min_frame_duration
        {
            return Err(BenchError::validation(
                "default_frame_duration must be >= min_frame_duration",
            ));
        }
        if self.history_limit == 0 {
            return Err(BenchError::validation("history_limit must be > 0"));
        }
        if self.thumbnail_max_px == 0 {
            return Err(BenchError::validation("thumbnail_max_px must be > 0"));
        }
        if self.compositor.max_dimension == 0 {
            return Err(BenchError::validation("compositor.max_dimension must be > 0"));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
