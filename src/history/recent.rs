use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::assets::codec::{ExportFormat, ImageCodec};
use crate::composite::bake::flip_view;
use crate::document::model::{ImageDocument, RasterImage};
use crate::foundation::core::{BorderColor, Size};
use crate::foundation::error::{BenchError, BenchResult};
use crate::history::store::HistoryStore;

/// Store key holding the recent-documents list.
pub const RECENT_DOCUMENTS_KEY: &str = "recent_documents";

/// Lightweight record of a previously opened document.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DocumentSummary {
    pub name: String,
    pub original_size: Size,
    pub display_size: Size,
    /// Base64 PNG.
    pub thumbnail_png: String,
    pub border_color: BorderColor,
    pub is_visible: bool,
    pub frame_duration: f64,
    pub animation_order: i64,
}

impl DocumentSummary {
    pub fn from_document(
        doc: &ImageDocument,
        codec: &dyn ImageCodec,
        thumbnail_max_px: u32,
    ) -> BenchResult<Self> {
        let thumb = thumbnail(doc, thumbnail_max_px)?;
        let png = codec.encode(&thumb, ExportFormat::Png, None)?;
        Ok(Self {
            name: doc.name.clone(),
            original_size: doc.original_size(),
            display_size: doc.display_size,
            thumbnail_png: BASE64.encode(png),
            border_color: doc.border_color,
            is_visible: doc.is_visible,
            frame_duration: doc.frame_duration,
            animation_order: doc.animation_order,
        })
    }

    pub fn thumbnail_bytes(&self) -> BenchResult<Vec<u8>> {
        BASE64
            .decode(&self.thumbnail_png)
            .map_err(|e| BenchError::serde(format!("thumbnail for '{}': {e}", self.name)))
    }

    fn check(&self) -> BenchResult<()> {
        let positive = |s: Size| s.width > 0.0 && s.height > 0.0;
        if !positive(self.original_size) || !positive(self.display_size) {
            return Err(BenchError::serde(format!("'{}' has an empty size", self.name)));
        }
        if !(self.frame_duration.is_finite() && self.frame_duration > 0.0) {
            return Err(BenchError::serde(format!(
                "'{}' has an invalid frame duration",
                self.name
            )));
        }
        self.thumbnail_bytes().map(|_| ())
    }
}

fn thumbnail(doc: &ImageDocument, max_px: u32) -> BenchResult<RasterImage> {
    let src = flip_view(doc.source(), doc.flip)?;
    let longest = src.width.max(src.height);
    if longest <= max_px {
        return Ok(src.into_owned());
    }
    let scale = f64::from(max_px) / f64::from(longest);
    let w = ((f64::from(src.width) * scale).round() as u32).max(1);
    let h = ((f64::from(src.height) * scale).round() as u32).max(1);
    let buf = src
        .to_image_buffer()
        .ok_or_else(|| BenchError::validation("raster buffer does not match its dimensions"))?;
    RasterImage::from_image_buffer(image::imageops::thumbnail(&buf, w, h))
}

/// Bounded, most-recent-first list of document summaries, persisted through a [`HistoryStore`].
#[derive(Clone, Debug)]
pub struct RecentHistory {
    limit: usize,
    entries: Vec<DocumentSummary>,
}

impl RecentHistory {
    pub fn empty(limit: usize) -> Self {
        Self {
            limit,
            entries: Vec::new(),
        }
    }

    /// Load the list, dropping entries that no longer parse.
    ///
    /// When anything was dropped the cleaned list is written back straight away.
    #[tracing::instrument(skip(store))]
    pub fn load(store: &mut dyn HistoryStore, limit: usize) -> BenchResult<Self> {
        let mut out = Self::empty(limit);
        let Some(blob) = store.get(RECENT_DOCUMENTS_KEY)? else {
            return Ok(out);
        };

        let raw: Vec<serde_json::Value> = match serde_json::from_slice(&blob) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(error = %e, "history blob unreadable; starting empty");
                out.save(store)?;
                return Ok(out);
            }
        };

        let total = raw.len();
        for value in raw {
            let parsed = serde_json::from_value::<DocumentSummary>(value)
                .map_err(|e| BenchError::serde(e.to_string()))
                .and_then(|s| s.check().map(|_| s));
            match parsed {
                Ok(s) => out.entries.push(s),
                Err(e) => tracing::warn!(error = %e, "dropping history entry"),
            }
        }
        out.entries.truncate(limit);

        if out.entries.len() != total {
            tracing::debug!(kept = out.entries.len(), total, "rewriting cleaned history");
            out.save(store)?;
        }
        Ok(out)
    }

    pub fn entries(&self) -> &[DocumentSummary] {
        &self.entries
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Put `summary` first, replacing any entry with the same name, and persist.
    pub fn record(
        &mut self,
        summary: DocumentSummary,
        store: &mut dyn HistoryStore,
    ) -> BenchResult<()> {
        self.entries.retain(|e| e.name != summary.name);
        self.entries.insert(0, summary);
        self.entries.truncate(self.limit);
        self.save(store)
    }

    pub fn remove(&mut self, name: &str, store: &mut dyn HistoryStore) -> BenchResult<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.save(store)?;
        Ok(true)
    }

    pub fn clear(&mut self, store: &mut dyn HistoryStore) -> BenchResult<()> {
        self.entries.clear();
        self.save(store)
    }

    fn save(&self, store: &mut dyn HistoryStore) -> BenchResult<()> {
        let blob =
            serde_json::to_vec(&self.entries).map_err(|e| BenchError::serde(e.to_string()))?;
        store.put(RECENT_DOCUMENTS_KEY, blob)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/history/recent.rs"]
mod tests;
