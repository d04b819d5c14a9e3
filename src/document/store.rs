use std::collections::HashSet;

use rayon::prelude::*;

use crate::animation::scheduler::{ManualScheduler, Scheduler, TimerToken};
use crate::animation::sequencer::{AnimationSequencer, visible_frames};
use crate::assets::codec::{ExportFormat, ImageCodec};
use crate::assets::source::{ImageSource, decode_sources};
use crate::composite::bake::{BakeJob, BakeOutcome, apply_bake, bake, render_view};
use crate::document::model::{
    AnchorPoint, Axis, Flip, Frame, ImageDocument, LayoutMode, RasterImage,
};
use crate::foundation::config::WorkbenchConfig;
use crate::foundation::core::{DocId, Point, Size, Vec2};
use crate::foundation::error::{BenchError, BenchResult};
use crate::geometry::engine::{self, Corner, Edge};
use crate::history::recent::DocumentSummary;
use crate::placement::solver::{self, RenderedFrame};

/// One editing session: the documents, the workbench-wide modes and the animation playhead.
///
/// All mutation goes through `&mut self` on the thread that owns the workbench. Work done
/// elsewhere (decoding, bake jobs, timers) comes back as values to hand to the matching method.
pub struct Workbench<S: Scheduler = ManualScheduler> {
    config: WorkbenchConfig,
    docs: Vec<ImageDocument>,
    next_id: u64,
    created: usize,
    focused: Option<DocId>,
    layout_mode: LayoutMode,
    keep_aspect: bool,
    canvas_resize_mode: bool,
    base_image: Option<DocId>,
    placement_viewport: RenderedFrame,
    sequencer: AnimationSequencer,
    scheduler: S,
    baking: HashSet<DocId>,
}

impl Default for Workbench<ManualScheduler> {
    fn default() -> Self {
        Self::with_valid_config(WorkbenchConfig::default(), ManualScheduler::new())
    }
}

impl<S: Scheduler> Workbench<S> {
    pub fn new(config: WorkbenchConfig, scheduler: S) -> BenchResult<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config, scheduler))
    }

    fn with_valid_config(config: WorkbenchConfig, scheduler: S) -> Self {
        Self {
            config,
            docs: Vec::new(),
            next_id: 0,
            created: 0,
            focused: None,
            layout_mode: LayoutMode::default(),
            keep_aspect: true,
            canvas_resize_mode: false,
            base_image: None,
            placement_viewport: RenderedFrame::default(),
            sequencer: AnimationSequencer::new(),
            scheduler,
            baking: HashSet::new(),
        }
    }

    pub fn config(&self) -> &WorkbenchConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    // ---------------------------------------------------------------------------------------
    // Collection

    /// Documents in z-order (last draws on top in overlay mode).
    pub fn documents(&self) -> &[ImageDocument] {
        &self.docs
    }

    pub fn document(&self, id: DocId) -> Option<&ImageDocument> {
        self.docs.iter().find(|d| d.id() == id)
    }

    fn document_mut(&mut self, id: DocId) -> Option<&mut ImageDocument> {
        self.docs.iter_mut().find(|d| d.id() == id)
    }

    fn index_of(&self, id: DocId) -> Option<usize> {
        self.docs.iter().position(|d| d.id() == id)
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Create a document from decoded pixels, centered at the default position.
    pub fn add_document(&mut self, name: impl Into<String>, image: RasterImage) -> DocId {
        let id = DocId(self.next_id);
        self.next_id += 1;

        let palette = &self.config.palette;
        let color = palette[self.created % palette.len()];
        self.created += 1;

        let order = self
            .docs
            .iter()
            .map(|d| d.animation_order)
            .max()
            .map_or(0, |m| m.saturating_add(1));

        let doc = ImageDocument::new(
            id,
            name,
            image,
            self.config.default_position,
            color,
            self.config.default_frame_duration,
            order,
        );
        tracing::debug!(doc = %id, name = %doc.name, "document added");
        self.docs.push(doc);
        if self.focused.is_none() {
            self.focused = Some(id);
        }
        id
    }

    /// Decode `sources` and add one document per success, in input order.
    ///
    /// Undecodable sources are skipped; this never fails as a whole.
    #[tracing::instrument(skip_all, fields(sources = sources.len()))]
    pub fn load(&mut self, sources: &[ImageSource], codec: &dyn ImageCodec) -> Vec<DocId> {
        let decoded = decode_sources(sources, codec);
        let ids: Vec<DocId> = decoded
            .into_iter()
            .map(|d| self.add_document(d.name, d.image))
            .collect();
        tracing::info!(
            loaded = ids.len(),
            skipped = sources.len() - ids.len(),
            "load finished"
        );
        ids
    }

    /// Close a document. Focus moves to the new first document, or clears when none remain.
    pub fn remove(&mut self, id: DocId) -> Option<ImageDocument> {
        let idx = self.index_of(id)?;
        let doc = self.docs.remove(idx);
        if self.focused == Some(id) {
            self.focused = self.docs.first().map(|d| d.id());
        }
        if self.base_image == Some(id) {
            self.base_image = None;
            self.placement_viewport = RenderedFrame::default();
        }
        self.baking.remove(&id);
        self.sequencer.sync(&self.docs, &mut self.scheduler);
        tracing::debug!(doc = %id, "document removed");
        Some(doc)
    }

    /// Move a document to the top of the z-order.
    pub fn bring_to_front(&mut self, id: DocId) {
        if let Some(idx) = self.index_of(id) {
            let doc = self.docs.remove(idx);
            self.docs.push(doc);
        }
    }

    /// Move a document to the bottom of the z-order.
    pub fn send_to_back(&mut self, id: DocId) {
        if let Some(idx) = self.index_of(id) {
            let doc = self.docs.remove(idx);
            self.docs.insert(0, doc);
        }
    }

    // ---------------------------------------------------------------------------------------
    // Workbench modes

    pub fn focused(&self) -> Option<DocId> {
        self.focused
    }

    /// Focus a live document. Returns `false` for unknown ids.
    pub fn set_focus(&mut self, id: DocId) -> bool {
        if self.index_of(id).is_none() {
            return false;
        }
        self.focused = Some(id);
        true
    }

    pub fn layout_mode(&self) -> LayoutMode {
        self.layout_mode
    }

    /// Switch mode; leaving animation mode stops playback.
    pub fn set_layout_mode(&mut self, mode: LayoutMode) {
        if self.layout_mode == LayoutMode::Animation && mode != LayoutMode::Animation {
            self.stop_animation();
        }
        tracing::debug!(from = ?self.layout_mode, to = ?mode, "layout mode");
        self.layout_mode = mode;
    }

    pub fn keep_aspect(&self) -> bool {
        self.keep_aspect
    }

    pub fn set_keep_aspect(&mut self, on: bool) {
        self.keep_aspect = on;
    }

    pub fn canvas_resize_mode(&self) -> bool {
        self.canvas_resize_mode
    }

    /// Toggle canvas-resize mode. Turning it off bakes every document with a canvas frame.
    pub fn set_canvas_resize_mode(&mut self, on: bool) {
        if self.canvas_resize_mode == on {
            return;
        }
        self.canvas_resize_mode = on;
        tracing::debug!(on, "canvas resize mode");
        if !on {
            self.bake_all();
        }
    }

    pub fn base_image(&self) -> Option<DocId> {
        self.base_image
    }

    /// Choose the placement base. Unknown ids clear it.
    ///
    /// The cached placement viewport describes the previous base, so a change drops it.
    pub fn set_base_image(&mut self, id: Option<DocId>) {
        let base = id.filter(|&id| self.index_of(id).is_some());
        if base != self.base_image {
            self.placement_viewport = RenderedFrame::default();
        }
        self.base_image = base;
    }

    /// Cache the rendered base frame observed by the placement viewport.
    pub fn set_placement_viewport(&mut self, frame: RenderedFrame) {
        self.placement_viewport = frame;
    }

    // ---------------------------------------------------------------------------------------
    // Geometry

    /// Numeric resize; width wins when both are given and aspect lock is on.
    pub fn resize(&mut self, id: DocId, width: Option<f64>, height: Option<f64>) {
        let keep_aspect = self.keep_aspect;
        if let Some(doc) = self.document_mut(id) {
            engine::resize(doc, width, height, keep_aspect);
        }
    }

    /// Corner drag. Aspect lock does not apply while canvas-resize mode is on.
    pub fn corner_resize(&mut self, id: DocId, corner: Corner, delta: Vec2) {
        let keep_aspect = self.keep_aspect && !self.canvas_resize_mode;
        if let Some(doc) = self.document_mut(id) {
            engine::corner_resize(doc, corner, delta, keep_aspect);
        }
    }

    /// Canvas edge drag. Only honoured in canvas-resize mode; returns the delta actually applied.
    pub fn edge_resize(&mut self, id: DocId, edge: Edge, delta: Vec2) -> Option<Vec2> {
        if !self.canvas_resize_mode {
            tracing::debug!(doc = %id, "edge resize ignored outside canvas resize mode");
            return None;
        }
        self.document_mut(id)
            .map(|doc| engine::edge_resize(doc, edge, delta))
    }

    pub fn set_position(&mut self, id: DocId, position: Point) {
        if let Some(doc) = self.document_mut(id) {
            doc.position = position;
        }
    }

    pub fn move_by(&mut self, id: DocId, delta: Vec2) {
        if let Some(doc) = self.document_mut(id) {
            doc.position += delta;
        }
    }

    pub fn set_opacity(&mut self, id: DocId, opacity: f64) {
        if !opacity.is_finite() {
            return;
        }
        if let Some(doc) = self.document_mut(id) {
            doc.overlay_opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn set_flip(&mut self, id: DocId, flip: Flip) {
        if let Some(doc) = self.document_mut(id) {
            doc.flip = flip;
        }
    }

    pub fn toggle_flip(&mut self, id: DocId, axis: Axis) {
        if let Some(doc) = self.document_mut(id) {
            match axis {
                Axis::Horizontal => doc.flip.x = !doc.flip.x,
                Axis::Vertical => doc.flip.y = !doc.flip.y,
            }
        }
    }

    pub fn set_anchor_point(&mut self, id: DocId, anchor: AnchorPoint) {
        if let Some(doc) = self.document_mut(id) {
            doc.anchor_point = anchor;
        }
    }

    /// Undo every non-destructive edit: size back to the current buffer, default position, full
    /// opacity, no flips, no canvas frame.
    pub fn reset(&mut self, id: DocId) {
        let home = self.config.default_position;
        if let Some(doc) = self.document_mut(id) {
            doc.display_size = doc.source().natural_size();
            doc.position = home;
            doc.overlay_opacity = 1.0;
            doc.flip = Flip::default();
            doc.frame = Frame::Normal;
        }
    }

    // ---------------------------------------------------------------------------------------
    // Baking

    /// Bake one document synchronously. `Ok(false)` when it has no canvas frame.
    pub fn bake(&mut self, id: DocId) -> BenchResult<bool> {
        match self.begin_bake(id)? {
            Some(job) => {
                let outcome = job.run();
                Ok(self.finish_bake(outcome))
            }
            None => Ok(false),
        }
    }

    /// Reserve a document for baking and detach the work so it can run on another thread.
    ///
    /// A second reservation before [`Workbench::finish_bake`] is rejected.
    pub fn begin_bake(&mut self, id: DocId) -> BenchResult<Option<BakeJob>> {
        if self.baking.contains(&id) {
            return Err(BenchError::BakeInProgress(id));
        }
        let Some(doc) = self.document(id) else {
            return Ok(None);
        };
        let job = BakeJob::new(doc, self.config.compositor);
        if job.is_some() {
            self.baking.insert(id);
        }
        Ok(job)
    }

    /// Apply a finished bake. Returns `false` if the document is gone, was not reserved, or was
    /// edited after [`Workbench::begin_bake`].
    ///
    /// A stale outcome is discarded. The document keeps its current canvas frame, and is baked
    /// again straight away when canvas-resize mode has been left in the meantime.
    pub fn finish_bake(&mut self, outcome: BakeOutcome) -> bool {
        let id = outcome.doc;
        if !self.baking.remove(&id) {
            return false;
        }
        let canvas_mode = self.canvas_resize_mode;
        let opts = self.config.compositor;
        let Some(doc) = self.document_mut(id) else {
            return false;
        };
        if !outcome.is_current_for(doc) {
            tracing::warn!(doc = %id, "document changed during bake; discarding result");
            if !canvas_mode {
                bake(doc, &opts);
            }
            return false;
        }
        apply_bake(doc, outcome);
        true
    }

    /// Bake every document with a canvas frame, compositing in parallel and applying in order.
    #[tracing::instrument(skip(self))]
    pub fn bake_all(&mut self) -> usize {
        let ids: Vec<DocId> = self
            .docs
            .iter()
            .filter(|d| d.canvas_frame().is_some())
            .map(|d| d.id())
            .collect();
        let mut jobs = Vec::with_capacity(ids.len());
        for id in ids {
            match self.begin_bake(id) {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping document"),
            }
        }
        let outcomes: Vec<BakeOutcome> = jobs.par_iter().map(BakeJob::run).collect();
        let mut baked = 0;
        for outcome in outcomes {
            if self.finish_bake(outcome) {
                baked += 1;
            }
        }
        tracing::debug!(baked, "bake pass finished");
        baked
    }

    // ---------------------------------------------------------------------------------------
    // Animation

    pub fn is_animating(&self) -> bool {
        self.sequencer.is_playing()
    }

    pub fn current_frame_index(&self) -> usize {
        self.sequencer.current_frame_index()
    }

    #[tracing::instrument(skip(self))]
    pub fn start_animation(&mut self) -> bool {
        self.sequencer.start(&self.docs, &mut self.scheduler)
    }

    pub fn stop_animation(&mut self) {
        self.sequencer.stop(&mut self.scheduler);
    }

    /// Deliver an expired timer token from the scheduler.
    pub fn on_timer(&mut self, token: TimerToken) -> bool {
        self.sequencer.on_timer(token, &self.docs, &mut self.scheduler)
    }

    pub fn go_to_frame(&mut self, index: usize) {
        self.sequencer
            .go_to_frame(index, &self.docs, &mut self.scheduler);
    }

    pub fn next_frame(&mut self) {
        self.sequencer.next_frame(&self.docs, &mut self.scheduler);
    }

    pub fn previous_frame(&mut self) {
        self.sequencer.previous_frame(&self.docs, &mut self.scheduler);
    }

    /// Move a timeline frame to insertion offset `target`; returns its new order key.
    pub fn reorder_frames(&mut self, source: usize, target: usize) -> Option<i64> {
        self.sequencer.reorder(&mut self.docs, source, target)
    }

    pub fn set_visible(&mut self, id: DocId, visible: bool) {
        if let Some(doc) = self.document_mut(id) {
            doc.is_visible = visible;
            self.sequencer.sync(&self.docs, &mut self.scheduler);
        }
    }

    /// Set a frame duration in seconds, raised to the configured minimum.
    pub fn set_frame_duration(&mut self, id: DocId, secs: f64) {
        if !secs.is_finite() {
            return;
        }
        let min = self.config.min_frame_duration;
        if let Some(doc) = self.document_mut(id) {
            doc.frame_duration = secs.max(min);
        }
    }

    // ---------------------------------------------------------------------------------------
    // Read-only queries, safe to call on every redraw

    pub fn current_frame(&self) -> Option<&ImageDocument> {
        self.sequencer.current_frame(&self.docs)
    }

    pub fn visible_frames(&self) -> Vec<&ImageDocument> {
        visible_frames(&self.docs)
    }

    /// Offset of `id`'s anchor from the base image's anchor.
    ///
    /// `None` without a base image, for the base itself, or for unknown ids.
    pub fn relative_position(
        &self,
        id: DocId,
        frame_size: Option<Size>,
        frame_center: Option<Point>,
    ) -> Option<Vec2> {
        let (base, overlay) = self.placement_pair(id)?;
        let observed = RenderedFrame {
            size: frame_size,
            center: frame_center,
        }
        .or(self.placement_viewport);
        Some(solver::relative_position(base, overlay, observed))
    }

    /// Move `id` so that its relative position becomes `relative`.
    pub fn place_relative(
        &mut self,
        id: DocId,
        relative: Vec2,
        frame_size: Option<Size>,
        frame_center: Option<Point>,
    ) -> bool {
        let Some((base, overlay)) = self.placement_pair(id) else {
            return false;
        };
        let observed = RenderedFrame {
            size: frame_size,
            center: frame_center,
        }
        .or(self.placement_viewport);
        let position = solver::position_for_relative(base, overlay, relative, observed);
        self.set_position(id, position);
        true
    }

    fn placement_pair(&self, id: DocId) -> Option<(&ImageDocument, &ImageDocument)> {
        let base_id = self.base_image?;
        if base_id == id {
            return None;
        }
        Some((self.document(base_id)?, self.document(id)?))
    }

    /// Unknown ids are reported as unmodified.
    pub fn is_modified(&self, id: DocId) -> bool {
        self.document(id)
            .is_some_and(|d| d.is_modified(self.config.default_position))
    }

    // ---------------------------------------------------------------------------------------
    // Export

    /// Encode what the document currently shows (flips, display size, canvas frame).
    pub fn export(
        &self,
        id: DocId,
        codec: &dyn ImageCodec,
        format: ExportFormat,
        quality: Option<u8>,
    ) -> BenchResult<Vec<u8>> {
        let doc = self
            .document(id)
            .ok_or_else(|| BenchError::validation(format!("unknown document {id}")))?;
        let pixels = render_view(doc, &self.config.compositor)?;
        codec.encode(&pixels, format, quality)
    }

    /// History record for a document.
    pub fn summary(&self, id: DocId, codec: &dyn ImageCodec) -> BenchResult<DocumentSummary> {
        let doc = self
            .document(id)
            .ok_or_else(|| BenchError::validation(format!("unknown document {id}")))?;
        DocumentSummary::from_document(doc, codec, self.config.thumbnail_max_px)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/document/store.rs"]
mod tests;
