//! Imagebench is the engine of an image comparison and editing workbench.
//!
//! A [`Workbench`] owns a set of [`ImageDocument`]s and the modes that drive them:
//!
//! - Resize by number, by corner drag, or by moving canvas edges around a stationary image
//! - Bake a canvas frame into new pixels with [`bake`] (or off-thread via [`BakeJob`])
//! - Measure an overlay against a base image with anchor points ([`relative_position`])
//! - Play the visible documents as a timed sequence through a [`Scheduler`]
//! - Remember recently opened documents in a [`HistoryStore`]
#![forbid(unsafe_code)]

pub mod foundation {
    pub mod config;
    pub mod core;
    pub mod error;
    pub(crate) mod math;
}

pub mod document {
    pub mod model;
    pub mod store;
}

pub mod geometry {
    pub mod engine;
}

pub mod composite {
    pub mod bake;
    pub(crate) mod blend;
}

pub mod placement {
    pub mod solver;
}

pub mod animation {
    pub mod scheduler;
    pub mod sequencer;
}

pub mod assets {
    pub mod codec;
    pub mod source;
}

pub mod history {
    pub mod recent;
    pub mod store;
}

pub use crate::foundation::config::WorkbenchConfig;
pub use crate::foundation::core::{BorderColor, DEFAULT_PALETTE, DocId, Point, Size, Vec2};
pub use crate::foundation::error::{BenchError, BenchResult};

pub use crate::document::model::{
    AnchorPoint, Axis, CanvasFrame, Flip, Frame, ImageDocument, LayoutMode, RasterImage,
};
pub use crate::document::store::Workbench;
pub use crate::geometry::engine::{
    Corner, Edge, MIN_DIMENSION, MIN_DRAG_DIMENSION, corner_resize, edge_resize, resize,
};

pub use crate::composite::bake::{
    BakeJob, BakeOutcome, CompositorOpts, ResampleFilter, apply_bake, bake, flip_view, render_view,
};
pub use crate::placement::solver::{
    RenderedFrame, base_anchor_world, overlay_anchor_world, position_for_relative,
    relative_position,
};

pub use crate::animation::scheduler::{ManualScheduler, Scheduler, ThreadScheduler, TimerToken};
pub use crate::animation::sequencer::{
    AnimationSequencer, PlaybackState, reorder_key, visible_frames, visible_indices,
};

pub use crate::assets::codec::{DefaultCodec, ExportFormat, ImageCodec};
pub use crate::assets::source::{DecodedSource, ImageSource, decode_sources};

pub use crate::history::recent::{DocumentSummary, RECENT_DOCUMENTS_KEY, RecentHistory};
pub use crate::history::store::{FileHistoryStore, HistoryStore, MemoryHistoryStore};
