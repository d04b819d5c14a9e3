use std::time::Duration;

use crate::animation::scheduler::{Scheduler, TimerToken};
use crate::document::model::ImageDocument;

/// Used when a frame duration cannot be turned into a delay.
const FALLBACK_DELAY: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
}

/// Indices into `docs` of the visible documents, in timeline order.
///
/// Sorted by `animation_order`; ties keep collection order.
pub fn visible_indices(docs: &[ImageDocument]) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..docs.len()).filter(|&i| docs[i].is_visible).collect();
    idx.sort_by_key(|&i| docs[i].animation_order);
    idx
}

/// Visible documents in timeline order.
pub fn visible_frames(docs: &[ImageDocument]) -> Vec<&ImageDocument> {
    visible_indices(docs).into_iter().map(|i| &docs[i]).collect()
}

/// Order key for the frame at `source` when moved to insertion offset `target`.
///
/// `keys` are the timeline's keys in order and `target` is in `0..=keys.len()`, counted before the
/// move (`keys.len()` means after the last frame). Moves that leave the frame where it is return
/// `None`.
///
/// Interior keys are the truncating integer midpoint of the neighbours. Neighbours closer than 2
/// apart yield a key equal to one of them; nothing is renumbered, so such a move may not separate
/// the frames.
pub fn reorder_key(keys: &[i64], source: usize, target: usize) -> Option<i64> {
    let count = keys.len();
    if source >= count || target > count || target == source || target == source + 1 {
        return None;
    }
    let key = if target == 0 {
        keys[0].saturating_sub(1)
    } else if target == count {
        keys[count - 1].saturating_add(1)
    } else {
        let prev = i128::from(keys[target - 1]);
        let next = i128::from(keys[target]);
        ((prev + next) / 2) as i64
    };
    Some(key)
}

/// Durations too long to represent saturate instead of falling back.
fn frame_delay(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return FALLBACK_DELAY;
    }
    match Duration::try_from_secs_f64(secs) {
        Ok(d) if d.is_zero() => FALLBACK_DELAY,
        Ok(d) => d,
        Err(_) => Duration::MAX,
    }
}

/// Playhead and timer state for animation playback.
///
/// Holds no documents: each call receives the current collection so durations and visibility are
/// always read live.
#[derive(Clone, Debug, Default)]
pub struct AnimationSequencer {
    state: PlaybackState,
    current_frame_index: usize,
    armed: Option<TimerToken>,
    next_token: u64,
}

impl AnimationSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn current_frame_index(&self) -> usize {
        self.current_frame_index
    }

    /// Token of the pending timer, if one is armed.
    pub fn armed_token(&self) -> Option<TimerToken> {
        self.armed
    }

    /// Document at the playhead, clamped into the current timeline.
    pub fn current_frame<'a>(&self, docs: &'a [ImageDocument]) -> Option<&'a ImageDocument> {
        let frames = visible_indices(docs);
        let last = frames.len().checked_sub(1)?;
        Some(&docs[frames[self.current_frame_index.min(last)]])
    }

    /// Begin playback from the first frame. Returns `false` when there is nothing to play.
    pub fn start(&mut self, docs: &[ImageDocument], sched: &mut dyn Scheduler) -> bool {
        let frames = visible_indices(docs);
        let Some(&first) = frames.first() else {
            tracing::debug!("start ignored: no visible frames");
            return false;
        };
        self.state = PlaybackState::Playing;
        self.current_frame_index = 0;
        self.arm(docs[first].frame_duration, sched);
        tracing::debug!(frames = frames.len(), "playback started");
        true
    }

    /// Cancel any pending timer and stop. Safe to call at any time, any number of times.
    pub fn stop(&mut self, sched: &mut dyn Scheduler) {
        if let Some(token) = self.armed.take() {
            sched.cancel(token);
        }
        if self.is_playing() {
            tracing::debug!(frame = self.current_frame_index, "playback stopped");
        }
        self.state = PlaybackState::Stopped;
    }

    /// Handle an expired timer. Stale tokens and ticks while stopped are ignored.
    ///
    /// Returns `true` when the playhead advanced.
    pub fn on_timer(
        &mut self,
        token: TimerToken,
        docs: &[ImageDocument],
        sched: &mut dyn Scheduler,
    ) -> bool {
        if !self.is_playing() || self.armed != Some(token) {
            return false;
        }
        self.armed = None;
        let frames = visible_indices(docs);
        if frames.is_empty() {
            self.stop(sched);
            return false;
        }
        self.current_frame_index = (self.current_frame_index + 1) % frames.len();
        let current = &docs[frames[self.current_frame_index]];
        self.arm(current.frame_duration, sched);
        true
    }

    /// Jump to `index`, clamped into the timeline.
    pub fn go_to_frame(
        &mut self,
        index: usize,
        docs: &[ImageDocument],
        sched: &mut dyn Scheduler,
    ) {
        let frames = visible_indices(docs);
        let Some(last) = frames.len().checked_sub(1) else {
            self.current_frame_index = 0;
            return;
        };
        self.current_frame_index = index.min(last);
        self.rearm_if_playing(docs, &frames, sched);
    }

    pub fn next_frame(&mut self, docs: &[ImageDocument], sched: &mut dyn Scheduler) {
        let frames = visible_indices(docs);
        if frames.is_empty() {
            return;
        }
        let current = self.current_frame_index.min(frames.len() - 1);
        self.current_frame_index = (current + 1) % frames.len();
        self.rearm_if_playing(docs, &frames, sched);
    }

    pub fn previous_frame(&mut self, docs: &[ImageDocument], sched: &mut dyn Scheduler) {
        let frames = visible_indices(docs);
        let Some(last) = frames.len().checked_sub(1) else {
            return;
        };
        self.current_frame_index = match self.current_frame_index.min(last) {
            0 => last,
            i => i - 1,
        };
        self.rearm_if_playing(docs, &frames, sched);
    }

    /// Move the frame at `source` to insertion offset `target` by rewriting its order key.
    ///
    /// The playhead follows positions, not documents: if the moved frame was current it goes to
    /// the frame's new index, and a current frame between the old and new position shifts by
    /// one. When the new key collides with a neighbour the timeline may not actually change, and
    /// the playhead can then land on a different document. Returns the new key, or `None` when
    /// nothing moved.
    pub fn reorder(
        &mut self,
        docs: &mut [ImageDocument],
        source: usize,
        target: usize,
    ) -> Option<i64> {
        let frames = visible_indices(docs);
        let keys: Vec<i64> = frames.iter().map(|&i| docs[i].animation_order).collect();
        let key = reorder_key(&keys, source, target)?;

        let moved = frames[source];
        docs[moved].animation_order = key;
        tracing::debug!(doc = %docs[moved].id(), source, target, key, "frame reordered");

        let dest = if target > source { target - 1 } else { target };
        let current = self.current_frame_index.min(frames.len() - 1);
        self.current_frame_index = if current == source {
            dest
        } else if source < current && current <= dest {
            current - 1
        } else if dest <= current && current < source {
            current + 1
        } else {
            current
        };
        Some(key)
    }

    /// Bring the playhead back into range after the timeline shrank or grew.
    pub fn sync(&mut self, docs: &[ImageDocument], sched: &mut dyn Scheduler) {
        let count = visible_indices(docs).len();
        if count == 0 {
            self.current_frame_index = 0;
            self.stop(sched);
        } else if self.current_frame_index >= count {
            self.current_frame_index = count - 1;
        }
    }

    fn rearm_if_playing(
        &mut self,
        docs: &[ImageDocument],
        frames: &[usize],
        sched: &mut dyn Scheduler,
    ) {
        if self.is_playing() {
            let current = &docs[frames[self.current_frame_index]];
            self.arm(current.frame_duration, sched);
        }
    }

    fn arm(&mut self, secs: f64, sched: &mut dyn Scheduler) {
        if let Some(old) = self.armed.take() {
            sched.cancel(old);
        }
        self.next_token += 1;
        let token = TimerToken(self.next_token);
        sched.arm(frame_delay(secs), token);
        self.armed = Some(token);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/sequencer.rs"]
mod tests;
