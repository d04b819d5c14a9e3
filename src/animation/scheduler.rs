//! One-shot timer abstraction driving animation playback.
//!
//! The sequencer only ever arms and cancels; whoever owns the event loop delivers expired
//! tokens back to it on the thread that owns the workbench.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Identifies one armed timer. Tokens are never reused by a sequencer.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct TimerToken(pub u64);

pub trait Scheduler {
    /// Deliver `token` once, after `delay`.
    fn arm(&mut self, delay: Duration, token: TimerToken);

    /// Drop a pending timer. Unknown or already-fired tokens are ignored.
    fn cancel(&mut self, token: TimerToken);
}

/// Virtual-time scheduler: nothing fires until the owner advances the clock.
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Duration,
    pending: Vec<(Duration, TimerToken)>,
    fired: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Number of timers delivered so far.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    pub fn pending(&self) -> &[(Duration, TimerToken)] {
        &self.pending
    }

    /// Earliest timer due at or before `until`, moving the clock to its deadline.
    ///
    /// Deliver the token, then call again: handling it may arm a timer that is also due.
    pub fn next_due(&mut self, until: Duration) -> Option<TimerToken> {
        let (idx, &(deadline, token)) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, (deadline, _))| *deadline <= until)
            .min_by_key(|(_, (deadline, token))| (*deadline, *token))?;
        self.pending.remove(idx);
        self.now = self.now.max(deadline);
        self.fired += 1;
        Some(token)
    }

    /// Move the clock forward without firing anything.
    pub fn advance_to(&mut self, until: Duration) {
        self.now = self.now.max(until);
    }
}

impl Scheduler for ManualScheduler {
    fn arm(&mut self, delay: Duration, token: TimerToken) {
        self.pending.push((self.now.saturating_add(delay), token));
    }

    fn cancel(&mut self, token: TimerToken) {
        self.pending.retain(|(_, t)| *t != token);
    }
}

struct ArmedTimer {
    cancelled: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// Wall-clock scheduler: each timer sleeps on its own thread and reports back over a channel.
///
/// The receiving side is drained by the event loop with [`ThreadScheduler::recv_timeout`] or
/// [`ThreadScheduler::try_recv`], which keeps every workbench mutation on that one thread.
pub struct ThreadScheduler {
    tx: mpsc::Sender<TimerToken>,
    rx: mpsc::Receiver<TimerToken>,
    armed: HashMap<TimerToken, ArmedTimer>,
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadScheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx,
            armed: HashMap::new(),
        }
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<TimerToken> {
        self.rx.recv_timeout(timeout).ok()
    }

    pub fn try_recv(&self) -> Option<TimerToken> {
        self.rx.try_recv().ok()
    }

    fn reap_finished(&mut self) {
        self.armed.retain(|_, t| !t.handle.is_finished());
    }
}

impl Scheduler for ThreadScheduler {
    fn arm(&mut self, delay: Duration, token: TimerToken) {
        self.reap_finished();
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let tx = self.tx.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(delay);
            if !flag.load(Ordering::Acquire) {
                // Receiver gone means the scheduler was dropped; nothing left to notify.
                let _ = tx.send(token);
            }
        });
        self.armed.insert(token, ArmedTimer { cancelled, handle });
    }

    fn cancel(&mut self, token: TimerToken) {
        if let Some(t) = self.armed.remove(&token) {
            t.cancelled.store(true, Ordering::Release);
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        for t in self.armed.values() {
            t.cancelled.store(true, Ordering::Release);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/scheduler.rs"]
mod tests;
