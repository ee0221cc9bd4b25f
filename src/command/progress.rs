// src/command/progress.rs

//! Per-invocation progress tracker.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::channel::Channel;

/// A clamped, monotonic `[0, 1]` scalar bound to one invocation.
///
/// Every accepted invocation gets a fresh tracker starting at 0. Writes that
/// would not move the value forward are ignored, and once the invocation
/// settles the tracker goes stale and ignores all writes.
///
/// Do not write to a tracker from inside an observer of the same command's
/// `progress` channel: writes are published while the tracker is locked.
#[derive(Clone)]
pub struct Progress {
    state: Arc<Mutex<TrackerState>>,
    channel: Channel<f64>,
}

struct TrackerState {
    value: f64,
    live: bool,
}

impl Progress {
    /// A tracker that isn't attached to any command, for driving
    /// progress-reporting bodies directly.
    pub fn new() -> Self {
        Self::attach(Channel::with_value(0.0))
    }

    pub(crate) fn attach(channel: Channel<f64>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TrackerState {
                value: 0.0,
                live: true,
            })),
            channel,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn value(&self) -> f64 {
        self.lock().value
    }

    /// `false` once the invocation this tracker belongs to has settled.
    pub fn is_live(&self) -> bool {
        self.lock().live
    }

    /// Channel the tracker publishes to.
    pub fn channel(&self) -> &Channel<f64> {
        &self.channel
    }

    /// Move progress to `value` (clamped). Returns whether it moved.
    pub fn set(&self, value: f64) -> bool {
        self.advance(|_| value)
    }

    /// Move progress forward by `delta` (clamped). Returns whether it moved.
    pub fn add(&self, delta: f64) -> bool {
        self.advance(|current| current + delta)
    }

    fn advance(&self, next: impl FnOnce(f64) -> f64) -> bool {
        let mut state = self.lock();
        if !state.live {
            return false;
        }
        let target = next(state.value).clamp(0.0, 1.0);
        // NaN fails this comparison too.
        if !(target > state.value) {
            return false;
        }
        state.value = target;
        trace!(progress = target, "progress advanced");
        self.channel.publish(target);
        true
    }

    /// Force the tracker to 1 and detach it.
    pub(crate) fn complete(&self) {
        self.set(1.0);
        self.lock().live = false;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("Progress")
            .field("value", &state.value)
            .field("live", &state.live)
            .finish()
    }
}
