// src/channel/subject.rs

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use super::subscription::{Detach, Subscription};

type Observer<V> = Arc<Slot<V>>;

/// One registered observer.
///
/// While its replay is being delivered, values published concurrently are
/// queued in `backlog` and handed over right after, so the observer never
/// sees the replayed value after a newer one.
struct Slot<V> {
    callback: Box<dyn Fn(&V) + Send + Sync>,
    backlog: Mutex<Option<Vec<V>>>,
}

impl<V: Clone> Slot<V> {
    fn priming<F>(callback: F) -> Self
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
            backlog: Mutex::new(Some(Vec::new())),
        }
    }

    fn deliver(&self, value: &V) {
        {
            let mut backlog = self.backlog.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(queue) = backlog.as_mut() {
                queue.push(value.clone());
                return;
            }
        }
        (self.callback)(value);
    }

    /// Deliver `replay`, then everything queued meanwhile, then switch to
    /// direct delivery.
    fn prime(&self, replay: Option<V>) {
        if let Some(value) = replay {
            (self.callback)(&value);
        }
        loop {
            let queued = {
                let mut backlog = self.backlog.lock().unwrap_or_else(PoisonError::into_inner);
                let queued = backlog.as_mut().map(std::mem::take).unwrap_or_default();
                if queued.is_empty() {
                    *backlog = None;
                }
                queued
            };
            if queued.is_empty() {
                break;
            }
            for value in &queued {
                (self.callback)(value);
            }
        }
    }
}

/// A multicast channel that caches and replays its latest value.
///
/// Cloning a `Channel` yields another handle to the same channel.
pub struct Channel<V> {
    shared: Arc<Shared<V>>,
}

pub(crate) struct Shared<V> {
    state: Mutex<State<V>>,
}

struct State<V> {
    latest: Option<V>,
    observers: Vec<(u64, Observer<V>)>,
    next_id: u64,
}

impl<V> Shared<V> {
    fn lock(&self) -> MutexGuard<'_, State<V>> {
        // Observers never run under this lock, so a poisoned lock only means
        // a panic inside our own bookkeeping; the state is still consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V: Send + 'static> Detach for Shared<V> {
    fn detach(&self, id: u64) -> bool {
        let mut state = self.lock();
        let before = state.observers.len();
        state.observers.retain(|(oid, _)| *oid != id);
        before != state.observers.len()
    }
}

impl<V> Clone for Channel<V> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<V: Clone + Send + 'static> Default for Channel<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: fmt::Debug> fmt::Debug for Channel<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Channel")
            .field("latest", &state.latest)
            .field("observers", &state.observers.len())
            .finish()
    }
}

impl<V: Clone + Send + 'static> Channel<V> {
    /// A channel with no value yet; subscribers get nothing until the first
    /// `publish`.
    pub fn new() -> Self {
        Self::from_latest(None)
    }

    /// A channel that already holds `value`.
    pub fn with_value(value: V) -> Self {
        Self::from_latest(Some(value))
    }

    fn from_latest(latest: Option<V>) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    latest,
                    observers: Vec::new(),
                    next_id: 0,
                }),
            }),
        }
    }

    /// Latest published value, if any.
    pub fn current(&self) -> Option<V> {
        self.shared.lock().latest.clone()
    }

    pub fn observer_count(&self) -> usize {
        self.shared.lock().observers.len()
    }

    pub fn has_observers(&self) -> bool {
        self.observer_count() > 0
    }

    /// Store `value` as the latest and deliver it to every observer.
    pub fn publish(&self, value: V) {
        let observers = {
            let mut state = self.shared.lock();
            state.latest = Some(value.clone());
            snapshot(&state)
        };
        deliver(&observers, &value);
    }

    /// Register `observer`, replaying the latest value to it straight away.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&V) + Send + Sync + 'static,
    {
        let slot: Observer<V> = Arc::new(Slot::priming(observer));
        // Registration and the replay snapshot happen under one lock; anything
        // published after that is queued behind the replay.
        let (id, replay) = {
            let mut state = self.shared.lock();
            let id = state.next_id;
            state.next_id += 1;
            state.observers.push((id, Arc::clone(&slot)));
            (id, state.latest.clone())
        };
        trace!(observer = id, "channel observer attached");

        slot.prime(replay);

        let target: Arc<dyn Detach> = self.shared.clone();
        Subscription::new(Arc::downgrade(&target), id)
    }

    /// Is this handle pointing at the same channel as `other`?
    pub fn same_channel(&self, other: &Channel<V>) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<V: Clone + PartialEq + Send + 'static> Channel<V> {
    /// Publish `value` unless it equals the current value.
    ///
    /// Returns whether anything was published.
    pub fn publish_if_changed(&self, value: V) -> bool {
        let observers = {
            let mut state = self.shared.lock();
            if state.latest.as_ref() == Some(&value) {
                return false;
            }
            state.latest = Some(value.clone());
            snapshot(&state)
        };
        deliver(&observers, &value);
        true
    }
}

fn snapshot<V>(state: &State<V>) -> Vec<Observer<V>> {
    state
        .observers
        .iter()
        .map(|(_, observer)| Arc::clone(observer))
        .collect()
}

fn deliver<V: Clone>(observers: &[Observer<V>], value: &V) {
    for observer in observers {
        observer.deliver(value);
    }
}
