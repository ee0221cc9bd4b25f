// src/channel/subscription.rs

use std::fmt;
use std::sync::Weak;

use tracing::trace;

/// Type-erased "remove observer `id`" hook so a `Subscription` doesn't need
/// to know the channel's value type.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: u64) -> bool;
}

/// Handle to one observer registered on a [`Channel`](super::Channel).
///
/// Dropping a `Subscription` leaves the observer attached; call
/// [`Subscription::unsubscribe`] to stop receiving values. The handle only
/// holds a weak reference, so it never keeps a channel alive.
pub struct Subscription {
    target: Weak<dyn Detach>,
    id: u64,
}

impl Subscription {
    pub(crate) fn new(target: Weak<dyn Detach>, id: u64) -> Self {
        Self { target, id }
    }

    /// Detach the observer. Returns `false` if it was already gone (or the
    /// channel itself was dropped).
    pub fn unsubscribe(self) -> bool {
        self.detach_ref()
    }

    pub(crate) fn detach_ref(&self) -> bool {
        match self.target.upgrade() {
            Some(target) => {
                let removed = target.detach(self.id);
                trace!(observer = self.id, removed, "channel observer detached");
                removed
            }
            None => false,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("channel_alive", &(self.target.strong_count() > 0))
            .finish()
    }
}
