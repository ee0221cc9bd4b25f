// src/command/can_execute.rs

//! The `can_execute` combinator.
//!
//! `can_execute = source_1 AND ... AND source_n AND !is_executing`
//!
//! A source that has never published counts as `false`. The output channel
//! only publishes when the combined value actually changes.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::trace;

use crate::channel::{Channel, Subscription};

struct Inputs {
    sources: Vec<bool>,
    executing: bool,
}

impl Inputs {
    fn combined(&self) -> bool {
        !self.executing && self.sources.iter().all(|s| *s)
    }
}

/// Live wiring from the input channels to a command's `can_execute`.
///
/// Detaches from every input when dropped.
pub(crate) struct CanExecute {
    subscriptions: Vec<Subscription>,
}

impl CanExecute {
    pub(crate) fn attach(
        output: &Channel<bool>,
        sources: &[Channel<bool>],
        is_executing: &Channel<bool>,
    ) -> Self {
        let inputs = Arc::new(Mutex::new(Inputs {
            sources: sources
                .iter()
                .map(|s| s.current().unwrap_or(false))
                .collect(),
            executing: is_executing.current().unwrap_or(false),
        }));
        refresh(&inputs, output);

        let mut subscriptions = Vec::with_capacity(sources.len() + 1);

        for (index, source) in sources.iter().enumerate() {
            let inputs = Arc::clone(&inputs);
            let output = output.clone();
            subscriptions.push(source.subscribe(move |value: &bool| {
                lock(&inputs).sources[index] = *value;
                refresh(&inputs, &output);
            }));
        }

        {
            let inputs = Arc::clone(&inputs);
            let output = output.clone();
            subscriptions.push(is_executing.subscribe(move |value: &bool| {
                lock(&inputs).executing = *value;
                refresh(&inputs, &output);
            }));
        }

        Self { subscriptions }
    }
}

impl Drop for CanExecute {
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

fn lock(inputs: &Mutex<Inputs>) -> MutexGuard<'_, Inputs> {
    inputs.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publish the combined value, then re-check it: a concurrent update may
/// have published an older value after ours.
fn refresh(inputs: &Mutex<Inputs>, output: &Channel<bool>) {
    loop {
        let value = lock(inputs).combined();
        if output.publish_if_changed(value) {
            trace!(can_execute = value, "can_execute recomputed");
        }
        if lock(inputs).combined() == value {
            break;
        }
    }
}
