#![allow(dead_code)]

use std::error::Error;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

use reactive_command::{Channel, Channels, Subscription};

pub use reactive_command_test_utils::{ManualContext, Recorder, init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn Error>>;

/// Every notification of a command's channels, in delivery order, rendered
/// as `channel=value`.
pub struct Journal {
    entries: Arc<Mutex<Vec<String>>>,
    subscriptions: Vec<Subscription>,
}

impl Journal {
    /// Attach to `channels`. `can_execute` is left out unless
    /// `with_can_execute` is set, since it interleaves with `is_executing`.
    pub fn attach<R>(channels: &Channels<R>, with_can_execute: bool) -> Self
    where
        R: Clone + Debug + Send + Sync + 'static,
    {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let mut subscriptions = vec![
            log(channels.is_executing(), "is_executing", &entries),
            log(channels.execution_count(), "execution_count", &entries),
            log(channels.has_been_executed(), "has_been_executed", &entries),
            log(channels.progress(), "progress", &entries),
            log(channels.result(), "result", &entries),
            log(channels.error(), "error", &entries),
        ];
        if with_can_execute {
            subscriptions.push(log(channels.can_execute(), "can_execute", &entries));
        }
        let journal = Self {
            entries,
            subscriptions,
        };
        // Drop the replayed initial values.
        journal.clear();
        journal
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl Drop for Journal {
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}

fn log<V>(channel: &Channel<V>, name: &'static str, entries: &Arc<Mutex<Vec<String>>>) -> Subscription
where
    V: Clone + Debug + Send + 'static,
{
    let entries = Arc::clone(entries);
    channel.subscribe(move |value: &V| {
        entries.lock().unwrap().push(format!("{name}={value:?}"));
    })
}
