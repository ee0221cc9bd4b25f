use std::sync::{Arc, Mutex};

use reactive_command::{Channel, Subscription};

/// Records every notification a channel delivers, starting with the replayed
/// latest value (if any).
pub struct Recorder<V> {
    values: Arc<Mutex<Vec<V>>>,
    subscription: Option<Subscription>,
}

impl<V: Clone + Send + 'static> Recorder<V> {
    pub fn attach(channel: &Channel<V>) -> Self {
        let values = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&values);
        let subscription = channel.subscribe(move |v: &V| sink.lock().unwrap().push(v.clone()));
        Self {
            values,
            subscription: Some(subscription),
        }
    }

    pub fn values(&self) -> Vec<V> {
        self.values.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.values.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn last(&self) -> Option<V> {
        self.values.lock().unwrap().last().cloned()
    }

    pub fn clear(&self) {
        self.values.lock().unwrap().clear();
    }

    /// Stop recording. Values recorded so far are kept.
    pub fn detach(&mut self) -> bool {
        self.subscription
            .take()
            .map(Subscription::unsubscribe)
            .unwrap_or(false)
    }
}

impl<V> Drop for Recorder<V> {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
    }
}
