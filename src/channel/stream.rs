// src/channel/stream.rs

//! Async `Stream` view of a channel.
//!
//! The stream is fed by an ordinary subscription that forwards every value
//! into an unbounded mpsc queue, so a slow consumer never blocks publishers
//! and never misses a value.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::subject::Channel;
use super::subscription::Subscription;

/// Stream of current-plus-future values of a [`Channel`].
///
/// Detaches from the channel when dropped.
pub struct ChannelStream<V> {
    rx: UnboundedReceiverStream<V>,
    subscription: Subscription,
}

impl<V: Clone + Send + 'static> Channel<V> {
    pub fn stream(&self) -> ChannelStream<V> {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = self.subscribe(move |value: &V| {
            // The receiver only goes away together with the subscription.
            let _ = tx.send(value.clone());
        });
        ChannelStream {
            rx: UnboundedReceiverStream::new(rx),
            subscription,
        }
    }
}

impl<V> Stream for ChannelStream<V> {
    type Item = V;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<V>> {
        Pin::new(&mut self.get_mut().rx).poll_next(cx)
    }
}

impl<V> Drop for ChannelStream<V> {
    fn drop(&mut self) {
        self.subscription.detach_ref();
    }
}
