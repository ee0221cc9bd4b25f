// src/channel/mod.rs

//! Multicast, replay-latest-one notification channels.
//!
//! Every piece of observable command state is a [`Channel`]:
//! - each subscriber gets its own delivery of every published value;
//! - a new subscriber is immediately handed the latest value (if any);
//! - observers run outside the channel's lock, on whatever thread published.
//!
//! [`subject`] holds the channel itself, [`subscription`] the detach handle
//! and [`stream`] an async `Stream` adapter on top of a subscription.

pub mod stream;
pub mod subject;
pub mod subscription;

pub use stream::ChannelStream;
pub use subject::Channel;
pub use subscription::Subscription;
