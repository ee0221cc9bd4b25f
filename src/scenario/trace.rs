// src/scenario/trace.rs

use std::fmt::Debug;
use std::sync::Arc;

use crate::channel::{Channel, Subscription};
use crate::command::Channels;

/// Where rendered trace lines go (stdout in the binary, a buffer in tests).
pub type Sink = Arc<dyn Fn(String) + Send + Sync>;

/// Subscribe to all seven channels of a command, rendering every
/// notification as `name.channel = value`.
///
/// Because channels replay their latest value, the first lines describe the
/// command's current state.
pub fn trace_channels<R>(name: &str, channels: &Channels<R>, sink: &Sink) -> Vec<Subscription>
where
    R: Clone + Debug + Send + Sync + 'static,
{
    vec![
        watch(channels.can_execute(), name, "can_execute", sink, |v| v.to_string()),
        watch(channels.is_executing(), name, "is_executing", sink, |v| v.to_string()),
        watch(channels.execution_count(), name, "execution_count", sink, |v| v.to_string()),
        watch(channels.has_been_executed(), name, "has_been_executed", sink, |v| v.to_string()),
        watch(channels.progress(), name, "progress", sink, |v| format!("{v:.2}")),
        watch(channels.result(), name, "result", sink, |v| format!("{v:?}")),
        watch(channels.error(), name, "error", sink, |e| e.to_string()),
    ]
}

fn watch<V>(
    channel: &Channel<V>,
    name: &str,
    field: &'static str,
    sink: &Sink,
    render: fn(&V) -> String,
) -> Subscription
where
    V: Clone + Send + 'static,
{
    let prefix = format!("{name}.{field}");
    let sink = Arc::clone(sink);
    channel.subscribe(move |value: &V| sink(format!("{prefix} = {}", render(value))))
}
