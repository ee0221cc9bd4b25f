// src/command/single.rs

//! A command backed by one execution strategy.

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::warn;

use crate::channel::Channel;
use crate::command::core::{CommandCore, Gate};
use crate::command::execution::{Execution, Settled};
use crate::command::progress::Progress;
use crate::command::strategy::Strategy;
use crate::command::{Channels, CommandId, ReactiveCommand};
use crate::errors::CommandError;

/// A reactive command taking `T` and producing `R`.
///
/// Cloning yields another handle to the same command.
///
/// ```
/// use reactive_command::Command;
///
/// let add_two = Command::from_fn(|x: i32| x + 2);
/// let done = add_two.execute(5).unwrap();
/// assert_eq!(done.value(), Some(&7));
/// assert_eq!(add_two.channels().execution_count().current(), Some(1));
/// ```
pub struct Command<T, R> {
    inner: Arc<Inner<T, R>>,
}

struct Inner<T, R> {
    core: CommandCore<R>,
    strategy: Strategy<T, R>,
}

impl<T, R> Clone for Command<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, R> fmt::Debug for Command<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("command", &format_args!("{}", self.inner.core))
            .field("strategy", &self.inner.strategy)
            .finish()
    }
}

impl<T, R> Command<T, R>
where
    T: Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn new(strategy: Strategy<T, R>) -> Self {
        Self::builder(strategy).build()
    }

    pub fn builder(strategy: Strategy<T, R>) -> CommandBuilder<T, R> {
        CommandBuilder {
            strategy,
            label: None,
            can_execute: Vec::new(),
        }
    }

    /// Blocking command from an infallible function.
    pub fn from_fn<F>(body: F) -> Self
    where
        F: Fn(T) -> R + Send + Sync + 'static,
    {
        Self::new(Strategy::sync(move |input| Ok(body(input))))
    }

    /// Blocking command from a fallible function.
    pub fn try_from_fn<F>(body: F) -> Self
    where
        F: Fn(T) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Self::new(Strategy::sync(body))
    }

    pub fn id(&self) -> CommandId {
        self.inner.core.id()
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.core.label()
    }

    pub fn channels(&self) -> &Channels<R> {
        self.inner.core.channels()
    }

    pub fn is_blocking(&self) -> bool {
        self.inner.strategy.is_blocking()
    }

    /// Run the command with `input`.
    ///
    /// - Blocking strategies settle before this returns. A failure (or a
    ///   rejection) goes to the `error` channel; if nobody is subscribed
    ///   there it is returned as `Err` instead of being lost.
    /// - Deferred strategies return [`Execution::Pending`] right away; the
    ///   failure always goes to the `error` channel and the pending handle
    ///   resolves with it.
    pub fn execute(&self, input: T) -> Result<Execution<R>, CommandError> {
        let blocking = self.is_blocking();
        let (tx, rx) = oneshot::channel();
        let launched = self.launch(
            input,
            Gate::CanExecute,
            |_: &Settled<R>| {},
            move |settled| {
                let _ = tx.send(settled);
            },
        );
        match launched {
            Ok(()) => self.inner.core.conclude(blocking, rx),
            Err(rejected) => self.inner.core.deliver_rejection(rejected, blocking),
        }
    }

    /// Accept an invocation and start the body.
    ///
    /// `on_outcome` runs right after `result`/`error` is published, while
    /// progress is still at its final value; `on_idle` runs once the command
    /// is back to `is_executing == false`.
    ///
    /// A rejection is returned without being published so the caller can
    /// route it.
    pub(crate) fn launch<O, I>(
        &self,
        input: T,
        gate: Gate,
        on_outcome: O,
        on_idle: I,
    ) -> Result<(), CommandError>
    where
        O: FnOnce(&Settled<R>) + Send + 'static,
        I: FnOnce(Settled<R>) + Send + 'static,
    {
        self.inner.core.accept(gate)?;
        let tracker = self.inner.core.begin_progress();

        let this = self.clone();
        let settle_tracker = tracker.clone();
        let guard = SettleGuard::new(self.id(), move |outcome| {
            let settled = this.inner.settle(&settle_tracker, outcome, on_outcome);
            on_idle(settled);
        });

        match &self.inner.strategy {
            Strategy::Blocking(body) => {
                let outcome = body(&tracker, input).map_err(CommandError::failed);
                guard.settle(outcome);
            }
            Strategy::Deferred { context, body } => {
                let work = body(tracker, input);
                context.spawn(Box::pin(async move {
                    let outcome = work.await.map_err(CommandError::failed);
                    guard.settle(outcome);
                }));
            }
        }
        Ok(())
    }
}

impl<R> Command<(), R>
where
    R: Clone + Send + Sync + 'static,
{
    /// `execute` for commands that take no input.
    pub fn execute_unit(&self) -> Result<Execution<R>, CommandError> {
        self.execute(())
    }
}

impl<T, R: Clone + Send + Sync + 'static> Inner<T, R> {
    fn settle<O>(
        &self,
        tracker: &Progress,
        outcome: Result<R, CommandError>,
        on_outcome: O,
    ) -> Settled<R>
    where
        O: FnOnce(&Settled<R>),
    {
        tracker.complete();
        let observed = self.core.publish_outcome(&outcome);
        let settled = Settled { outcome, observed };
        on_outcome(&settled);
        self.core.reset_progress();
        self.core.end();
        settled
    }
}

impl<T, R> ReactiveCommand<T> for Command<T, R>
where
    T: Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    type Output = R;

    fn id(&self) -> CommandId {
        Command::id(self)
    }

    fn label(&self) -> Option<&str> {
        Command::label(self)
    }

    fn channels(&self) -> &Channels<R> {
        Command::channels(self)
    }

    fn is_blocking(&self) -> bool {
        Command::is_blocking(self)
    }

    fn execute(&self, input: T) -> Result<Execution<R>, CommandError> {
        Command::execute(self, input)
    }
}

/// Construction options for [`Command`].
pub struct CommandBuilder<T, R> {
    strategy: Strategy<T, R>,
    label: Option<Arc<str>>,
    can_execute: Vec<Channel<bool>>,
}

impl<T, R> CommandBuilder<T, R>
where
    T: Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Name used in logs and `Debug` output.
    pub fn label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// External executability signal, ANDed with `!is_executing`.
    ///
    /// May be given several times; all signals must be true.
    pub fn can_execute(mut self, signal: Channel<bool>) -> Self {
        self.can_execute.push(signal);
        self
    }

    pub fn build(self) -> Command<T, R> {
        Command {
            inner: Arc::new(Inner {
                core: CommandCore::new(self.label, &self.can_execute),
                strategy: self.strategy,
            }),
        }
    }
}

/// Settles an invocation exactly once: explicitly, or as abandoned when
/// dropped first (job dropped by its context, body panicked).
struct SettleGuard<R> {
    command: CommandId,
    settle: Option<Box<dyn FnOnce(Result<R, CommandError>) + Send>>,
}

impl<R> SettleGuard<R> {
    fn new<F>(command: CommandId, settle: F) -> Self
    where
        F: FnOnce(Result<R, CommandError>) + Send + 'static,
    {
        Self {
            command,
            settle: Some(Box::new(settle)),
        }
    }

    fn settle(mut self, outcome: Result<R, CommandError>) {
        if let Some(settle) = self.settle.take() {
            settle(outcome);
        }
    }
}

impl<R> Drop for SettleGuard<R> {
    fn drop(&mut self) {
        if let Some(settle) = self.settle.take() {
            warn!(command = %self.command, "invocation dropped before settling");
            settle(Err(CommandError::Abandoned {
                command: self.command,
            }));
        }
    }
}
