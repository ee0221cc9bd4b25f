// src/command/composite.rs

//! A command that fans one invocation out to several child commands.
//!
//! - `can_execute` is the AND of the composite's own signals and every
//!   child's `can_execute`, so running any child on its own briefly disables
//!   the composite.
//! - `execute` starts every child in declaration order with the same input
//!   and waits for all of them (no fail-fast).
//! - Each failing child is reported on the composite's `error` channel as
//!   its own event; `result` (the ordered child results) is only published
//!   when every child succeeded.
//! - `progress` is the mean of the children's progress.
//! - `is_executing`, `execution_count` and `has_been_executed` only track
//!   invocations of the composite itself.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::channel::{Channel, Subscription};
use crate::command::core::{CommandCore, Gate};
use crate::command::execution::{Execution, Settled};
use crate::command::single::Command;
use crate::command::{Channels, CommandId, ReactiveCommand};
use crate::errors::{self, CommandError, EngineError};

pub struct CompositeCommand<T, R> {
    inner: Arc<CompositeInner<T, R>>,
}

struct CompositeInner<T, R> {
    core: CommandCore<Vec<R>>,
    children: Vec<Command<T, R>>,
    progress_links: Vec<Subscription>,
}

impl<T, R> Drop for CompositeInner<T, R> {
    fn drop(&mut self) {
        for link in self.progress_links.drain(..) {
            link.unsubscribe();
        }
    }
}

impl<T, R> Clone for CompositeCommand<T, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, R> fmt::Debug for CompositeCommand<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeCommand")
            .field("command", &format_args!("{}", self.inner.core))
            .field("children", &self.inner.children.len())
            .finish()
    }
}

/// Per-invocation bookkeeping while children settle.
///
/// Children report twice: once their `result`/`error` is out (`outcome`)
/// and once they are idle again (`idle`). The composite publishes its own
/// `result` on the last outcome, before any child resets its progress, and
/// goes idle after the last child does.
struct Fold<R> {
    slots: Vec<Option<R>>,
    outstanding: usize,
    busy: usize,
    first_failure: Option<CommandError>,
    all_observed: bool,
    settled: Option<Settled<Vec<R>>>,
    reply: Option<oneshot::Sender<Settled<Vec<R>>>>,
}

impl<R: Clone> Fold<R> {
    fn new(children: usize, reply: oneshot::Sender<Settled<Vec<R>>>) -> Self {
        Self {
            slots: (0..children).map(|_| None).collect(),
            outstanding: children,
            busy: children,
            first_failure: None,
            all_observed: true,
            settled: None,
            reply: Some(reply),
        }
    }

    /// Returns the combined results when this was the last outcome and
    /// every child succeeded.
    fn outcome(
        &mut self,
        index: usize,
        outcome: Result<R, CommandError>,
        observed: bool,
    ) -> Option<Vec<R>> {
        match outcome {
            Ok(value) => self.slots[index] = Some(value),
            Err(err) => {
                self.first_failure.get_or_insert(err);
                self.all_observed &= observed;
            }
        }
        self.outstanding -= 1;
        if self.outstanding > 0 {
            return None;
        }

        let outcome = match self.first_failure.take() {
            Some(err) => Err(err),
            None => Ok(std::mem::take(&mut self.slots).into_iter().flatten().collect()),
        };
        let results = outcome.as_ref().ok().cloned();
        self.settled = Some(Settled {
            outcome,
            observed: self.all_observed,
        });
        results
    }

    fn idle(&mut self) -> Option<(Settled<Vec<R>>, oneshot::Sender<Settled<Vec<R>>>)> {
        self.busy -= 1;
        if self.busy > 0 {
            return None;
        }
        Some((self.settled.take()?, self.reply.take()?))
    }
}

/// Settles children that never got launched because an earlier child's body
/// panicked out of `execute`.
struct Unlaunched<'a, T, R>
where
    T: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    composite: &'a CompositeCommand<T, R>,
    fold: &'a Mutex<Fold<R>>,
    next: usize,
}

impl<T, R> Drop for Unlaunched<'_, T, R>
where
    T: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    fn drop(&mut self) {
        let composite = self.composite;
        let children = &composite.inner.children;
        let start = std::mem::replace(&mut self.next, children.len());
        for (index, child) in children.iter().enumerate().skip(start) {
            warn!(command = %composite.inner.core, child = index, "child never launched");
            let abandoned = CommandError::Abandoned { command: child.id() };
            composite.child_outcome(self.fold, index, Err(abandoned));
            composite.child_idle(self.fold);
        }
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T, R> CompositeCommand<T, R>
where
    T: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    /// Composite over `children`; fails with [`EngineError::EmptyComposite`]
    /// when there are none.
    pub fn new(children: Vec<Command<T, R>>) -> errors::Result<Self> {
        Self::builder(children).build()
    }

    pub fn builder(children: Vec<Command<T, R>>) -> CompositeBuilder<T, R> {
        CompositeBuilder {
            children,
            label: None,
            can_execute: Vec::new(),
        }
    }

    pub fn id(&self) -> CommandId {
        self.inner.core.id()
    }

    pub fn label(&self) -> Option<&str> {
        self.inner.core.label()
    }

    pub fn channels(&self) -> &Channels<Vec<R>> {
        self.inner.core.channels()
    }

    pub fn children(&self) -> &[Command<T, R>] {
        &self.inner.children
    }

    /// Blocking iff every child is blocking.
    pub fn is_blocking(&self) -> bool {
        self.inner.children.iter().all(Command::is_blocking)
    }

    /// Run every child with `input`.
    ///
    /// Same calling conventions as [`Command::execute`]. For a blocking
    /// composite with no `error` observer, the first child failure is
    /// returned as `Err`.
    pub fn execute(&self, input: T) -> Result<Execution<Vec<R>>, CommandError> {
        let blocking = self.is_blocking();
        let core = &self.inner.core;

        if let Err(rejected) = core.accept(Gate::CanExecute) {
            return core.deliver_rejection(rejected, blocking);
        }

        let (tx, rx) = oneshot::channel();
        let children = &self.inner.children;
        let fold = Arc::new(Mutex::new(Fold::new(children.len(), tx)));

        let mut unlaunched = Unlaunched {
            composite: self,
            fold: &fold,
            next: 0,
        };
        for (index, child) in children.iter().enumerate() {
            // Claimed before launching: a child that panics settles itself.
            unlaunched.next = index + 1;

            let on_outcome = {
                let this = self.clone();
                let fold = Arc::clone(&fold);
                move |settled: &Settled<R>| this.child_outcome(&fold, index, settled.outcome.clone())
            };
            let on_idle = {
                let this = self.clone();
                let fold = Arc::clone(&fold);
                move |_: Settled<R>| this.child_idle(&fold)
            };
            if let Err(rejected) = child.launch(input.clone(), Gate::Bypass, on_outcome, on_idle) {
                self.child_outcome(&fold, index, Err(rejected));
                self.child_idle(&fold);
            }
        }
        drop(unlaunched);

        core.conclude(blocking, rx)
    }

    fn child_outcome(
        &self,
        fold: &Mutex<Fold<R>>,
        index: usize,
        outcome: Result<R, CommandError>,
    ) {
        let core = &self.inner.core;

        let observed = match &outcome {
            Ok(_) => true,
            Err(err) => {
                debug!(command = %core, child = index, error = %err, "child command failed");
                core.publish_error(err.clone())
            }
        };

        let results = lock(fold).outcome(index, outcome, observed);
        if let Some(results) = results {
            core.publish_result(results);
        }
    }

    fn child_idle(&self, fold: &Mutex<Fold<R>>) {
        let finished = lock(fold).idle();
        if let Some((settled, reply)) = finished {
            self.inner.core.end();
            let _ = reply.send(settled);
        }
    }
}

impl<R> CompositeCommand<(), R>
where
    R: Clone + Send + Sync + 'static,
{
    pub fn execute_unit(&self) -> Result<Execution<Vec<R>>, CommandError> {
        self.execute(())
    }
}

impl<T, R> ReactiveCommand<T> for CompositeCommand<T, R>
where
    T: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    type Output = Vec<R>;

    fn id(&self) -> CommandId {
        CompositeCommand::id(self)
    }

    fn label(&self) -> Option<&str> {
        CompositeCommand::label(self)
    }

    fn channels(&self) -> &Channels<Vec<R>> {
        CompositeCommand::channels(self)
    }

    fn is_blocking(&self) -> bool {
        CompositeCommand::is_blocking(self)
    }

    fn execute(&self, input: T) -> Result<Execution<Vec<R>>, CommandError> {
        CompositeCommand::execute(self, input)
    }
}

/// Construction options for [`CompositeCommand`].
pub struct CompositeBuilder<T, R> {
    children: Vec<Command<T, R>>,
    label: Option<Arc<str>>,
    can_execute: Vec<Channel<bool>>,
}

impl<T, R> CompositeBuilder<T, R>
where
    T: Clone + Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn label(mut self, label: impl Into<Arc<str>>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Extra executability signal on top of the children's.
    pub fn can_execute(mut self, signal: Channel<bool>) -> Self {
        self.can_execute.push(signal);
        self
    }

    pub fn build(self) -> errors::Result<CompositeCommand<T, R>> {
        if self.children.is_empty() {
            return Err(EngineError::EmptyComposite);
        }

        let mut sources = self.can_execute;
        sources.extend(
            self.children
                .iter()
                .map(|child| child.channels().can_execute().clone()),
        );

        let core = CommandCore::new(self.label, &sources);
        let progress_links = link_progress(&self.children, core.channels().progress());
        debug!(command = %core, children = self.children.len(), "composite command built");

        Ok(CompositeCommand {
            inner: Arc::new(CompositeInner {
                core,
                children: self.children,
                progress_links,
            }),
        })
    }
}

/// Keep `output` at the mean of the children's progress.
fn link_progress<T, R>(children: &[Command<T, R>], output: &Channel<f64>) -> Vec<Subscription>
where
    T: Send + 'static,
    R: Clone + Send + Sync + 'static,
{
    let latest = Arc::new(Mutex::new(
        children
            .iter()
            .map(|child| child.channels().progress().current().unwrap_or(0.0))
            .collect::<Vec<f64>>(),
    ));

    children
        .iter()
        .enumerate()
        .map(|(index, child)| {
            let latest = Arc::clone(&latest);
            let output = output.clone();
            child.channels().progress().subscribe(move |value: &f64| {
                lock(&latest)[index] = *value;
                // Re-check after publishing in case a concurrent child update
                // published an older mean after ours.
                loop {
                    let published = mean(&lock(&latest));
                    output.publish_if_changed(published);
                    if mean(&lock(&latest)) == published {
                        break;
                    }
                }
            })
        })
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
