// src/command/mod.rs

//! Reactive commands.
//!
//! A command is an invocable unit of work whose executability, progress and
//! outcome are published on [`Channel`]s instead of being polled:
//!
//! - [`core`] is the per-command state machine (acceptance gate, the seven
//!   channels, the settle sequence).
//! - [`can_execute`] derives `can_execute` from external signals and
//!   `!is_executing`.
//! - [`progress`] is the per-invocation progress tracker.
//! - [`strategy`] holds the pluggable execution bodies.
//! - [`execution`] is the handle `execute` returns.
//! - [`single`] and [`composite`] are the two concrete command kinds.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::channel::Channel;
use crate::errors::CommandError;

pub mod can_execute;
pub mod composite;
pub mod core;
pub mod execution;
pub mod progress;
pub mod single;
pub mod strategy;

pub use composite::{CompositeBuilder, CompositeCommand};
pub use execution::{Execution, PendingExecution};
pub use progress::Progress;
pub use single::{Command, CommandBuilder};
pub use strategy::Strategy;

/// Process-unique identity of a command.
///
/// Rejection errors carry this so subscribers can tell which command refused
/// to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(u64);

impl CommandId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        CommandId(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cmd#{}", self.0)
    }
}

/// The observable state of one command.
pub struct Channels<R> {
    pub(crate) can_execute: Channel<bool>,
    pub(crate) is_executing: Channel<bool>,
    pub(crate) result: Channel<R>,
    pub(crate) error: Channel<CommandError>,
    pub(crate) execution_count: Channel<u64>,
    pub(crate) has_been_executed: Channel<bool>,
    pub(crate) progress: Channel<f64>,
}

impl<R: Clone + Send + 'static> Channels<R> {
    pub(crate) fn new() -> Self {
        Self {
            can_execute: Channel::new(),
            is_executing: Channel::with_value(false),
            result: Channel::new(),
            error: Channel::new(),
            execution_count: Channel::with_value(0),
            has_been_executed: Channel::with_value(false),
            progress: Channel::with_value(0.0),
        }
    }
}

impl<R> Channels<R> {
    /// `true` iff every external signal is true and no invocation is running.
    pub fn can_execute(&self) -> &Channel<bool> {
        &self.can_execute
    }

    pub fn is_executing(&self) -> &Channel<bool> {
        &self.is_executing
    }

    /// One value per successful invocation. Empty until the first success.
    pub fn result(&self) -> &Channel<R> {
        &self.result
    }

    /// One value per failed or rejected invocation.
    pub fn error(&self) -> &Channel<CommandError> {
        &self.error
    }

    /// Number of accepted invocations.
    pub fn execution_count(&self) -> &Channel<u64> {
        &self.execution_count
    }

    pub fn has_been_executed(&self) -> &Channel<bool> {
        &self.has_been_executed
    }

    /// In `[0, 1]`; 0 at rest.
    pub fn progress(&self) -> &Channel<f64> {
        &self.progress
    }
}

impl<R> fmt::Debug for Channels<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channels").finish_non_exhaustive()
    }
}

/// Common surface of [`Command`] and [`CompositeCommand`].
///
/// This is what a binder or UI layer programs against: seven channels and
/// an `execute` entry point.
pub trait ReactiveCommand<T>: Send + Sync {
    type Output: Clone + Send + Sync + 'static;

    fn id(&self) -> CommandId;

    fn label(&self) -> Option<&str>;

    fn channels(&self) -> &Channels<Self::Output>;

    /// Whether `execute` runs the work before returning (as opposed to
    /// handing it to an execution context).
    fn is_blocking(&self) -> bool;

    fn execute(&self, input: T) -> Result<Execution<Self::Output>, CommandError>;

    fn can_execute(&self) -> &Channel<bool> {
        self.channels().can_execute()
    }

    fn is_executing(&self) -> &Channel<bool> {
        self.channels().is_executing()
    }

    fn result(&self) -> &Channel<Self::Output> {
        self.channels().result()
    }

    fn error(&self) -> &Channel<CommandError> {
        self.channels().error()
    }

    fn execution_count(&self) -> &Channel<u64> {
        self.channels().execution_count()
    }

    fn has_been_executed(&self) -> &Channel<bool> {
        self.channels().has_been_executed()
    }

    fn progress(&self) -> &Channel<f64> {
        self.channels().progress()
    }
}
