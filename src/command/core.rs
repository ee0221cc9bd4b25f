// src/command/core.rs

//! Command state machine shared by single and composite commands.
//!
//! Per invocation: `Idle -> Executing -> {Succeeded | Failed} -> Idle`.
//!
//! The core owns the seven channels and enforces their ordering; it knows
//! nothing about how the work itself is done. Callers drive it in this
//! order:
//!
//! 1. [`CommandCore::accept`] (or a rejection)
//! 2. [`CommandCore::begin_progress`] for commands with their own tracker
//! 3. [`CommandCore::publish_outcome`] / [`CommandCore::publish_error`]
//! 4. [`CommandCore::reset_progress`] for commands with their own tracker
//! 5. [`CommandCore::end`]

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::command::can_execute::CanExecute;
use crate::command::execution::{Execution, PendingExecution, Settled};
use crate::command::progress::Progress;
use crate::command::{Channels, CommandId};
use crate::errors::CommandError;

/// How strictly `accept` guards an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Gate {
    /// Normal `execute`: requires `can_execute` to be true.
    CanExecute,
    /// Launched by a composite that already passed its own gate; only
    /// re-entrancy of this very command is refused.
    Bypass,
}

pub(crate) struct CommandCore<R> {
    id: CommandId,
    label: Option<Arc<str>>,
    channels: Channels<R>,
    running: AtomicBool,
    count: AtomicU64,
    _can_execute: CanExecute,
}

impl<R> fmt::Display for CommandCore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({label})", self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

impl<R: Clone + Send + Sync + 'static> CommandCore<R> {
    pub(crate) fn new(label: Option<Arc<str>>, sources: &[Channel<bool>]) -> Self {
        let channels = Channels::new();
        let can_execute = CanExecute::attach(&channels.can_execute, sources, &channels.is_executing);

        Self {
            id: CommandId::next(),
            label,
            channels,
            running: AtomicBool::new(false),
            count: AtomicU64::new(0),
            _can_execute: can_execute,
        }
    }

    pub(crate) fn id(&self) -> CommandId {
        self.id
    }

    pub(crate) fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub(crate) fn channels(&self) -> &Channels<R> {
        &self.channels
    }

    /// Try to move `Idle -> Executing`.
    ///
    /// The running flag is claimed with a compare-and-swap, so two racing
    /// callers can't both get in. `can_execute` is checked only once the flag
    /// is held; a signal that turned false before the claim is always seen.
    pub(crate) fn accept(&self, gate: Gate) -> Result<(), CommandError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(self.rejection());
        }
        if gate == Gate::CanExecute && self.channels.can_execute.current() != Some(true) {
            self.running.store(false, Ordering::Release);
            return Err(self.rejection());
        }

        self.channels.is_executing.publish(true);
        let count = self.count.fetch_add(1, Ordering::AcqRel) + 1;
        self.channels.execution_count.publish(count);
        self.channels.has_been_executed.publish_if_changed(true);

        debug!(command = %self, count, ?gate, "invocation accepted");
        Ok(())
    }

    fn rejection(&self) -> CommandError {
        warn!(command = %self, "invocation rejected; command cannot execute");
        CommandError::Rejected { command: self.id }
    }

    /// Reset progress for a new invocation and hand out its tracker.
    pub(crate) fn begin_progress(&self) -> Progress {
        self.channels.progress.publish_if_changed(0.0);
        Progress::attach(self.channels.progress.clone())
    }

    pub(crate) fn reset_progress(&self) {
        self.channels.progress.publish_if_changed(0.0);
    }

    pub(crate) fn publish_result(&self, value: R) {
        self.channels.result.publish(value);
    }

    /// Returns whether anyone was listening on `error`.
    pub(crate) fn publish_error(&self, err: CommandError) -> bool {
        let observed = self.channels.error.has_observers();
        if !observed {
            debug!(command = %self, error = %err, "error published with no observer");
        }
        self.channels.error.publish(err);
        observed
    }

    /// Publish exactly one of `result` / `error`.
    pub(crate) fn publish_outcome(&self, outcome: &Result<R, CommandError>) -> bool {
        match outcome {
            Ok(value) => {
                self.publish_result(value.clone());
                true
            }
            Err(err) => self.publish_error(err.clone()),
        }
    }

    /// Move `Executing -> Idle`.
    pub(crate) fn end(&self) {
        // Released before the notification so an `is_executing == false`
        // observer can immediately execute again.
        self.running.store(false, Ordering::Release);
        self.channels.is_executing.publish(false);
        debug!(command = %self, "invocation finished");
    }

    /// Deliver a rejection according to the command's calling convention.
    pub(crate) fn deliver_rejection(
        &self,
        rejected: CommandError,
        blocking: bool,
    ) -> Result<Execution<R>, CommandError> {
        let observed = self.publish_error(rejected.clone());
        if blocking {
            Settled {
                outcome: Err(rejected),
                observed,
            }
            .into_blocking()
        } else {
            Ok(Execution::Pending(PendingExecution::ready(
                self.id,
                Err(rejected),
            )))
        }
    }

    /// Turn the settle notification of an accepted invocation into the
    /// handle `execute` returns.
    pub(crate) fn conclude(
        &self,
        blocking: bool,
        mut rx: oneshot::Receiver<Settled<R>>,
    ) -> Result<Execution<R>, CommandError> {
        if !blocking {
            return Ok(Execution::Pending(PendingExecution::new(self.id, rx)));
        }
        match rx.try_recv() {
            Ok(settled) => settled.into_blocking(),
            Err(_) => Err(CommandError::Abandoned { command: self.id }),
        }
    }
}
