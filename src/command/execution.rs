// src/command/execution.rs

//! What `execute` hands back to the caller.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::command::CommandId;
use crate::errors::CommandError;

/// Final state of one accepted invocation, as seen by whoever launched it.
pub(crate) struct Settled<R> {
    pub(crate) outcome: Result<R, CommandError>,
    /// Whether a failure reached at least one `error` observer.
    pub(crate) observed: bool,
}

impl<R> Settled<R> {
    /// Blocking calling convention: a failure that nobody observed on the
    /// `error` channel is handed back to the caller instead.
    pub(crate) fn into_blocking(self) -> Result<Execution<R>, CommandError> {
        match self.outcome {
            Ok(value) => Ok(Execution::Done(Some(value))),
            Err(_) if self.observed => Ok(Execution::Done(None)),
            Err(err) => Err(err),
        }
    }
}

/// Handle returned by a successful `execute` call.
#[must_use = "a pending execution reports its outcome only when awaited"]
pub enum Execution<R> {
    /// The body ran inline and has already settled. `None` means it failed
    /// and the failure was delivered on the `error` channel.
    Done(Option<R>),
    /// The body was handed to an execution context.
    Pending(PendingExecution<R>),
}

impl<R> Execution<R> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Execution::Pending(_))
    }

    /// Result of a settled blocking execution. Always `None` while pending.
    pub fn value(&self) -> Option<&R> {
        match self {
            Execution::Done(value) => value.as_ref(),
            Execution::Pending(_) => None,
        }
    }

    pub fn into_value(self) -> Option<R> {
        match self {
            Execution::Done(value) => value,
            Execution::Pending(_) => None,
        }
    }

    /// Wait for the invocation to settle, whichever convention it uses.
    pub async fn wait(self) -> Result<Option<R>, CommandError> {
        match self {
            Execution::Done(value) => Ok(value),
            Execution::Pending(pending) => pending.await.map(Some),
        }
    }
}

impl<R> fmt::Debug for Execution<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Execution::Done(value) => f
                .debug_tuple("Execution::Done")
                .field(&value.is_some())
                .finish(),
            Execution::Pending(pending) => f
                .debug_tuple("Execution::Pending")
                .field(&pending.command)
                .finish(),
        }
    }
}

/// Deferred outcome of an invocation running on an execution context.
///
/// Resolves once the command has published its terminal state. The command
/// settles whether or not this handle is ever awaited.
pub struct PendingExecution<R> {
    command: CommandId,
    rx: oneshot::Receiver<Settled<R>>,
}

impl<R> PendingExecution<R> {
    pub(crate) fn new(command: CommandId, rx: oneshot::Receiver<Settled<R>>) -> Self {
        Self { command, rx }
    }

    pub(crate) fn ready(command: CommandId, outcome: Result<R, CommandError>) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Settled {
            outcome,
            observed: true,
        });
        Self::new(command, rx)
    }

    pub fn command(&self) -> CommandId {
        self.command
    }
}

impl<R> Future for PendingExecution<R> {
    type Output = Result<R, CommandError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(Ok(settled)) => Poll::Ready(settled.outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(CommandError::Abandoned {
                command: this.command,
            })),
            Poll::Pending => Poll::Pending,
        }
    }
}
