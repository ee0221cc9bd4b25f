// src/exec/backend.rs

//! Pluggable execution context abstraction.
//!
//! Deferred strategies never pick a thread themselves; they hand their work
//! to an `ExecutionContext` supplied when the command is built.
//!
//! - `TokioContext` is the default implementation: it spawns jobs on a Tokio
//!   runtime handle.
//! - Tests can provide their own `ExecutionContext` that, for example, queues
//!   jobs and only runs them when the test says so.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio::runtime::Handle;
use tracing::trace;

use crate::errors::{EngineError, Result};

/// A unit of deferred work handed to an [`ExecutionContext`].
///
/// The job settles its invocation when it finishes. If the context drops it
/// without polling it to completion, the invocation settles as abandoned.
pub type Job = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Trait abstracting where deferred command bodies run.
pub trait ExecutionContext: Send + Sync {
    /// Run `job` to completion at some point, on any thread.
    fn spawn(&self, job: Job);
}

/// Execution context backed by a Tokio runtime.
#[derive(Clone)]
pub struct TokioContext {
    handle: Handle,
}

impl TokioContext {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Context for the runtime the caller is currently running on.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|e| EngineError::NoRuntime(e.to_string()))
    }
}

impl fmt::Debug for TokioContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokioContext")
            .field("runtime", &self.handle.runtime_flavor())
            .finish()
    }
}

impl ExecutionContext for TokioContext {
    fn spawn(&self, job: Job) {
        trace!("spawning deferred command job on tokio");
        // The job reports its own outcome; the join handle isn't needed.
        drop(self.handle.spawn(job));
    }
}
