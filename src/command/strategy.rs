// src/command/strategy.rs

//! Execution strategies: the pluggable body of a command.
//!
//! Every body has the same shape, `(progress, input) -> result`; the two
//! variants only differ in *where* the body runs:
//!
//! - `Blocking` runs inline on the thread that called `execute`.
//! - `Deferred` produces a future that is handed to an [`ExecutionContext`];
//!   `execute` returns before the body completes.
//!
//! Bodies that don't report progress simply ignore the tracker; the command
//! still moves progress 0 → 1 → 0 around them.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::command::progress::Progress;
use crate::exec::ExecutionContext;

pub type BlockingBody<T, R> = Arc<dyn Fn(&Progress, T) -> anyhow::Result<R> + Send + Sync>;

pub type DeferredFuture<R> = Pin<Box<dyn Future<Output = anyhow::Result<R>> + Send + 'static>>;

pub type DeferredBody<T, R> = Arc<dyn Fn(Progress, T) -> DeferredFuture<R> + Send + Sync>;

pub enum Strategy<T, R> {
    Blocking(BlockingBody<T, R>),
    Deferred {
        context: Arc<dyn ExecutionContext>,
        body: DeferredBody<T, R>,
    },
}

impl<T: 'static, R: 'static> Strategy<T, R> {
    pub fn sync<F>(body: F) -> Self
    where
        F: Fn(T) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Strategy::Blocking(Arc::new(move |_: &Progress, input| body(input)))
    }

    pub fn sync_with_progress<F>(body: F) -> Self
    where
        F: Fn(&Progress, T) -> anyhow::Result<R> + Send + Sync + 'static,
    {
        Strategy::Blocking(Arc::new(body))
    }

    pub fn deferred<C, F, Fut>(context: C, body: F) -> Self
    where
        C: ExecutionContext + 'static,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        Strategy::Deferred {
            context: Arc::new(context),
            body: Arc::new(move |_: Progress, input| Box::pin(body(input)) as DeferredFuture<R>),
        }
    }

    pub fn deferred_with_progress<C, F, Fut>(context: C, body: F) -> Self
    where
        C: ExecutionContext + 'static,
        F: Fn(Progress, T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    {
        Strategy::Deferred {
            context: Arc::new(context),
            body: Arc::new(move |progress: Progress, input| {
                Box::pin(body(progress, input)) as DeferredFuture<R>
            }),
        }
    }
}

impl<T, R> Strategy<T, R> {
    pub fn is_blocking(&self) -> bool {
        matches!(self, Strategy::Blocking(_))
    }
}

impl<T, R> fmt::Debug for Strategy<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Blocking(_) => f.write_str("Strategy::Blocking"),
            Strategy::Deferred { .. } => f.write_str("Strategy::Deferred"),
        }
    }
}
