// src/errors.rs

//! Crate-wide error types.
//!
//! - [`CommandError`] is what flows through a command's `error` channel and
//!   out of `execute`. It is cheap to clone so every subscriber gets its own
//!   copy of the same failure.
//! - [`EngineError`] covers everything that is reported synchronously to the
//!   caller: construction misuse, missing runtimes, scenario config problems.

use std::sync::Arc;

use thiserror::Error;

use crate::command::CommandId;

/// Failure of a single command invocation.
#[derive(Error, Debug, Clone)]
pub enum CommandError {
    /// `execute` was called while `can_execute` was false.
    #[error("{command} cannot execute right now")]
    Rejected { command: CommandId },

    /// The execution body itself failed. The original error is kept as-is.
    #[error("{0:#}")]
    Failed(Arc<anyhow::Error>),

    /// The execution context dropped the job, or the body panicked, before
    /// the invocation could settle.
    #[error("{command} was abandoned before it completed")]
    Abandoned { command: CommandId },
}

impl CommandError {
    pub(crate) fn failed(err: anyhow::Error) -> Self {
        CommandError::Failed(Arc::new(err))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, CommandError::Rejected { .. })
    }

    /// The command this error refers to, for rejections and abandonments.
    pub fn command(&self) -> Option<CommandId> {
        match self {
            CommandError::Rejected { command } | CommandError::Abandoned { command } => {
                Some(*command)
            }
            CommandError::Failed(_) => None,
        }
    }

    /// The body's original error, if this is a strategy failure.
    ///
    /// Use `downcast_ref` on the result to get back the concrete type the
    /// body returned.
    pub fn failure(&self) -> Option<&anyhow::Error> {
        match self {
            CommandError::Failed(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("a composite command needs at least one child")]
    EmptyComposite,

    #[error("no Tokio runtime available: {0}")]
    NoRuntime(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Command(#[from] CommandError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, EngineError>;
