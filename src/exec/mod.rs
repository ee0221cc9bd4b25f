// src/exec/mod.rs

//! Execution layer.
//!
//! - [`backend`] provides the `ExecutionContext` trait that deferred
//!   strategies hand their work to, and a concrete `TokioContext` used in
//!   production, which tests can replace with a fake implementation.

pub mod backend;

pub use backend::{ExecutionContext, Job, TokioContext};
