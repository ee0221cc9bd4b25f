// src/scenario/mod.rs

//! Scenario runner behind the `reactive-command` binary.
//!
//! - [`build`] turns a validated [`ScenarioFile`](crate::config::ScenarioFile)
//!   into live commands and composites.
//! - [`trace`] subscribes to every channel and renders each notification as
//!   a line of text.
//! - [`runner`] executes the `[[run]]` entries in order and reports how each
//!   one ended.

pub mod build;
pub mod runner;
pub mod trace;

pub use build::{Scenario, Target};
pub use runner::{RunOutcome, RunReport, run_scenario};
pub use trace::{Sink, trace_channels};
