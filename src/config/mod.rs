// src/config/mod.rs

//! Scenario configuration for the `reactive-command` demo binary.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a scenario file from disk (`loader.rs`).
//! - Validate cross references between commands, composites and runs
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_scenario_path, load_and_validate, load_from_path};
pub use model::{
    CommandConfig, CompositeConfig, ConfigSection, RawScenarioFile, RunConfig, ScenarioFile,
};
