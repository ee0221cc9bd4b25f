// src/config/model.rs

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::types::StrategyKind;

/// Scenario file as read from TOML, before validation.
///
/// ```toml
/// [config]
/// worker_threads = 2
///
/// [command.add_two]
/// kind = "sync"
/// add = 2
///
/// [command.slow]
/// kind = "async"
/// add = 4
/// delay_ms = 50
/// progress_steps = 5
///
/// [composite.both]
/// children = ["add_two", "slow"]
///
/// [[run]]
/// target = "both"
/// input = 5
/// ```
///
/// All sections are optional at the TOML level; validation enforces that
/// at least one command exists.
#[derive(Debug, Clone, Deserialize)]
pub struct RawScenarioFile {
    /// Global settings from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// All commands from `[command.<name>]`.
    #[serde(default)]
    pub command: BTreeMap<String, CommandConfig>,

    /// All composites from `[composite.<name>]`.
    #[serde(default)]
    pub composite: BTreeMap<String, CompositeConfig>,

    /// Invocations from `[[run]]`, executed in file order.
    #[serde(default)]
    pub run: Vec<RunConfig>,
}

/// A validated scenario. Only obtainable through `TryFrom<RawScenarioFile>`.
#[derive(Debug, Clone)]
pub struct ScenarioFile {
    pub config: ConfigSection,
    pub command: BTreeMap<String, CommandConfig>,
    pub composite: BTreeMap<String, CompositeConfig>,
    pub run: Vec<RunConfig>,
}

impl ScenarioFile {
    pub(crate) fn new_unchecked(raw: RawScenarioFile) -> Self {
        Self {
            config: raw.config,
            command: raw.command,
            composite: raw.composite,
            run: raw.run,
        }
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Worker threads of the Tokio runtime async commands run on.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

fn default_worker_threads() -> usize {
    2
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
        }
    }
}

/// `[command.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommandConfig {
    #[serde(default)]
    pub kind: StrategyKind,

    /// The command computes `input + add`.
    #[serde(default)]
    pub add: i64,

    /// Fail with this message instead of producing a result.
    #[serde(default)]
    pub fail: Option<String>,

    /// Async commands only: how long the body takes.
    #[serde(default)]
    pub delay_ms: u64,

    /// Report progress in this many equal steps. 0 = no explicit progress.
    #[serde(default)]
    pub progress_steps: u32,
}

/// `[composite.<name>]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompositeConfig {
    /// Names of `[command.<name>]` sections, in execution order.
    #[serde(default)]
    pub children: Vec<String>,
}

/// One `[[run]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Command or composite to execute.
    pub target: String,

    #[serde(default)]
    pub input: i64,
}
