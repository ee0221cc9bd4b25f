#![allow(dead_code)]

use std::collections::BTreeMap;
use reactive_command::config::{
    CommandConfig, CompositeConfig, ConfigSection, RawScenarioFile, RunConfig, ScenarioFile,
};
use reactive_command::types::StrategyKind;

/// Builder for `RawScenarioFile` / `ScenarioFile` to simplify test setup.
pub struct ScenarioBuilder {
    scenario: RawScenarioFile,
}

impl ScenarioBuilder {
    pub fn new() -> Self {
        Self {
            scenario: RawScenarioFile {
                config: ConfigSection::default(),
                command: BTreeMap::new(),
                composite: BTreeMap::new(),
                run: vec![],
            },
        }
    }

    pub fn worker_threads(mut self, n: usize) -> Self {
        self.scenario.config.worker_threads = n;
        self
    }

    pub fn with_command(mut self, name: &str, command: CommandConfig) -> Self {
        self.scenario.command.insert(name.to_string(), command);
        self
    }

    pub fn with_composite(mut self, name: &str, children: &[&str]) -> Self {
        self.scenario.composite.insert(
            name.to_string(),
            CompositeConfig {
                children: children.iter().map(|c| c.to_string()).collect(),
            },
        );
        self
    }

    pub fn run(mut self, target: &str, input: i64) -> Self {
        self.scenario.run.push(RunConfig {
            target: target.to_string(),
            input,
        });
        self
    }

    pub fn raw(self) -> RawScenarioFile {
        self.scenario
    }

    pub fn build(self) -> ScenarioFile {
        ScenarioFile::try_from(self.scenario).expect("Failed to build valid scenario from builder")
    }
}

impl Default for ScenarioBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `CommandConfig`.
pub struct CommandConfigBuilder {
    command: CommandConfig,
}

impl CommandConfigBuilder {
    pub fn sync(add: i64) -> Self {
        Self {
            command: CommandConfig {
                kind: StrategyKind::Sync,
                add,
                ..CommandConfig::default()
            },
        }
    }

    pub fn async_(add: i64) -> Self {
        Self {
            command: CommandConfig {
                kind: StrategyKind::Async,
                add,
                ..CommandConfig::default()
            },
        }
    }

    pub fn fail(mut self, message: &str) -> Self {
        self.command.fail = Some(message.to_string());
        self
    }

    pub fn delay_ms(mut self, ms: u64) -> Self {
        self.command.delay_ms = ms;
        self
    }

    pub fn progress_steps(mut self, steps: u32) -> Self {
        self.command.progress_steps = steps;
        self
    }

    pub fn build(self) -> CommandConfig {
        self.command
    }
}
