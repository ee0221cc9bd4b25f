// src/config/validate.rs

use crate::config::model::{RawScenarioFile, ScenarioFile};
use crate::errors::{EngineError, Result};
use crate::types::StrategyKind;

impl TryFrom<RawScenarioFile> for ScenarioFile {
    type Error = EngineError;

    fn try_from(raw: RawScenarioFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_scenario(&raw)?;
        Ok(ScenarioFile::new_unchecked(raw))
    }
}

fn validate_raw_scenario(cfg: &RawScenarioFile) -> Result<()> {
    ensure_has_commands(cfg)?;
    validate_global_config(cfg)?;
    validate_commands(cfg)?;
    validate_composites(cfg)?;
    validate_runs(cfg)?;
    Ok(())
}

fn ensure_has_commands(cfg: &RawScenarioFile) -> Result<()> {
    if cfg.command.is_empty() {
        return Err(EngineError::ConfigError(
            "scenario must contain at least one [command.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawScenarioFile) -> Result<()> {
    if cfg.config.worker_threads == 0 {
        return Err(EngineError::ConfigError(
            "[config].worker_threads must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_commands(cfg: &RawScenarioFile) -> Result<()> {
    for (name, command) in cfg.command.iter() {
        if command.kind == StrategyKind::Sync && command.delay_ms > 0 {
            return Err(EngineError::ConfigError(format!(
                "command '{}' is sync; `delay_ms` is only supported for async commands",
                name
            )));
        }
    }
    Ok(())
}

fn validate_composites(cfg: &RawScenarioFile) -> Result<()> {
    for (name, composite) in cfg.composite.iter() {
        if cfg.command.contains_key(name) {
            return Err(EngineError::ConfigError(format!(
                "name '{}' is used by both a command and a composite",
                name
            )));
        }
        if composite.children.is_empty() {
            return Err(EngineError::ConfigError(format!(
                "composite '{}' must list at least one child",
                name
            )));
        }
        for child in composite.children.iter() {
            if !cfg.command.contains_key(child) {
                return Err(EngineError::ConfigError(format!(
                    "composite '{}' has unknown child '{}' (children must be [command.<name>] sections)",
                    name, child
                )));
            }
        }
    }
    Ok(())
}

fn validate_runs(cfg: &RawScenarioFile) -> Result<()> {
    for (index, run) in cfg.run.iter().enumerate() {
        if !cfg.command.contains_key(&run.target) && !cfg.composite.contains_key(&run.target) {
            return Err(EngineError::ConfigError(format!(
                "run #{} targets unknown command '{}'",
                index + 1,
                run.target
            )));
        }
    }
    Ok(())
}
