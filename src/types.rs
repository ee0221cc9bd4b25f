use std::str::FromStr;
use serde::Deserialize;

/// Which execution strategy a scenario command uses.
///
/// - `Sync`: the body runs inline inside `execute` (blocking convention).
/// - `Async`: the body is spawned on the scenario's Tokio runtime and
///   `execute` returns a pending handle (deferred convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Sync,
    Async,
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::Sync
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sync" => Ok(StrategyKind::Sync),
            "async" => Ok(StrategyKind::Async),
            other => Err(format!(
                "invalid command kind: {other} (expected \"sync\" or \"async\")"
            )),
        }
    }
}
