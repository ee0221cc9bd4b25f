// src/scenario/runner.rs

use std::fmt::Debug;

use tracing::{info, warn};

use crate::command::{Channels, Execution};
use crate::errors::{CommandError, EngineError, Result};
use crate::scenario::build::{Scenario, Target};
use crate::scenario::trace::{Sink, trace_channels};

/// How one `[[run]]` entry ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Rendered result value.
    Succeeded(String),
    /// Rendered failure.
    Failed(String),
    /// The target could not execute.
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub target: String,
    pub input: i64,
    pub outcome: RunOutcome,
}

/// Trace every command of `scenario` into `sink`, then execute its runs in
/// order, waiting for each to settle before starting the next.
pub async fn run_scenario(scenario: &Scenario, sink: Sink) -> Result<Vec<RunReport>> {
    let mut subscriptions = Vec::new();
    for (name, command) in scenario.commands() {
        subscriptions.extend(trace_channels(name, command.channels(), &sink));
    }
    for (name, composite) in scenario.composites() {
        subscriptions.extend(trace_channels(name, composite.channels(), &sink));
    }

    let mut reports = Vec::with_capacity(scenario.runs().len());

    for run in scenario.runs() {
        info!(command = %run.target, input = run.input, "executing scenario run");

        let outcome = match scenario.target(&run.target) {
            Some(Target::Command(command)) => {
                settle(command.execute(run.input), command.channels()).await
            }
            Some(Target::Composite(composite)) => {
                settle(composite.execute(run.input), composite.channels()).await
            }
            None => {
                return Err(EngineError::ConfigError(format!(
                    "run targets unknown command '{}'",
                    run.target
                )));
            }
        };

        if outcome != RunOutcome::Rejected {
            info!(command = %run.target, ?outcome, "scenario run settled");
        } else {
            warn!(command = %run.target, "scenario run rejected");
        }

        reports.push(RunReport {
            target: run.target.clone(),
            input: run.input,
            outcome,
        });
    }

    for subscription in subscriptions {
        subscription.unsubscribe();
    }

    Ok(reports)
}

async fn settle<R>(
    started: std::result::Result<Execution<R>, CommandError>,
    channels: &Channels<R>,
) -> RunOutcome
where
    R: Clone + Debug + Send + 'static,
{
    let settled = match started {
        Ok(execution) => execution.wait().await,
        Err(err) => Err(err),
    };

    match settled {
        Ok(Some(value)) => RunOutcome::Succeeded(format!("{value:?}")),
        // Delivered on the error channel instead.
        Ok(None) => match channels.error().current() {
            Some(err) => outcome_of(err),
            None => RunOutcome::Failed("unknown failure".to_string()),
        },
        Err(err) => outcome_of(err),
    }
}

fn outcome_of(err: CommandError) -> RunOutcome {
    if err.is_rejected() {
        RunOutcome::Rejected
    } else {
        RunOutcome::Failed(err.to_string())
    }
}
