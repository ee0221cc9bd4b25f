// src/lib.rs

//! Reactive commands: invokable operations whose state (availability,
//! running flag, execution count, progress, results and errors) is published
//! on observable channels.

pub mod channel;
pub mod cli;
pub mod command;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod scenario;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

pub use crate::channel::{Channel, ChannelStream, Subscription};
pub use crate::command::{
    Channels, Command, CommandBuilder, CommandId, CompositeBuilder, CompositeCommand, Execution,
    PendingExecution, Progress, ReactiveCommand, Strategy,
};
pub use crate::errors::{CommandError, EngineError};
pub use crate::exec::{ExecutionContext, Job, TokioContext};

use crate::cli::CliArgs;
use crate::config::{ScenarioFile, load_and_validate};
use crate::scenario::{RunOutcome, RunReport, Scenario, Sink, run_scenario};

/// High-level entry point used by `main.rs`.
///
/// Loads and validates the scenario, then executes it on a dedicated
/// multi-thread Tokio runtime sized by `[config] worker_threads`.
pub fn run(args: CliArgs) -> Result<()> {
    let scenario_path = PathBuf::from(&args.scenario);
    let cfg = load_and_validate(&scenario_path)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(cfg.config.worker_threads)
        .enable_all()
        .build()?;

    let reports = runtime.block_on(async {
        let context = TokioContext::current()?;
        let scenario = Scenario::build(&cfg, context)?;
        let sink: Sink = Arc::new(|line| println!("{line}"));
        info!(path = %scenario_path.display(), "running scenario");
        run_scenario(&scenario, sink).await
    })?;

    print_summary(&reports);
    Ok(())
}

fn print_summary(reports: &[RunReport]) {
    println!();
    println!("summary ({} runs):", reports.len());
    for report in reports {
        let outcome = match &report.outcome {
            RunOutcome::Succeeded(value) => format!("ok {value}"),
            RunOutcome::Failed(message) => format!("failed: {message}"),
            RunOutcome::Rejected => "rejected".to_string(),
        };
        println!("  - {}({}) -> {outcome}", report.target, report.input);
    }
}

/// Simple dry-run output: print commands, composites and runs.
fn print_dry_run(cfg: &ScenarioFile) {
    println!("reactive-command dry-run");
    println!("  config.worker_threads = {}", cfg.config.worker_threads);
    println!();

    println!("commands ({}):", cfg.command.len());
    for (name, command) in cfg.command.iter() {
        println!("  - {name}");
        println!("      kind: {:?}", command.kind);
        println!("      add: {}", command.add);
        if let Some(ref message) = command.fail {
            println!("      fail: {message}");
        }
        if command.delay_ms > 0 {
            println!("      delay_ms: {}", command.delay_ms);
        }
        if command.progress_steps > 0 {
            println!("      progress_steps: {}", command.progress_steps);
        }
    }

    if !cfg.composite.is_empty() {
        println!("composites ({}):", cfg.composite.len());
        for (name, composite) in cfg.composite.iter() {
            println!("  - {name}");
            println!("      children: {:?}", composite.children);
        }
    }

    println!("runs ({}):", cfg.run.len());
    for run in cfg.run.iter() {
        println!("  - {}({})", run.target, run.input);
    }

    debug!("dry-run complete (no execution)");
}
