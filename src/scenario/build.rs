// src/scenario/build.rs

use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::anyhow;
use tracing::debug;

use crate::command::{Command, CompositeCommand, Progress, Strategy};
use crate::config::{CommandConfig, RunConfig, ScenarioFile};
use crate::errors::Result;
use crate::exec::TokioContext;
use crate::types::StrategyKind;

/// Live commands built from a scenario file.
#[derive(Debug)]
pub struct Scenario {
    commands: BTreeMap<String, Command<i64, i64>>,
    composites: BTreeMap<String, CompositeCommand<i64, i64>>,
    runs: Vec<RunConfig>,
}

/// A named entry of a [`Scenario`].
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    Command(&'a Command<i64, i64>),
    Composite(&'a CompositeCommand<i64, i64>),
}

impl Scenario {
    /// Build every command and composite. Async commands run on `context`.
    pub fn build(cfg: &ScenarioFile, context: TokioContext) -> Result<Self> {
        let commands: BTreeMap<String, Command<i64, i64>> = cfg
            .command
            .iter()
            .map(|(name, cc)| (name.clone(), build_command(name, cc, &context)))
            .collect();

        let mut composites = BTreeMap::new();
        for (name, composite) in cfg.composite.iter() {
            let children = composite
                .children
                .iter()
                .filter_map(|child| commands.get(child).cloned())
                .collect();
            let built = CompositeCommand::builder(children)
                .label(name.as_str())
                .build()?;
            composites.insert(name.clone(), built);
        }

        debug!(
            commands = commands.len(),
            composites = composites.len(),
            runs = cfg.run.len(),
            "scenario built"
        );

        Ok(Self {
            commands,
            composites,
            runs: cfg.run.clone(),
        })
    }

    pub fn command(&self, name: &str) -> Option<&Command<i64, i64>> {
        self.commands.get(name)
    }

    pub fn composite(&self, name: &str) -> Option<&CompositeCommand<i64, i64>> {
        self.composites.get(name)
    }

    pub fn target(&self, name: &str) -> Option<Target<'_>> {
        self.command(name)
            .map(Target::Command)
            .or_else(|| self.composite(name).map(Target::Composite))
    }

    pub fn commands(&self) -> impl Iterator<Item = (&str, &Command<i64, i64>)> {
        self.commands.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn composites(&self) -> impl Iterator<Item = (&str, &CompositeCommand<i64, i64>)> {
        self.composites.iter().map(|(name, c)| (name.as_str(), c))
    }

    pub fn runs(&self) -> &[RunConfig] {
        &self.runs
    }
}

fn build_command(name: &str, cc: &CommandConfig, context: &TokioContext) -> Command<i64, i64> {
    let add = cc.add;
    let fail = cc.fail.clone();
    let steps = cc.progress_steps;
    let delay = Duration::from_millis(cc.delay_ms);

    let strategy = match (cc.kind, steps) {
        (StrategyKind::Sync, 0) => Strategy::sync(move |input| compute(input, add, fail.as_deref())),
        (StrategyKind::Sync, _) => Strategy::sync_with_progress(move |progress: &Progress, input| {
            for step in 1..=steps {
                progress.set(f64::from(step) / f64::from(steps));
            }
            compute(input, add, fail.as_deref())
        }),
        (StrategyKind::Async, 0) => Strategy::deferred(context.clone(), move |input| {
            let fail = fail.clone();
            async move {
                tokio::time::sleep(delay).await;
                compute(input, add, fail.as_deref())
            }
        }),
        (StrategyKind::Async, _) => {
            Strategy::deferred_with_progress(context.clone(), move |progress: Progress, input| {
                let fail = fail.clone();
                async move {
                    for step in 1..=steps {
                        tokio::time::sleep(delay / steps).await;
                        progress.set(f64::from(step) / f64::from(steps));
                    }
                    compute(input, add, fail.as_deref())
                }
            })
        }
    };

    Command::builder(strategy).label(name).build()
}

fn compute(input: i64, add: i64, fail: Option<&str>) -> anyhow::Result<i64> {
    if let Some(message) = fail {
        return Err(anyhow!("{message}"));
    }
    input
        .checked_add(add)
        .ok_or_else(|| anyhow!("{input} + {add} overflows"))
}
