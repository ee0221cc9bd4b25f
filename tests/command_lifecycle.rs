// tests/command_lifecycle.rs

mod common;
use crate::common::{Journal, Recorder, TestResult, init_tracing};

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::anyhow;
use reactive_command::{
    Channel, Command, CommandError, Execution, Progress, ReactiveCommand, Strategy,
};

#[derive(Debug, thiserror::Error)]
#[error("disk full")]
struct DiskFull;

#[test]
fn test_add_two_scenario() -> TestResult {
    init_tracing();

    let command = Command::from_fn(|x: i32| x + 2);
    let results = Recorder::attach(command.channels().result());
    let counts = Recorder::attach(command.channels().execution_count());

    let execution = command.execute(5)?;

    assert_eq!(execution.value(), Some(&7));
    assert_eq!(results.values(), vec![7]);
    assert_eq!(counts.values(), vec![0, 1]);
    Ok(())
}

#[test]
fn test_initial_state() {
    init_tracing();

    let command = Command::from_fn(|x: i32| x);
    let channels = command.channels();

    assert_eq!(channels.can_execute().current(), Some(true));
    assert_eq!(channels.is_executing().current(), Some(false));
    assert_eq!(channels.execution_count().current(), Some(0));
    assert_eq!(channels.has_been_executed().current(), Some(false));
    assert_eq!(channels.progress().current(), Some(0.0));
    assert!(channels.result().current().is_none());
    assert!(channels.error().current().is_none());
}

#[test]
fn test_success_notification_order() -> TestResult {
    init_tracing();

    let command = Command::from_fn(|x: i32| x * 3);
    let journal = Journal::attach(command.channels(), false);

    let _ = command.execute(3)?;

    assert_eq!(
        journal.entries(),
        vec![
            "is_executing=true",
            "execution_count=1",
            "has_been_executed=true",
            "progress=1.0",
            "result=9",
            "progress=0.0",
            "is_executing=false",
        ]
    );
    Ok(())
}

#[test]
fn test_failure_notification_order() -> TestResult {
    init_tracing();

    let command: Command<(), i32> = Command::try_from_fn(|_| Err(anyhow!("boom")));
    let journal = Journal::attach(command.channels(), false);

    let execution = command.execute_unit()?;
    assert!(matches!(execution, Execution::Done(None)));

    let entries = journal.entries();
    assert_eq!(entries.len(), 7);
    assert_eq!(
        &entries[..4],
        &[
            "is_executing=true",
            "execution_count=1",
            "has_been_executed=true",
            "progress=1.0",
        ]
    );
    assert!(entries[4].starts_with("error="), "got {:?}", entries[4]);
    assert_eq!(&entries[5..], &["progress=0.0", "is_executing=false"]);

    assert!(command.channels().result().current().is_none());
    Ok(())
}

#[test]
fn test_can_execute_flips_during_invocation() -> TestResult {
    init_tracing();

    let command = Command::from_fn(|x: i32| x);
    let can_execute = Recorder::attach(command.channels().can_execute());

    let _ = command.execute(1)?;
    let _ = command.execute(2)?;

    assert_eq!(can_execute.values(), vec![true, false, true, false, true]);
    assert_eq!(command.channels().execution_count().current(), Some(2));
    Ok(())
}

#[test]
fn test_has_been_executed_flips_once() -> TestResult {
    init_tracing();

    let command = Command::from_fn(|x: i32| x);
    let flags = Recorder::attach(command.channels().has_been_executed());

    for i in 0..3 {
        let _ = command.execute(i)?;
    }

    assert_eq!(flags.values(), vec![false, true]);
    Ok(())
}

#[test]
fn test_blocking_failure_without_observer_is_returned() {
    init_tracing();

    let command: Command<(), i32> = Command::try_from_fn(|_| Err(DiskFull.into()));

    let err = command.execute_unit().expect_err("unobserved failure must be returned");
    let original = err.failure().expect("strategy failure");
    assert!(original.downcast_ref::<DiskFull>().is_some());

    // Still deposited for late subscribers.
    let late = Recorder::attach(command.channels().error());
    assert_eq!(late.len(), 1);
    assert_eq!(late.values()[0].to_string(), "disk full");
}

#[test]
fn test_blocking_failure_with_observer_is_not_returned() -> TestResult {
    init_tracing();

    let command: Command<(), i32> = Command::try_from_fn(|_| Err(anyhow!("boom")));
    let errors = Recorder::attach(command.channels().error());

    let execution = command.execute_unit()?;

    assert_eq!(execution.into_value(), None);
    assert_eq!(errors.len(), 1);
    assert_eq!(command.channels().is_executing().current(), Some(false));
    Ok(())
}

#[test]
fn test_rejection_leaves_state_untouched() {
    init_tracing();

    let enabled = Channel::with_value(false);
    let command = Command::builder(Strategy::sync(|x: i32| Ok(x)))
        .can_execute(enabled.clone())
        .build();
    let journal = Journal::attach(command.channels(), true);

    for _ in 0..3 {
        match command.execute(1) {
            Err(CommandError::Rejected { command: id }) => assert_eq!(id, command.id()),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    assert!(journal.entries().iter().all(|e| e.starts_with("error=")));
    assert_eq!(journal.entries().len(), 3);
    assert_eq!(command.channels().execution_count().current(), Some(0));
    assert_eq!(command.channels().has_been_executed().current(), Some(false));
    assert_eq!(command.channels().progress().current(), Some(0.0));
    assert_eq!(command.channels().is_executing().current(), Some(false));
}

#[test]
fn test_rejection_is_published_to_observers() -> TestResult {
    init_tracing();

    let enabled = Channel::with_value(false);
    let command = Command::builder(Strategy::sync(|x: i32| Ok(x)))
        .can_execute(enabled)
        .build();
    let errors = Recorder::attach(command.channels().error());

    let execution = command.execute(1)?;

    assert!(matches!(execution, Execution::Done(None)));
    let rejected = errors.last().expect("rejection published");
    assert!(rejected.is_rejected());
    assert_eq!(rejected.command(), Some(command.id()));
    Ok(())
}

#[test]
fn test_external_signal_gates_execution() -> TestResult {
    init_tracing();

    let enabled = Channel::new();
    let command = Command::builder(Strategy::sync(|x: i32| Ok(x + 1)))
        .label("gated")
        .can_execute(enabled.clone())
        .build();

    // Never published counts as false.
    assert_eq!(command.channels().can_execute().current(), Some(false));

    enabled.publish(true);
    assert_eq!(command.channels().can_execute().current(), Some(true));
    assert_eq!(command.execute(1)?.value(), Some(&2));

    enabled.publish(false);
    assert!(command.execute(1).is_err());
    assert_eq!(command.channels().execution_count().current(), Some(1));
    Ok(())
}

#[test]
fn test_disabled_rejection_leaves_command_idle() -> TestResult {
    init_tracing();

    let enabled = Channel::with_value(false);
    let command = Command::builder(Strategy::sync(|x: i32| Ok(x + 1)))
        .can_execute(enabled.clone())
        .build();
    let journal = Journal::attach(command.channels(), true);
    let errors = Recorder::attach(command.channels().error());

    for _ in 0..3 {
        assert!(command.execute(1).is_err());
    }
    assert_eq!(errors.len(), 3);
    assert!(journal.entries().iter().all(|e| e.starts_with("error=")));

    // The claim taken while checking was given back.
    enabled.publish(true);
    assert_eq!(command.execute(1)?.value(), Some(&2));
    assert_eq!(command.channels().execution_count().current(), Some(1));
    Ok(())
}

#[test]
fn test_concurrent_callers_never_overlap() {
    init_tracing();

    let inside = Arc::new(AtomicUsize::new(0));
    let overlaps = Arc::new(AtomicUsize::new(0));
    let command = {
        let inside = Arc::clone(&inside);
        let overlaps = Arc::clone(&overlaps);
        Command::from_fn(move |_: ()| {
            if inside.fetch_add(1, Ordering::SeqCst) > 0 {
                overlaps.fetch_add(1, Ordering::SeqCst);
            }
            std::thread::yield_now();
            inside.fetch_sub(1, Ordering::SeqCst);
        })
    };
    let errors = Recorder::attach(command.channels().error());

    let accepted = Arc::new(AtomicUsize::new(0));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let command = command.clone();
            let accepted = Arc::clone(&accepted);
            std::thread::spawn(move || {
                for _ in 0..200 {
                    if let Ok(Execution::Done(Some(()))) = command.execute_unit() {
                        accepted.fetch_add(1, Ordering::SeqCst);
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let accepted = accepted.load(Ordering::SeqCst);
    assert_eq!(overlaps.load(Ordering::SeqCst), 0);
    assert_eq!(accepted + errors.len(), 800);
    assert_eq!(command.channels().execution_count().current(), Some(accepted as u64));
    assert_eq!(command.channels().is_executing().current(), Some(false));
}

#[test]
fn test_progress_reporting_body() -> TestResult {
    init_tracing();

    let command = Command::new(Strategy::sync_with_progress(|progress: &Progress, steps: u32| {
        for step in 1..=steps {
            progress.set(f64::from(step) / f64::from(steps));
        }
        // Regressions are ignored.
        progress.set(0.1);
        Ok(steps)
    }));
    let progress = Recorder::attach(command.channels().progress());

    let _ = command.execute(4)?;

    assert_eq!(progress.values(), vec![0.0, 0.25, 0.5, 0.75, 1.0, 0.0]);
    Ok(())
}

#[test]
fn test_late_result_subscriber_gets_replay() -> TestResult {
    init_tracing();

    let command = Command::from_fn(|s: &'static str| s.len());
    let _ = command.execute("four")?;
    let _ = command.execute("seven")?;

    let late = Recorder::attach(command.channels().result());
    assert_eq!(late.values(), vec![5]);
    Ok(())
}

#[test]
fn test_body_runs_on_caller_thread() -> TestResult {
    init_tracing();

    let caller = std::thread::current().id();
    let command = Command::from_fn(move |_: ()| std::thread::current().id() == caller);

    assert_eq!(command.execute_unit()?.value(), Some(&true));
    Ok(())
}

#[test]
fn test_body_invoked_once_per_accepted_invocation() -> TestResult {
    init_tracing();

    let calls = Arc::new(AtomicUsize::new(0));
    let enabled = Channel::with_value(true);
    let counter = Arc::clone(&calls);
    let command = Command::builder(Strategy::sync(move |_: ()| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }))
    .can_execute(enabled.clone())
    .build();

    let _ = command.execute_unit()?;
    enabled.publish(false);
    let _ = command.execute_unit();
    enabled.publish(true);
    let _ = command.execute_unit()?;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(command.channels().execution_count().current(), Some(2));
    Ok(())
}

#[test]
fn test_trait_object_surface() -> TestResult {
    init_tracing();

    let commands: Vec<Box<dyn ReactiveCommand<i32, Output = i32>>> = vec![
        Box::new(Command::from_fn(|x: i32| x + 1)),
        Box::new(Command::from_fn(|x: i32| x * 10)),
    ];

    let mut outputs = Vec::new();
    for command in &commands {
        assert!(command.is_blocking());
        outputs.push(command.execute(4)?.into_value());
        assert_eq!(command.execution_count().current(), Some(1));
    }

    assert_eq!(outputs, vec![Some(5), Some(40)]);
    assert_ne!(commands[0].id(), commands[1].id());
    Ok(())
}

#[test]
fn test_panicking_body_releases_command() {
    init_tracing();

    let command = Command::new(Strategy::sync(|fail: bool| {
        if fail {
            panic!("body blew up");
        }
        Ok(1)
    }));
    let errors = Recorder::attach(command.channels().error());

    let handle = command.clone();
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handle.execute(true)));
    assert!(outcome.is_err());

    assert!(matches!(errors.last(), Some(CommandError::Abandoned { .. })));
    assert_eq!(command.channels().is_executing().current(), Some(false));
    assert_eq!(command.channels().can_execute().current(), Some(true));
    assert_eq!(command.execute(false).map(Execution::into_value).ok(), Some(Some(1)));
}
