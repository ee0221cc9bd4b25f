// tests/scenario_config.rs

use std::io::Write;

use reactive_command::config::{
    RawScenarioFile, ScenarioFile, default_scenario_path, load_and_validate, load_from_path,
};
use reactive_command::errors::EngineError;
use reactive_command::types::StrategyKind;
use reactive_command_test_utils::builders::{CommandConfigBuilder, ScenarioBuilder};
use tempfile::NamedTempFile;

fn scenario_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(result: Result<ScenarioFile, EngineError>, needle: &str) {
    match result {
        Err(EngineError::ConfigError(msg)) => {
            assert!(msg.contains(needle), "message {msg:?} should mention {needle:?}");
        }
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_full_scenario_parses_with_defaults() {
    let file = scenario_file(
        r#"
[command.add_two]
add = 2

[command.slow]
kind = "async"
add = 4
delay_ms = 50
progress_steps = 5

[command.broken]
fail = "nope"

[composite.both]
children = ["add_two", "slow"]

[[run]]
target = "both"
input = 5

[[run]]
target = "broken"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config.worker_threads, 2);
    assert_eq!(cfg.command.len(), 3);
    assert_eq!(cfg.command["add_two"].kind, StrategyKind::Sync);
    assert_eq!(cfg.command["slow"].kind, StrategyKind::Async);
    assert_eq!(cfg.command["slow"].progress_steps, 5);
    assert_eq!(cfg.command["broken"].fail.as_deref(), Some("nope"));
    assert_eq!(cfg.composite["both"].children, vec!["add_two", "slow"]);
    assert_eq!(cfg.run.len(), 2);
    assert_eq!(cfg.run[1].input, 0);
}

#[test]
fn test_load_from_path_skips_validation() {
    let file = scenario_file(
        r#"
[[run]]
target = "nothing"
"#,
    );

    let raw: RawScenarioFile = load_from_path(file.path()).unwrap();
    assert!(raw.command.is_empty());
    expect_config_error(ScenarioFile::try_from(raw), "at least one");
}

#[test]
fn test_unknown_kind_is_a_toml_error() {
    let file = scenario_file(
        r#"
[command.a]
kind = "threaded"
"#,
    );

    assert!(matches!(load_and_validate(file.path()), Err(EngineError::TomlError(_))));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join(default_scenario_path());

    assert!(matches!(load_and_validate(&missing), Err(EngineError::IoError(_))));
}

#[test]
fn test_zero_worker_threads_is_rejected() {
    let raw = ScenarioBuilder::new()
        .worker_threads(0)
        .with_command("a", CommandConfigBuilder::sync(1).build())
        .raw();

    expect_config_error(ScenarioFile::try_from(raw), "worker_threads");
}

#[test]
fn test_delay_on_sync_command_is_rejected() {
    let raw = ScenarioBuilder::new()
        .with_command("a", CommandConfigBuilder::sync(1).delay_ms(10).build())
        .raw();

    expect_config_error(ScenarioFile::try_from(raw), "delay_ms");
}

#[test]
fn test_composite_with_unknown_child_is_rejected() {
    let raw = ScenarioBuilder::new()
        .with_command("a", CommandConfigBuilder::sync(1).build())
        .with_composite("all", &["a", "ghost"])
        .raw();

    expect_config_error(ScenarioFile::try_from(raw), "ghost");
}

#[test]
fn test_empty_composite_is_rejected() {
    let raw = ScenarioBuilder::new()
        .with_command("a", CommandConfigBuilder::sync(1).build())
        .with_composite("none", &[])
        .raw();

    expect_config_error(ScenarioFile::try_from(raw), "at least one child");
}

#[test]
fn test_name_clash_is_rejected() {
    let raw = ScenarioBuilder::new()
        .with_command("a", CommandConfigBuilder::sync(1).build())
        .with_composite("a", &["a"])
        .raw();

    expect_config_error(ScenarioFile::try_from(raw), "both a command and a composite");
}

#[test]
fn test_run_with_unknown_target_is_rejected() {
    let raw = ScenarioBuilder::new()
        .with_command("a", CommandConfigBuilder::sync(1).build())
        .run("a", 1)
        .run("b", 2)
        .raw();

    expect_config_error(ScenarioFile::try_from(raw), "run #2 targets unknown command 'b'");
}

#[test]
fn test_builder_produces_valid_scenario() {
    let cfg = ScenarioBuilder::new()
        .with_command("a", CommandConfigBuilder::sync(1).build())
        .with_command("b", CommandConfigBuilder::async_(2).delay_ms(5).fail("x").build())
        .with_composite("ab", &["a", "b"])
        .run("ab", 3)
        .build();

    assert_eq!(cfg.composite["ab"].children, vec!["a", "b"]);
    assert_eq!(cfg.command["b"].delay_ms, 5);
}

#[test]
fn test_strategy_kind_from_str() {
    assert_eq!(" Async ".parse::<StrategyKind>(), Ok(StrategyKind::Async));
    assert_eq!("sync".parse::<StrategyKind>(), Ok(StrategyKind::Sync));
    assert!("parallel".parse::<StrategyKind>().is_err());
}
