//! Loading scenario directories and reporting suite results

mod common;

use std::path::Path;

use checkout_e2e::{E2eError, RunnerConfig, SuiteResult, TestRunner};
use common::{fixture_dir, Behavior, FakeLauncher};

const DC003: &str = include_str!("../scenarios/dc003_second_discount_code.yaml");

const SUBTOTAL_ONLY: &str = r#"
name: subtotal-after-add
tags: [cart]
fixture: checkout.html
steps:
  - action: click
    locator: { xpath: "//h3[text()='Mechanical Keyboard']/following-sibling::div/button" }
  - action: wait_text
    locator: { id: subtotal }
    text: "$100.00"
"#;

const MISSING_FIXTURE: &str = r#"
name: other-page
tags: [cart]
fixture: not-here.html
steps:
  - action: log
    message: never runs
"#;

fn scenario_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("dc003.yaml"), DC003).unwrap();
    std::fs::write(dir.path().join("subtotal.yaml"), SUBTOTAL_ONLY).unwrap();
    std::fs::write(dir.path().join("missing.yml"), MISSING_FIXTURE).unwrap();
    dir
}

fn runner(behavior: Behavior, fixtures: &Path, output: &Path) -> TestRunner {
    TestRunner::with_config(
        Box::new(FakeLauncher::new(behavior)),
        RunnerConfig {
            fixture_dir: fixtures.to_path_buf(),
            output_dir: output.to_path_buf(),
            ..Default::default()
        },
    )
}

#[tokio::test(start_paused = true)]
async fn run_all_counts_each_status() {
    let scenarios = scenario_dir();
    let fixtures = fixture_dir();
    let output = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::StackSecond, fixtures.path(), output.path());

    let suite = runner.run_all(scenarios.path()).await.unwrap();

    assert_eq!(suite.total, 3);
    assert_eq!(suite.passed, 1);
    assert_eq!(suite.failed, 1);
    assert_eq!(suite.errored, 1);
    assert!(!suite.all_passed());

    // Scenarios run in name order
    let names: Vec<_> = suite.results.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["DC-003", "other-page", "subtotal-after-add"]);
}

#[tokio::test(start_paused = true)]
async fn run_tagged_filters_scenarios() {
    let scenarios = scenario_dir();
    let fixtures = fixture_dir();
    let output = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::RejectSecond, fixtures.path(), output.path());

    let suite = runner.run_tagged(scenarios.path(), "discount").await.unwrap();

    assert_eq!(suite.total, 1);
    assert_eq!(suite.results[0].name, "DC-003");
    assert!(suite.all_passed());
}

#[tokio::test(start_paused = true)]
async fn run_named_reports_unknown_scenario() {
    let scenarios = scenario_dir();
    let fixtures = fixture_dir();
    let output = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::RejectSecond, fixtures.path(), output.path());

    let suite = runner.run_named(scenarios.path(), "subtotal-after-add").await.unwrap();
    assert_eq!(suite.passed, 1);

    let err = runner.run_named(scenarios.path(), "DC-999").await.unwrap_err();
    assert!(matches!(err, E2eError::ScenarioNotFound(ref name) if name == "DC-999"));
}

#[tokio::test(start_paused = true)]
async fn results_are_written_as_json() {
    let scenarios = scenario_dir();
    let fixtures = fixture_dir();
    let output = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::RejectSecond, fixtures.path(), output.path());

    let suite = runner.run_tagged(scenarios.path(), "discount").await.unwrap();
    let path = runner.write_results(&suite).unwrap();

    assert_eq!(path, output.path().join("test-results.json"));
    let json = std::fs::read_to_string(&path).unwrap();
    let written: SuiteResult = serde_json::from_str(&json).unwrap();
    assert_eq!(written.total, 1);
    assert_eq!(written.passed, 1);
    assert_eq!(written.results[0].steps.len(), suite.results[0].steps.len());

    let raw: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(raw["results"][0]["status"], "passed");
}

#[tokio::test]
async fn invalid_scenario_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.yaml"), "name: bad\nsteps: not-a-list\n").unwrap();
    let fixtures = fixture_dir();
    let output = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::RejectSecond, fixtures.path(), output.path());

    let err = runner.run_all(dir.path()).await.unwrap_err();
    assert!(matches!(err, E2eError::ScenarioParse(_)));
}

#[tokio::test]
async fn missing_scenario_directory_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    let fixtures = fixture_dir();
    let output = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::RejectSecond, fixtures.path(), output.path());

    let err = runner.run_all(&root.path().join("scenarioz")).await.unwrap_err();
    assert!(matches!(err, E2eError::ScenarioNotFound(ref what) if what.contains("scenarioz")));
}

#[tokio::test]
async fn empty_scenario_directory_is_an_error() {
    let empty = tempfile::tempdir().unwrap();
    let fixtures = fixture_dir();
    let output = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::RejectSecond, fixtures.path(), output.path());

    let err = runner.run_all(empty.path()).await.unwrap_err();
    assert!(matches!(err, E2eError::ScenarioNotFound(_)));
}

#[tokio::test]
async fn unmatched_tag_is_an_error() {
    let scenarios = scenario_dir();
    let fixtures = fixture_dir();
    let output = tempfile::tempdir().unwrap();
    let runner = runner(Behavior::RejectSecond, fixtures.path(), output.path());

    let err = runner.run_tagged(scenarios.path(), "no-such-tag").await.unwrap_err();
    assert!(matches!(err, E2eError::ScenarioNotFound(ref what) if what.contains("no-such-tag")));
    assert!(!output.path().join("test-results.json").exists());
}
