//! Scenario runner: fixture setup, step execution, teardown and reporting

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::{Launcher, Page};
use crate::scenario::{Scenario, Step, Viewport};
use crate::wait::{wait_until, Condition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    /// The page did not behave as expected
    Failed,
    /// The scenario could not run to a verdict
    Errored,
}

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Screenshot {
    pub path: PathBuf,
    pub sha256: String,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub status: TestStatus,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
    pub success_message: Option<String>,
    pub screenshot: Option<Screenshot>,
}

impl ScenarioResult {
    pub fn passed(&self) -> bool {
        self.status == TestStatus::Passed
    }

    fn errored(name: &str, started: Instant, err: &E2eError) -> Self {
        Self {
            name: name.to_string(),
            status: TestStatus::Errored,
            duration_ms: started.elapsed().as_millis() as u64,
            steps: Vec::new(),
            error: Some(err.to_string()),
            success_message: None,
            screenshot: None,
        }
    }
}

/// Result of running a set of scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteResult {
    pub started_at: DateTime<Utc>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration_ms: u64,
    pub results: Vec<ScenarioResult>,
}

impl SuiteResult {
    pub fn all_passed(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Directory fixture files are resolved against
    pub fixture_dir: PathBuf,

    /// Output directory for results and screenshots
    pub output_dir: PathBuf,

    /// Capture a screenshot when a scenario fails
    pub screenshot_on_failure: bool,

    /// Overrides the scenario's viewport
    pub viewport: Option<Viewport>,

    /// Overrides the scenario's wait timeout
    pub wait_timeout: Option<Duration>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            fixture_dir: PathBuf::from("."),
            output_dir: PathBuf::from("test-results"),
            screenshot_on_failure: true,
            viewport: None,
            wait_timeout: None,
        }
    }
}

/// Runs scenarios, each in a fresh browser session
pub struct TestRunner {
    launcher: Box<dyn Launcher>,
    config: RunnerConfig,
}

impl TestRunner {
    pub fn new(launcher: Box<dyn Launcher>) -> Self {
        Self::with_config(launcher, RunnerConfig::default())
    }

    pub fn with_config(launcher: Box<dyn Launcher>, config: RunnerConfig) -> Self {
        Self { launcher, config }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run all scenarios in a directory
    pub async fn run_all(&self, dir: &Path) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(dir)?;
        if scenarios.is_empty() {
            return Err(E2eError::ScenarioNotFound(format!(
                "no *.yaml or *.yml files in {}",
                dir.display()
            )));
        }
        Ok(self.run_scenarios(&scenarios).await)
    }

    /// Run scenarios in a directory matching a tag
    pub async fn run_tagged(&self, dir: &Path, tag: &str) -> E2eResult<SuiteResult> {
        let scenarios = Scenario::load_all(dir)?;
        let filtered: Vec<Scenario> = Scenario::filter_by_tag(&scenarios, tag)
            .into_iter()
            .cloned()
            .collect();
        if filtered.is_empty() {
            return Err(E2eError::ScenarioNotFound(format!(
                "tag '{}' in {}",
                tag,
                dir.display()
            )));
        }
        Ok(self.run_scenarios(&filtered).await)
    }

    /// Run a specific scenario from a directory by name
    pub async fn run_named(&self, dir: &Path, name: &str) -> E2eResult<SuiteResult> {
        let scenario = Scenario::load_all(dir)?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::ScenarioNotFound(name.to_string()))?;
        Ok(self.run_scenarios(std::slice::from_ref(&scenario)).await)
    }

    /// Run a list of scenarios in order
    pub async fn run_scenarios(&self, scenarios: &[Scenario]) -> SuiteResult {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut results = Vec::with_capacity(scenarios.len());

        info!("Running {} scenario(s)...", scenarios.len());

        for scenario in scenarios {
            let result = self.run_scenario(scenario).await;
            match result.status {
                TestStatus::Passed => info!("✓ {} ({} ms)", result.name, result.duration_ms),
                TestStatus::Failed => error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown failure")
                ),
                TestStatus::Errored => error!(
                    "! {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                ),
            }
            results.push(result);
        }

        let count = |status: TestStatus| results.iter().filter(|r| r.status == status).count();
        let passed = count(TestStatus::Passed);
        let failed = count(TestStatus::Failed);
        let errored = count(TestStatus::Errored);
        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Scenario results: {} passed, {} failed, {} errored ({} ms)",
            passed, failed, errored, duration_ms
        );

        SuiteResult {
            started_at,
            total: scenarios.len(),
            passed,
            failed,
            errored,
            duration_ms,
            results,
        }
    }

    /// Run one scenario in a fresh browser session.
    ///
    /// Never returns an error: setup problems, browser errors and failed
    /// expectations are all folded into the result's status.
    pub async fn run_scenario(&self, scenario: &Scenario) -> ScenarioResult {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        // A missing fixture aborts before any browser is started
        let url = match self.fixture_url(scenario) {
            Ok(url) => url,
            Err(e) => return ScenarioResult::errored(&scenario.name, start, &e),
        };

        let viewport = self.config.viewport.unwrap_or(scenario.viewport);
        let page = match self.launcher.launch(viewport).await {
            Ok(page) => page,
            Err(e) => return ScenarioResult::errored(&scenario.name, start, &e),
        };

        let mut steps = Vec::with_capacity(scenario.steps.len());
        let outcome = self.execute(page.as_ref(), scenario, &url, &mut steps).await;

        let screenshot = match &outcome {
            Err(_) if self.config.screenshot_on_failure => {
                match self.capture_failure_screenshot(page.as_ref(), &scenario.name).await {
                    Ok(shot) => Some(shot),
                    Err(e) => {
                        warn!("Could not capture failure screenshot: {}", e);
                        None
                    }
                }
            }
            _ => None,
        };

        if let Err(e) = page.quit().await {
            warn!("Failed to close browser session: {}", e);
        }

        let (status, error) = match outcome {
            Ok(()) => (TestStatus::Passed, None),
            Err(e) if e.is_failure() => (TestStatus::Failed, Some(failure_text(e))),
            Err(e) => (TestStatus::Errored, Some(e.to_string())),
        };

        ScenarioResult {
            name: scenario.name.clone(),
            status,
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error,
            success_message: match status {
                TestStatus::Passed => scenario.success_message.clone(),
                _ => None,
            },
            screenshot,
        }
    }

    /// Resolve the scenario's fixture to a `file://` URL
    pub fn fixture_url(&self, scenario: &Scenario) -> E2eResult<String> {
        let path = self.config.fixture_dir.join(&scenario.fixture);
        if !path.is_file() {
            return Err(E2eError::FixtureNotFound {
                name: scenario.fixture.clone(),
                path,
            });
        }

        let absolute = path.canonicalize()?;
        reqwest::Url::from_file_path(&absolute)
            .map(|url| url.to_string())
            .map_err(|_| {
                E2eError::ScenarioParse(format!(
                    "cannot build a file URL for {}",
                    absolute.display()
                ))
            })
    }

    /// Open the fixture and run every step, stopping at the first failure
    async fn execute(
        &self,
        page: &dyn Page,
        scenario: &Scenario,
        url: &str,
        results: &mut Vec<StepResult>,
    ) -> E2eResult<()> {
        page.open(url).await?;

        let timeout = self
            .config
            .wait_timeout
            .unwrap_or(Duration::from_millis(scenario.wait_timeout_ms));
        let poll = Duration::from_millis(scenario.poll_interval_ms);
        let mut captures: HashMap<String, String> = HashMap::new();

        for step in &scenario.steps {
            let step_start = Instant::now();
            let step_name = step.label();
            debug!("Executing step: {}", step_name);

            let outcome = execute_step(page, step, timeout, poll, &mut captures).await;
            let duration_ms = step_start.elapsed().as_millis() as u64;

            match outcome {
                Ok(()) => results.push(StepResult {
                    step_name,
                    success: true,
                    duration_ms,
                    error: None,
                }),
                Err(e) => {
                    results.push(StepResult {
                        step_name,
                        success: false,
                        duration_ms,
                        error: Some(e.to_string()),
                    });
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    async fn capture_failure_screenshot(
        &self,
        page: &dyn Page,
        name: &str,
    ) -> E2eResult<Screenshot> {
        let png = page.screenshot_png().await?;
        let dir = self.config.output_dir.join("screenshots");
        std::fs::create_dir_all(&dir)?;

        let path = dir.join(format!("{}-failure.png", file_stem(name)));
        std::fs::write(&path, &png)?;

        let sha256 = hex::encode(Sha256::digest(&png));
        info!("Failure screenshot written to {}", path.display());
        Ok(Screenshot { path, sha256 })
    }

    /// Write suite results to a JSON file in the output directory
    pub fn write_results(&self, results: &SuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let path = self.config.output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

async fn execute_step(
    page: &dyn Page,
    step: &Step,
    timeout: Duration,
    poll: Duration,
    captures: &mut HashMap<String, String>,
) -> E2eResult<()> {
    match step {
        Step::WaitClickable { locator, on_timeout } => {
            let condition = Condition::Clickable { locator: locator.clone() };
            explain_timeout(wait_until(page, &condition, timeout, poll).await, on_timeout)
        }
        Step::WaitText { locator, text, on_timeout } => {
            let condition = Condition::TextPresent {
                locator: locator.clone(),
                text: text.clone(),
            };
            explain_timeout(wait_until(page, &condition, timeout, poll).await, on_timeout)
        }
        Step::WaitVisible { locator, on_timeout } => {
            let condition = Condition::Visible { locator: locator.clone() };
            explain_timeout(wait_until(page, &condition, timeout, poll).await, on_timeout)
        }
        Step::Click { locator } => page.click(locator).await,
        Step::SendKeys { locator, text } => page.send_keys(locator, text).await,
        Step::Clear { locator } => page.clear(locator).await,
        Step::Capture { locator, name } => {
            let text = page.text(locator).await?;
            debug!("Captured {} = {:?}", name, text);
            captures.insert(name.clone(), text);
            Ok(())
        }
        Step::AssertText { locator, equals, message } => {
            let actual = page.text(locator).await?;
            if &actual == equals {
                return Ok(());
            }
            let context = message.clone().unwrap_or_else(|| locator.to_string());
            Err(E2eError::AssertionFailed(format!(
                "{} (expected {:?}, got {:?})",
                context, equals, actual
            )))
        }
        Step::AssertVisible { locator, message } => {
            if page.is_displayed(locator).await? {
                return Ok(());
            }
            Err(E2eError::AssertionFailed(
                message
                    .clone()
                    .unwrap_or_else(|| format!("{} is not visible", locator)),
            ))
        }
        Step::AssertUnchanged { locator, captured, message } => {
            let before = captures
                .get(captured)
                .ok_or_else(|| E2eError::UnknownCapture(captured.clone()))?;
            let after = page.text(locator).await?;
            if &after == before {
                return Ok(());
            }
            let text = match message {
                Some(m) => m.replace("{before}", before).replace("{after}", &after),
                None => format!("{} changed from {:?} to {:?}", locator, before, after),
            };
            Err(E2eError::AssertionFailed(text))
        }
        Step::Log { message } => {
            info!("[SCENARIO] {}", message);
            Ok(())
        }
    }
}

/// Replace a raw timeout with the step's own failure message
fn explain_timeout(result: E2eResult<()>, on_timeout: &Option<String>) -> E2eResult<()> {
    match (result, on_timeout) {
        (Err(E2eError::Timeout { condition, waited_ms }), Some(message)) => {
            debug!("Timed out after {} ms waiting for {}", waited_ms, condition);
            Err(E2eError::AssertionFailed(message.clone()))
        }
        (result, _) => result,
    }
}

/// Failure text without the error-kind prefix
fn failure_text(err: E2eError) -> String {
    match err {
        E2eError::AssertionFailed(message) => message,
        other => other.to_string(),
    }
}

fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
