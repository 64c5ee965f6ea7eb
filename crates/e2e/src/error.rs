//! Error types for checkout E2E runs

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("WebDriver server failed to start: {0}")]
    DriverStartup(String),

    #[error("WebDriver health check failed after {0} attempts")]
    DriverHealthCheck(usize),

    #[error(
        "'{name}' not found at {}. Place the fixture in the fixture directory \
         or pass --fixture-dir",
        .path.display()
    )]
    FixtureNotFound { name: String, path: PathBuf },

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Scenario not found: {0}")]
    ScenarioNotFound(String),

    #[error("Timed out after {waited_ms} ms waiting for {condition}")]
    Timeout { condition: String, waited_ms: u64 },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("No captured value named '{0}'")]
    UnknownCapture(String),

    #[error("WebDriver error: {0}")]
    WebDriver(#[from] thirtyfour::error::WebDriverError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// Whether this error is a test failure (the page misbehaved) rather than
    /// an error in the harness or its environment.
    pub fn is_failure(&self) -> bool {
        matches!(self, E2eError::Timeout { .. } | E2eError::AssertionFailed(_))
    }
}

pub type E2eResult<T> = Result<T, E2eError>;
