//! Declarative YAML scenario definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario (e.g. the test case id)
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Local HTML file the scenario loads, relative to the fixture directory
    pub fixture: String,

    /// Viewport size for the browser
    #[serde(default = "default_viewport")]
    pub viewport: Viewport,

    /// Ceiling for every wait step
    #[serde(default = "default_wait_timeout")]
    pub wait_timeout_ms: u64,

    /// Delay between condition checks while waiting
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Printed when every step passed
    #[serde(default)]
    pub success_message: Option<String>,

    /// Steps to execute in order
    pub steps: Vec<Step>,
}

fn default_viewport() -> Viewport {
    Viewport {
        width: 1920,
        height: 1080,
    }
}

fn default_wait_timeout() -> u64 {
    10_000
}

fn default_poll_interval() -> u64 {
    500
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// How to find an element on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locator {
    Id(String),
    #[serde(rename = "xpath")]
    XPath(String),
    Css(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::XPath(xpath) => write!(f, "xpath={}", xpath),
            Locator::Css(css) => write!(f, "css={}", css),
        }
    }
}

/// A single step in a scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Wait until an element is displayed and enabled
    WaitClickable {
        locator: Locator,
        #[serde(default)]
        on_timeout: Option<String>,
    },

    /// Wait until an element's text contains a string
    WaitText {
        locator: Locator,
        text: String,
        #[serde(default)]
        on_timeout: Option<String>,
    },

    /// Wait until an element is displayed
    WaitVisible {
        locator: Locator,
        #[serde(default)]
        on_timeout: Option<String>,
    },

    /// Click an element
    Click { locator: Locator },

    /// Type text into an element
    SendKeys { locator: Locator, text: String },

    /// Clear an input
    Clear { locator: Locator },

    /// Remember an element's current text under a name
    Capture { locator: Locator, name: String },

    /// Assert an element's text equals a value exactly
    AssertText {
        locator: Locator,
        equals: String,
        #[serde(default)]
        message: Option<String>,
    },

    /// Assert an element is displayed
    AssertVisible {
        locator: Locator,
        #[serde(default)]
        message: Option<String>,
    },

    /// Assert an element's text still equals a captured value.
    /// `message` may contain `{before}` and `{after}`.
    AssertUnchanged {
        locator: Locator,
        captured: String,
        #[serde(default)]
        message: Option<String>,
    },

    /// Log a message
    Log { message: String },
}

impl Step {
    /// Short label used in logs and step results
    pub fn label(&self) -> String {
        match self {
            Step::WaitClickable { locator, .. } => format!("wait_clickable:{}", locator),
            Step::WaitText { locator, text, .. } => format!("wait_text:{}={}", locator, text),
            Step::WaitVisible { locator, .. } => format!("wait_visible:{}", locator),
            Step::Click { locator } => format!("click:{}", locator),
            Step::SendKeys { locator, text } => format!("send_keys:{}={}", locator, text),
            Step::Clear { locator } => format!("clear:{}", locator),
            Step::Capture { locator, name } => format!("capture:{}->{}", locator, name),
            Step::AssertText { locator, equals, .. } => {
                format!("assert_text:{}={}", locator, equals)
            }
            Step::AssertVisible { locator, .. } => format!("assert_visible:{}", locator),
            Step::AssertUnchanged { locator, captured, .. } => {
                format!("assert_unchanged:{}=={}", locator, captured)
            }
            Step::Log { message } => {
                let short: String = message.chars().take(30).collect();
                format!("log:{}", short)
            }
        }
    }
}

impl Scenario {
    /// Parse a scenario from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content).map_err(|e| match e {
            E2eError::Yaml(e) => E2eError::ScenarioParse(format!("{}: {}", path.display(), e)),
            E2eError::ScenarioParse(msg) => {
                E2eError::ScenarioParse(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })
    }

    /// Load all scenarios from a directory, sorted by name
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::ScenarioNotFound(format!(
                "directory {}",
                dir.display()
            )));
        }

        let mut scenarios = Vec::new();
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry.map_err(std::io::Error::from)?;
            let is_yaml = entry
                .path()
                .extension()
                .map(|ext| ext == "yaml" || ext == "yml")
                .unwrap_or(false);
            if is_yaml {
                scenarios.push(Self::from_file(entry.path())?);
            }
        }

        scenarios.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(scenarios)
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag<'a>(scenarios: &'a [Self], tag: &str) -> Vec<&'a Self> {
        scenarios
            .iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }

    /// Reject scenarios that could never pass: empty step lists and
    /// `assert_unchanged` steps referring to a value no earlier step captures.
    fn validate(&self) -> E2eResult<()> {
        if self.steps.is_empty() {
            return Err(E2eError::ScenarioParse(format!(
                "scenario '{}' has no steps",
                self.name
            )));
        }
        if self.poll_interval_ms == 0 {
            return Err(E2eError::ScenarioParse(format!(
                "scenario '{}' has a zero poll interval",
                self.name
            )));
        }

        let mut captured: Vec<&str> = Vec::new();
        for step in &self.steps {
            match step {
                Step::Capture { name, .. } => captured.push(name.as_str()),
                Step::AssertUnchanged { captured: name, .. }
                    if !captured.contains(&name.as_str()) =>
                {
                    return Err(E2eError::ScenarioParse(format!(
                        "scenario '{}' compares against '{}' before capturing it",
                        self.name, name
                    )));
                }
                _ => {}
            }
        }
        Ok(())
    }
}
