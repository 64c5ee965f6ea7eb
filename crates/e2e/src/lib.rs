//! Checkout E2E Test Framework
//!
//! This crate drives a real browser over WebDriver against the e-shop
//! checkout page and checks what it renders:
//! - Spawns (or connects to) a WebDriver server such as chromedriver
//! - Opens a fresh headless session per scenario with a fixed viewport
//! - Parses declarative YAML scenarios
//! - Polls for page conditions with a timeout and asserts on rendered text
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 Checkout E2E Runner (Rust)                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── fixture_url(scenario) -> file:// URL                 │
//! │    ├── Launcher::launch(viewport) -> Box<dyn Page>          │
//! │    ├── run_scenario(scenario) -> ScenarioResult             │
//! │    └── write_results(suite) -> test-results.json            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, fixture, viewport, wait_timeout_ms             │
//! │    └── steps: [Step]                                        │
//! │          ├── wait_clickable | wait_text | wait_visible      │
//! │          ├── click | send_keys | clear                      │
//! │          ├── capture { locator, name }                      │
//! │          └── assert_text | assert_visible | assert_unchanged│
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod builtin;
pub mod driver;
pub mod error;
pub mod page;
pub mod runner;
pub mod scenario;
pub mod wait;
pub mod webdriver;

pub use error::{E2eError, E2eResult};
pub use page::{Launcher, Page};
pub use runner::{RunnerConfig, ScenarioResult, SuiteResult, TestRunner, TestStatus};
pub use scenario::{Locator, Scenario, Step, Viewport};
