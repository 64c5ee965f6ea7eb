//! Checkout E2E runner entry point
//!
//! Runs the built-in DC-003 scenario (or a directory of YAML scenarios)
//! against the local checkout page and exits non-zero on any failure.

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;
use colored::Colorize;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use checkout_e2e::driver::{DriverConfig, DriverHandle};
use checkout_e2e::webdriver::{Browser, BrowserConfig, WebDriverLauncher};
use checkout_e2e::{
    builtin, E2eResult, RunnerConfig, SuiteResult, TestRunner, TestStatus, Viewport,
};

#[derive(Parser, Debug)]
#[command(name = "checkout-e2e")]
#[command(author, version, about = "Browser E2E checks for the e-shop checkout page")]
struct Args {
    /// Directory of YAML scenarios (omit to run the built-in scenarios)
    #[arg(short, long, env = "CHECKOUT_E2E_SCENARIOS")]
    scenarios: Option<PathBuf>,

    /// Run only scenarios with this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only the scenario with this name
    #[arg(short, long)]
    name: Option<String>,

    /// Directory containing checkout.html and other fixtures
    #[arg(long, default_value = ".", env = "CHECKOUT_E2E_FIXTURE_DIR")]
    fixture_dir: PathBuf,

    /// Connect to an already running WebDriver server instead of spawning one
    #[arg(long, env = "CHECKOUT_E2E_WEBDRIVER_URL")]
    webdriver_url: Option<String>,

    /// WebDriver binary to spawn (defaults to chromedriver or geckodriver)
    #[arg(long, env = "CHECKOUT_E2E_DRIVER_BINARY")]
    driver_binary: Option<PathBuf>,

    /// Port for the spawned WebDriver (0 = auto)
    #[arg(long, default_value = "0", env = "CHECKOUT_E2E_DRIVER_PORT")]
    driver_port: u16,

    /// Browser to use (chrome, firefox)
    #[arg(long, default_value = "chrome", env = "CHECKOUT_E2E_BROWSER")]
    browser: Browser,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Viewport width (overrides the scenario)
    #[arg(long, requires = "viewport_height")]
    viewport_width: Option<u32>,

    /// Viewport height (overrides the scenario)
    #[arg(long, requires = "viewport_width")]
    viewport_height: Option<u32>,

    /// Wait timeout in milliseconds (overrides the scenario)
    #[arg(long, env = "CHECKOUT_E2E_WAIT_TIMEOUT_MS")]
    wait_timeout_ms: Option<u64>,

    /// Do not capture screenshots of failed scenarios
    #[arg(long)]
    no_screenshots: bool,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results", env = "CHECKOUT_E2E_OUTPUT")]
    output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    // Keep the spawned driver alive until every scenario has run
    let (webdriver_url, driver) = match &args.webdriver_url {
        Some(url) => (url.clone(), None),
        None => {
            let binary = args
                .driver_binary
                .clone()
                .unwrap_or_else(|| PathBuf::from(args.browser.driver_binary()));
            let driver = DriverHandle::spawn(DriverConfig {
                binary_path: binary,
                port: if args.driver_port == 0 { None } else { Some(args.driver_port) },
                ..Default::default()
            })
            .await?;
            (driver.url().to_string(), Some(driver))
        }
    };

    let launcher = WebDriverLauncher::new(BrowserConfig {
        webdriver_url,
        browser: args.browser,
        headless: !args.headed,
    });

    let viewport = match (args.viewport_width, args.viewport_height) {
        (Some(width), Some(height)) => Some(Viewport { width, height }),
        _ => None,
    };

    let runner = TestRunner::with_config(
        Box::new(launcher),
        RunnerConfig {
            fixture_dir: args.fixture_dir.clone(),
            output_dir: args.output.clone(),
            screenshot_on_failure: !args.no_screenshots,
            viewport,
            wait_timeout: args.wait_timeout_ms.map(Duration::from_millis),
        },
    );

    let outcome = run_selected(&runner, &args).await;

    if let Some(driver) = driver {
        if let Err(e) = driver.shutdown().await {
            warn!("Failed to stop WebDriver: {}", e);
        }
    }

    let results = outcome?;
    runner.write_results(&results)?;
    print_summary(&results);

    Ok(results.all_passed())
}

async fn run_selected(runner: &TestRunner, args: &Args) -> E2eResult<SuiteResult> {
    match &args.scenarios {
        Some(dir) => match (&args.name, &args.tag) {
            (Some(name), _) => runner.run_named(dir, name).await,
            (None, Some(tag)) => runner.run_tagged(dir, tag).await,
            (None, None) => runner.run_all(dir).await,
        },
        None => {
            let scenarios = builtin::select(args.name.as_deref(), args.tag.as_deref())?;
            Ok(runner.run_scenarios(&scenarios).await)
        }
    }
}

fn print_summary(results: &SuiteResult) {
    println!();
    for result in &results.results {
        match result.status {
            TestStatus::Passed => {
                println!("{} {} ({} ms)", "PASS".green().bold(), result.name, result.duration_ms);
                if let Some(message) = &result.success_message {
                    println!("     {}", message);
                }
            }
            TestStatus::Failed => {
                println!(
                    "{} {} - {}",
                    "FAIL".red().bold(),
                    result.name,
                    result.error.as_deref().unwrap_or("")
                );
            }
            TestStatus::Errored => {
                println!(
                    "{} {} - {}",
                    "ERROR".yellow().bold(),
                    result.name,
                    result.error.as_deref().unwrap_or("")
                );
            }
        }
        if let Some(shot) = &result.screenshot {
            let digest = shot.sha256.get(..12).unwrap_or(&shot.sha256);
            println!("     screenshot: {} (sha256 {})", shot.path.display(), digest);
        }
    }
    println!(
        "\n{} total, {} passed, {} failed, {} errored in {} ms",
        results.total, results.passed, results.failed, results.errored, results.duration_ms
    );
}
