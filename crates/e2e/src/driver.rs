//! WebDriver server management - spawning and health checking chromedriver/geckodriver

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Handle to a running WebDriver server process
pub struct DriverHandle {
    child: Child,
    pub url: String,
    pub port: u16,
    stopped: bool,
}

/// Body of `GET /status` as defined by the W3C WebDriver spec
#[derive(Debug, Deserialize)]
struct StatusResponse {
    value: StatusValue,
}

#[derive(Debug, Deserialize)]
struct StatusValue {
    #[serde(default)]
    ready: bool,
    #[serde(default)]
    message: String,
}

impl DriverHandle {
    /// Spawn a WebDriver server and wait until it reports ready
    pub async fn spawn(config: DriverConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let url = format!("http://127.0.0.1:{}", port);

        info!("Spawning {} on port {}", config.binary_path.display(), port);

        let child = Command::new(&config.binary_path)
            .arg(format!("--port={}", port))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                E2eError::DriverStartup(format!(
                    "Failed to spawn {}: {}",
                    config.binary_path.display(),
                    e
                ))
            })?;

        let handle = DriverHandle {
            child,
            url,
            port,
            stopped: false,
        };

        handle.wait_for_ready(config.startup_timeout).await?;

        info!("WebDriver is ready at {}", handle.url);
        Ok(handle)
    }

    /// Poll `/status` until the driver accepts new sessions
    async fn wait_for_ready(&self, timeout_duration: Duration) -> E2eResult<()> {
        let status_url = format!("{}/status", self.url);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()?;

        let start = std::time::Instant::now();
        let mut attempts = 0;

        while start.elapsed() < timeout_duration {
            attempts += 1;

            match client.get(&status_url).send().await {
                Ok(resp) if resp.status().is_success() => {
                    match resp.json::<StatusResponse>().await {
                        Ok(status) if status.value.ready => return Ok(()),
                        Ok(status) => {
                            warn!("WebDriver not ready yet: {}", status.value.message);
                        }
                        Err(e) => {
                            warn!("Unreadable status response: {}", e);
                        }
                    }
                }
                Ok(resp) => {
                    warn!("Status check returned {}", resp.status());
                }
                Err(e) => {
                    if attempts == 1 {
                        info!("Waiting for WebDriver to start...");
                    }
                    // Connection refused is expected while the driver is starting
                    if !e.is_connect() {
                        warn!("Status check error: {}", e);
                    }
                }
            }

            sleep(Duration::from_millis(100)).await;
        }

        Err(E2eError::DriverHealthCheck(attempts))
    }

    /// Get the base URL for this driver
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Stop the driver: SIGTERM, a short grace period, then kill
    pub async fn shutdown(mut self) -> E2eResult<()> {
        info!("Stopping WebDriver (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                let deadline = Instant::now() + SHUTDOWN_GRACE;
                while Instant::now() < deadline {
                    if self.child.try_wait()?.is_some() {
                        self.stopped = true;
                        return Ok(());
                    }
                    sleep(Duration::from_millis(25)).await;
                }
            }
        }

        self.kill();
        Ok(())
    }

    /// Force kill without waiting for a graceful exit
    fn kill(&mut self) {
        if self.stopped {
            return;
        }
        let _ = self.child.kill();
        let _ = self.child.wait();
        self.stopped = true;
    }
}

/// How long a driver gets to exit after SIGTERM
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

impl Drop for DriverHandle {
    fn drop(&mut self) {
        self.kill();
    }
}

/// Configuration for spawning a WebDriver server
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Path to the driver binary (looked up on PATH when relative)
    pub binary_path: PathBuf,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for driver startup
    pub startup_timeout: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("chromedriver"),
            port: None,
            startup_timeout: Duration::from_secs(20),
        }
    }
}

/// Find a free port to use
fn find_free_port() -> E2eResult<u16> {
    use std::net::TcpListener;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
