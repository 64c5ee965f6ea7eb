//! WebDriver browser automation via thirtyfour

use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use thirtyfour::prelude::*;
use thirtyfour::ChromiumLikeCapabilities;
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::page::{Launcher, Page};
use crate::scenario::{Locator, Viewport};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chrome,
    Firefox,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chrome => "chrome",
            Browser::Firefox => "firefox",
        }
    }

    /// Default driver binary for this browser
    pub fn driver_binary(&self) -> &'static str {
        match self {
            Browser::Chrome => "chromedriver",
            Browser::Firefox => "geckodriver",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chrome" | "chromium" => Ok(Browser::Chrome),
            "firefox" => Ok(Browser::Firefox),
            other => Err(format!(
                "unsupported browser '{}' (expected chrome or firefox)",
                other
            )),
        }
    }
}

/// Configuration for WebDriver sessions
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// URL of the WebDriver server
    pub webdriver_url: String,
    pub browser: Browser,
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://127.0.0.1:9515".to_string(),
            browser: Browser::Chrome,
            headless: true,
        }
    }
}

/// Launches a new WebDriver session per scenario
pub struct WebDriverLauncher {
    config: BrowserConfig,
}

impl WebDriverLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BrowserConfig {
        &self.config
    }

    async fn new_session(&self, viewport: Viewport) -> E2eResult<WebDriver> {
        let url = &self.config.webdriver_url;
        let driver = match self.config.browser {
            Browser::Chrome => {
                let mut caps = DesiredCapabilities::chrome();
                if self.config.headless {
                    caps.add_arg("--headless")?;
                }
                let window_size = format!("--window-size={},{}", viewport.width, viewport.height);
                caps.add_arg(&window_size)?;
                WebDriver::new(url.as_str(), caps).await?
            }
            Browser::Firefox => {
                let mut caps = DesiredCapabilities::firefox();
                if self.config.headless {
                    caps.set_headless()?;
                }
                let driver = WebDriver::new(url.as_str(), caps).await?;
                let sized = driver
                    .set_window_rect(0, 0, viewport.width, viewport.height)
                    .await
                    .map_err(E2eError::from);
                quit_on_error(sized, driver.clone().quit()).await?;
                driver
            }
        };
        Ok(driver)
    }
}

/// Pass `result` through, running `quit` first when it is an error.
///
/// Used once a session exists but its setup failed, so the server does not
/// keep an orphaned browser around.
async fn quit_on_error<T, F, E>(result: E2eResult<T>, quit: F) -> E2eResult<T>
where
    F: Future<Output = Result<(), E>>,
    E: Display,
{
    if let Err(err) = &result {
        warn!("Session setup failed, closing session: {}", err);
        if let Err(quit_err) = quit.await {
            warn!("Failed to close session: {}", quit_err);
        }
    }
    result
}

#[async_trait]
impl Launcher for WebDriverLauncher {
    async fn launch(&self, viewport: Viewport) -> E2eResult<Box<dyn Page>> {
        info!(
            "Starting {} session ({}x{}, headless: {}) at {}",
            self.config.browser.as_str(),
            viewport.width,
            viewport.height,
            self.config.headless,
            self.config.webdriver_url
        );
        let driver = self.new_session(viewport).await?;
        Ok(Box::new(WebDriverPage { driver }))
    }
}

/// A page inside a live WebDriver session
pub struct WebDriverPage {
    driver: WebDriver,
}

impl WebDriverPage {
    async fn find(&self, locator: &Locator) -> E2eResult<WebElement> {
        let by = match locator {
            Locator::Id(id) => By::Id(id.as_str()),
            Locator::XPath(xpath) => By::XPath(xpath.as_str()),
            Locator::Css(css) => By::Css(css.as_str()),
        };
        Ok(self.driver.find(by).await?)
    }
}

#[async_trait]
impl Page for WebDriverPage {
    async fn open(&self, url: &str) -> E2eResult<()> {
        debug!("Navigating to {}", url);
        self.driver.goto(url).await?;
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        self.find(locator).await?.click().await?;
        Ok(())
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        self.find(locator).await?.send_keys(text).await?;
        Ok(())
    }

    async fn clear(&self, locator: &Locator) -> E2eResult<()> {
        self.find(locator).await?.clear().await?;
        Ok(())
    }

    async fn text(&self, locator: &Locator) -> E2eResult<String> {
        Ok(self.find(locator).await?.text().await?)
    }

    async fn is_displayed(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.find(locator).await?.is_displayed().await?)
    }

    async fn is_clickable(&self, locator: &Locator) -> E2eResult<bool> {
        Ok(self.find(locator).await?.is_clickable().await?)
    }

    async fn screenshot_png(&self) -> E2eResult<Vec<u8>> {
        Ok(self.driver.screenshot_as_png().await?)
    }

    async fn quit(&self) -> E2eResult<()> {
        debug!("Closing WebDriver session");
        self.driver.clone().quit().await?;
        Ok(())
    }
}
