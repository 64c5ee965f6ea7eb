//! Browser page abstraction
//!
//! The runner only talks to a browser through these traits. The WebDriver
//! implementation lives in [`crate::webdriver`]; tests drive an in-memory page.

use async_trait::async_trait;

use crate::error::E2eResult;
use crate::scenario::{Locator, Viewport};

/// One open browser session showing one page
#[async_trait]
pub trait Page: Send + Sync {
    /// Load a URL and wait for the document to be ready
    async fn open(&self, url: &str) -> E2eResult<()>;

    async fn click(&self, locator: &Locator) -> E2eResult<()>;

    async fn send_keys(&self, locator: &Locator, text: &str) -> E2eResult<()>;

    async fn clear(&self, locator: &Locator) -> E2eResult<()>;

    /// Rendered text of the element
    async fn text(&self, locator: &Locator) -> E2eResult<String>;

    async fn is_displayed(&self, locator: &Locator) -> E2eResult<bool>;

    /// Displayed and enabled
    async fn is_clickable(&self, locator: &Locator) -> E2eResult<bool>;

    /// PNG of the current viewport
    async fn screenshot_png(&self) -> E2eResult<Vec<u8>>;

    /// End the session. The page must not be used afterwards.
    async fn quit(&self) -> E2eResult<()>;
}

/// Opens fresh browser sessions, one per scenario
#[async_trait]
pub trait Launcher: Send + Sync {
    async fn launch(&self, viewport: Viewport) -> E2eResult<Box<dyn Page>>;
}
