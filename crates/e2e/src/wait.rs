//! Polling waits for page conditions

use std::fmt;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace};

use crate::error::{E2eError, E2eResult};
use crate::page::Page;
use crate::scenario::Locator;

/// Something expected to become true on the page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Element text contains the given string
    TextPresent { locator: Locator, text: String },
    /// Element is displayed
    Visible { locator: Locator },
    /// Element is displayed and enabled
    Clickable { locator: Locator },
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::TextPresent { locator, text } => {
                write!(f, "text '{}' in {}", text, locator)
            }
            Condition::Visible { locator } => write!(f, "{} to be visible", locator),
            Condition::Clickable { locator } => write!(f, "{} to be clickable", locator),
        }
    }
}

impl Condition {
    /// Check the condition once
    pub async fn check(&self, page: &dyn Page) -> E2eResult<bool> {
        match self {
            Condition::TextPresent { locator, text } => {
                Ok(page.text(locator).await?.contains(text.as_str()))
            }
            Condition::Visible { locator } => page.is_displayed(locator).await,
            Condition::Clickable { locator } => page.is_clickable(locator).await,
        }
    }
}

/// Wait until `condition` holds, checking immediately and then every `poll`.
///
/// Lookup errors while polling count as "not yet"; the element may not have
/// been rendered. Returns [`E2eError::Timeout`] once `timeout` has elapsed.
pub async fn wait_until(
    page: &dyn Page,
    condition: &Condition,
    timeout: Duration,
    poll: Duration,
) -> E2eResult<()> {
    let start = Instant::now();
    let deadline = start + timeout;

    loop {
        match condition.check(page).await {
            Ok(true) => {
                debug!("Condition met after {} ms: {}", start.elapsed().as_millis(), condition);
                return Ok(());
            }
            Ok(false) => trace!("Condition not met yet: {}", condition),
            Err(e) => trace!("Condition check failed ({}): {}", condition, e),
        }

        let now = Instant::now();
        if now >= deadline {
            return Err(E2eError::Timeout {
                condition: condition.to_string(),
                waited_ms: start.elapsed().as_millis() as u64,
            });
        }
        sleep(poll.min(deadline - now)).await;
    }
}
