//! In-memory stand-in for the checkout page, driven through the `Page` trait

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use checkout_e2e::{E2eError, E2eResult, Launcher, Locator, Page, Viewport};

pub const ADD_KEYBOARD: &str = "//h3[text()='Mechanical Keyboard']/following-sibling::div/button";
pub const APPLY: &str = "//button[text()='Apply']";
pub const FAKE_PNG: &[u8] = b"\x89PNG\r\n\x1a\nfake-checkout";

/// How the page reacts to a code once SAVE15 is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Rejects the second code and keeps SAVE15
    RejectSecond,
    /// Shows the error but still adds the second code's 10%
    StackSecond,
    /// Shows the error and hides the discount row
    HideRowOnError,
    /// Ignores the second click entirely
    SilentOnSecond,
    /// Never accepts SAVE15
    NeverApply,
    /// Applies SAVE15 as 10%
    WrongPercent,
    /// Applies SAVE15 correctly but adds $5.00 shipping with it
    ShippingAfterFirst,
    /// Rejects the second code but adds $5.00 shipping while doing so
    ShippingAfterSecond,
}

const SHIPPING_CENTS: u64 = 5_00;

#[derive(Debug)]
struct CheckoutState {
    behavior: Behavior,
    subtotal_cents: u64,
    discount_percent: u64,
    shipping_cents: u64,
    input: String,
    message: String,
    row_visible: bool,
    /// Message waiting to render, and how many more reads until it does
    pending_message: Option<(String, u32)>,
    render_delay: u32,
}

impl CheckoutState {
    fn discount_cents(&self) -> u64 {
        self.subtotal_cents * self.discount_percent / 100
    }

    fn total_cents(&self) -> u64 {
        self.subtotal_cents - self.discount_cents() + self.shipping_cents
    }

    fn show_message(&mut self, message: &str) {
        if self.render_delay == 0 {
            self.message = message.to_string();
        } else {
            self.pending_message = Some((message.to_string(), self.render_delay));
        }
    }

    fn apply(&mut self) {
        let code = self.input.trim().to_string();
        let first = self.discount_percent == 0;

        if first {
            match (self.behavior, code.as_str()) {
                (Behavior::NeverApply, _) => {}
                (Behavior::WrongPercent, "SAVE15") => {
                    self.discount_percent = 10;
                    self.row_visible = true;
                    self.show_message("Success: 15% discount applied!");
                }
                (behavior, "SAVE15") => {
                    if behavior == Behavior::ShippingAfterFirst {
                        self.shipping_cents += SHIPPING_CENTS;
                    }
                    self.discount_percent = 15;
                    self.row_visible = true;
                    self.show_message("Success: 15% discount applied!");
                }
                _ => self.show_message("Error: Invalid discount code."),
            }
            return;
        }

        match self.behavior {
            Behavior::SilentOnSecond => {}
            Behavior::StackSecond => {
                self.discount_percent += 10;
                self.show_message("Error: Invalid discount code.");
            }
            Behavior::HideRowOnError => {
                self.row_visible = false;
                self.show_message("Error: Invalid discount code.");
            }
            Behavior::ShippingAfterSecond => {
                self.shipping_cents += SHIPPING_CENTS;
                self.show_message("Error: Invalid discount code.");
            }
            _ => self.show_message("Error: Invalid discount code."),
        }
    }

    fn read_message(&mut self) -> String {
        if let Some((message, remaining)) = self.pending_message.take() {
            if remaining <= 1 {
                self.message = message;
            } else {
                self.pending_message = Some((message, remaining - 1));
            }
        }
        self.message.clone()
    }
}

fn money(cents: u64) -> String {
    format!("${}.{:02}", cents / 100, cents % 100)
}

fn no_such_element(locator: &Locator) -> E2eError {
    E2eError::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("no such element: {}", locator),
    ))
}

/// Counters shared between a launcher and every page it opens
#[derive(Debug, Default)]
pub struct Session {
    pub launches: usize,
    pub quits: usize,
    pub viewports: Vec<Viewport>,
    pub urls: Vec<String>,
}

pub struct FakeCheckoutPage {
    state: Mutex<CheckoutState>,
    session: Arc<Mutex<Session>>,
}

#[async_trait]
impl Page for FakeCheckoutPage {
    async fn open(&self, url: &str) -> E2eResult<()> {
        self.session.lock().unwrap().urls.push(url.to_string());
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> E2eResult<()> {
        let mut state = self.state.lock().unwrap();
        match locator {
            Locator::XPath(xpath) if xpath == ADD_KEYBOARD => {
                state.subtotal_cents += 100_00;
                Ok(())
            }
            Locator::XPath(xpath) if xpath == APPLY => {
                state.apply();
                Ok(())
            }
            other => Err(no_such_element(other)),
        }
    }

    async fn send_keys(&self, locator: &Locator, text: &str) -> E2eResult<()> {
        match locator {
            Locator::Id(id) if id == "discount-code" => {
                self.state.lock().unwrap().input.push_str(text);
                Ok(())
            }
            other => Err(no_such_element(other)),
        }
    }

    async fn clear(&self, locator: &Locator) -> E2eResult<()> {
        match locator {
            Locator::Id(id) if id == "discount-code" => {
                self.state.lock().unwrap().input.clear();
                Ok(())
            }
            other => Err(no_such_element(other)),
        }
    }

    async fn text(&self, locator: &Locator) -> E2eResult<String> {
        let mut state = self.state.lock().unwrap();
        let id = match locator {
            Locator::Id(id) => id.as_str(),
            other => return Err(no_such_element(other)),
        };
        match id {
            "subtotal" => Ok(money(state.subtotal_cents)),
            "discount-amount" => Ok(format!("-{}", money(state.discount_cents()))),
            "total-price" => Ok(money(state.total_cents())),
            "discount-message" => Ok(state.read_message()),
            "discount-code" => Ok(String::new()),
            _ => Err(no_such_element(locator)),
        }
    }

    async fn is_displayed(&self, locator: &Locator) -> E2eResult<bool> {
        let state = self.state.lock().unwrap();
        match locator {
            Locator::Id(id) if id == "discount-row" => Ok(state.row_visible),
            Locator::Id(_) | Locator::XPath(_) => Ok(true),
            other => Err(no_such_element(other)),
        }
    }

    async fn is_clickable(&self, locator: &Locator) -> E2eResult<bool> {
        match locator {
            Locator::XPath(xpath) if xpath == ADD_KEYBOARD || xpath == APPLY => Ok(true),
            other => Err(no_such_element(other)),
        }
    }

    async fn screenshot_png(&self) -> E2eResult<Vec<u8>> {
        Ok(FAKE_PNG.to_vec())
    }

    async fn quit(&self) -> E2eResult<()> {
        self.session.lock().unwrap().quits += 1;
        Ok(())
    }
}

pub struct FakeLauncher {
    pub behavior: Behavior,
    pub render_delay: u32,
    pub fail_launch: bool,
    pub session: Arc<Mutex<Session>>,
}

impl FakeLauncher {
    pub fn new(behavior: Behavior) -> Self {
        Self {
            behavior,
            render_delay: 0,
            fail_launch: false,
            session: Arc::new(Mutex::new(Session::default())),
        }
    }

    /// Messages render only after this many reads
    pub fn with_render_delay(mut self, reads: u32) -> Self {
        self.render_delay = reads;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_launch = true;
        self
    }

    pub fn session(&self) -> Arc<Mutex<Session>> {
        Arc::clone(&self.session)
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self, viewport: Viewport) -> E2eResult<Box<dyn Page>> {
        if self.fail_launch {
            return Err(E2eError::DriverStartup("browser refused to start".into()));
        }
        {
            let mut session = self.session.lock().unwrap();
            session.launches += 1;
            session.viewports.push(viewport);
        }
        Ok(Box::new(FakeCheckoutPage {
            state: Mutex::new(CheckoutState {
                behavior: self.behavior,
                subtotal_cents: 0,
                discount_percent: 0,
                shipping_cents: 0,
                input: String::new(),
                message: String::new(),
                row_visible: false,
                pending_message: None,
                render_delay: self.render_delay,
            }),
            session: Arc::clone(&self.session),
        }))
    }
}

/// A fixture directory containing an empty checkout.html
pub fn fixture_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let page = "<!doctype html><title>E-Shop Checkout</title>";
    std::fs::write(dir.path().join("checkout.html"), page).unwrap();
    dir
}
