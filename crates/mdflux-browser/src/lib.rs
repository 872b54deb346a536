//! Headless browser driver.
//!
//! Both diagram rendering and PDF export drive a headless Chromium. This
//! crate owns the launch configuration they share and hides the driver
//! behind two small traits:
//!
//! - [`BrowserLauncher`] starts a browser process and opens one page.
//! - [`BrowserPage`] navigates, evaluates scripts, prints, and closes.
//!
//! [`ChromeLauncher`] is the production implementation built on
//! `headless_chrome`. [`MockLauncher`] (behind the `mock` feature flag)
//! records calls and answers scripts from a closure, for tests that must
//! not spawn a browser.

mod chrome;
mod launch;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod page;
mod url;

pub use chrome::{ChromeLauncher, ChromePage};
pub use launch::{DEFAULT_IDLE_TIMEOUT, LaunchConfig};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockLauncher, MockPage};
pub use page::{BrowserError, BrowserLauncher, BrowserPage, PrintParams};
pub use url::file_url;
