//! Chromium driver built on `headless_chrome`.

use std::ffi::OsStr;
use std::sync::Arc;

use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions, Tab};

use crate::launch::LaunchConfig;
use crate::page::{BrowserError, BrowserLauncher, BrowserPage, PrintParams};

/// Launches a local Chromium through the DevTools protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeLauncher;

impl ChromeLauncher {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BrowserLauncher for ChromeLauncher {
    type Page = ChromePage;

    fn launch(&self, config: &LaunchConfig) -> Result<ChromePage, BrowserError> {
        let args: Vec<&OsStr> = config.args().into_iter().map(OsStr::new).collect();
        let options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .enable_gpu(false)
            .path(config.executable.clone())
            .idle_browser_timeout(config.idle_timeout)
            .args(args)
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        tracing::debug!(
            executable = ?config.executable,
            shm_workaround = config.shm_workaround,
            "Launching headless browser"
        );
        let browser = Browser::new(options).map_err(|e| BrowserError::Launch(e.to_string()))?;
        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::Launch(format!("failed to open page: {e}")))?;
        if let Some(timeout) = config.wait_timeout {
            tab.set_default_timeout(timeout);
        }

        Ok(ChromePage {
            browser: Some(browser),
            tab: Some(tab),
        })
    }
}

/// A single tab of a launched Chromium. Dropping it kills the process.
pub struct ChromePage {
    tab: Option<Arc<Tab>>,
    browser: Option<Browser>,
}

impl ChromePage {
    fn tab(&self) -> Result<&Arc<Tab>, BrowserError> {
        self.tab
            .as_ref()
            .ok_or_else(|| BrowserError::Evaluation("page is closed".to_owned()))
    }
}

impl BrowserPage for ChromePage {
    fn navigate(&mut self, url: &str, ready_selector: &str) -> Result<(), BrowserError> {
        let navigation_error = |message: String| BrowserError::Navigation {
            url: url.to_owned(),
            message,
        };
        let tab = self.tab().map_err(|e| navigation_error(e.to_string()))?;
        tab.navigate_to(url)
            .and_then(Tab::wait_until_navigated)
            .and_then(|tab| tab.wait_for_element(ready_selector).map(|_| ()))
            .map_err(|e| navigation_error(e.to_string()))
    }

    fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, BrowserError> {
        let object = self
            .tab()?
            .evaluate(script, true)
            .map_err(|e| BrowserError::Evaluation(e.to_string()))?;
        Ok(object.value.unwrap_or(serde_json::Value::Null))
    }

    fn print_to_pdf(&mut self, params: &PrintParams) -> Result<Vec<u8>, BrowserError> {
        let options = PrintToPdfOptions {
            print_background: Some(params.print_background),
            scale: Some(params.scale),
            paper_width: Some(params.paper_width),
            paper_height: Some(params.paper_height),
            margin_top: Some(params.margin_top),
            margin_bottom: Some(params.margin_bottom),
            margin_left: Some(params.margin_left),
            margin_right: Some(params.margin_right),
            ..PrintToPdfOptions::default()
        };
        self.tab()
            .map_err(|e| BrowserError::Print(e.to_string()))?
            .print_to_pdf(Some(options))
            .map_err(|e| BrowserError::Print(e.to_string()))
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        let result = match self.tab.take() {
            Some(tab) => tab
                .close(true)
                .map(|_| ())
                .map_err(|e| BrowserError::Close(e.to_string())),
            None => Ok(()),
        };
        if self.browser.take().is_some() {
            tracing::debug!("Browser process shut down");
        }
        result
    }
}
