use crate::launch::LaunchConfig;

/// Error from the browser driver.
#[derive(Debug, thiserror::Error)]
pub enum BrowserError {
    /// Browser process could not be started or no page could be opened.
    #[error("failed to launch browser: {0}")]
    Launch(String),
    /// Navigation or the readiness wait failed.
    #[error("failed to navigate to {url}: {message}")]
    Navigation { url: String, message: String },
    /// Script evaluation failed in transport or threw.
    #[error("script evaluation failed: {0}")]
    Evaluation(String),
    /// Print-to-PDF command failed.
    #[error("print to PDF failed: {0}")]
    Print(String),
    /// Page or process could not be closed cleanly.
    #[error("failed to close browser: {0}")]
    Close(String),
}

/// Print-to-PDF parameters. Lengths are in inches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintParams {
    pub paper_width: f64,
    pub paper_height: f64,
    pub scale: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    pub print_background: bool,
}

/// Starts browser processes.
pub trait BrowserLauncher: Send + Sync {
    type Page: BrowserPage;

    /// Launch a browser and open a single blank page.
    ///
    /// The returned page owns the process; closing or dropping it shuts the
    /// browser down.
    fn launch(&self, config: &LaunchConfig) -> Result<Self::Page, BrowserError>;
}

/// A page in a launched browser.
pub trait BrowserPage: Send {
    /// Navigate to `url` and block until `ready_selector` matches.
    fn navigate(&mut self, url: &str, ready_selector: &str) -> Result<(), BrowserError>;

    /// Evaluate `script`, awaiting a returned promise, and return its value.
    fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, BrowserError>;

    /// Print the current page to PDF.
    fn print_to_pdf(&mut self, params: &PrintParams) -> Result<Vec<u8>, BrowserError>;

    /// Close the page and shut the browser down. Safe to call repeatedly.
    fn close(&mut self) -> Result<(), BrowserError>;
}
