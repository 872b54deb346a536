//! Mock browser for testing.
//!
//! Provides [`MockLauncher`] for exercising render sessions and PDF export
//! without spawning a browser process.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use crate::launch::LaunchConfig;
use crate::page::{BrowserError, BrowserLauncher, BrowserPage, PrintParams};

type Responder = dyn Fn(&str) -> Result<serde_json::Value, BrowserError> + Send + Sync;

#[derive(Default)]
struct MockState {
    launches: AtomicUsize,
    closes: AtomicUsize,
    evaluations: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    remaining_launch_failures: AtomicUsize,
    configs: Mutex<Vec<LaunchConfig>>,
    navigations: Mutex<Vec<String>>,
    scripts: Mutex<Vec<String>>,
    prints: Mutex<Vec<PrintParams>>,
}

/// Mock launcher for testing.
///
/// Clones share the recorded state, so a test can keep one handle while
/// the code under test owns another.
///
/// # Example
///
/// ```ignore
/// use mdflux_browser::{BrowserLauncher, BrowserPage, LaunchConfig, MockLauncher};
///
/// let launcher = MockLauncher::new()
///     .with_responder(|_script| Ok(serde_json::json!({"svg": "<svg/>"})));
///
/// let mut page = launcher.launch(&LaunchConfig::default()).unwrap();
/// let value = page.evaluate("render()").unwrap();
/// assert_eq!(launcher.evaluations(), 1);
/// ```
#[derive(Clone)]
pub struct MockLauncher {
    state: Arc<MockState>,
    responder: Arc<Responder>,
    eval_delay: Duration,
    fail_navigation: bool,
    fail_print: bool,
    pdf: Vec<u8>,
}

impl Default for MockLauncher {
    fn default() -> Self {
        Self {
            state: Arc::new(MockState::default()),
            responder: Arc::new(|_| Ok(serde_json::Value::Null)),
            eval_delay: Duration::ZERO,
            fail_navigation: false,
            fail_print: false,
            pdf: b"%PDF-1.4 mock".to_vec(),
        }
    }
}

impl MockLauncher {
    /// Create a mock whose scripts evaluate to `null`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every evaluated script with `responder`.
    #[must_use]
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&str) -> Result<serde_json::Value, BrowserError> + Send + Sync + 'static,
    {
        self.responder = Arc::new(responder);
        self
    }

    /// Fail the next `count` launches.
    #[must_use]
    pub fn failing_launches(self, count: usize) -> Self {
        self.state
            .remaining_launch_failures
            .store(count, Ordering::SeqCst);
        self
    }

    /// Fail every navigation.
    #[must_use]
    pub fn failing_navigation(mut self) -> Self {
        self.fail_navigation = true;
        self
    }

    /// Sleep inside every evaluation, to widen overlap windows.
    #[must_use]
    pub fn with_eval_delay(mut self, delay: Duration) -> Self {
        self.eval_delay = delay;
        self
    }

    /// Fail every print command.
    #[must_use]
    pub fn failing_print(mut self) -> Self {
        self.fail_print = true;
        self
    }

    /// Bytes returned by print commands.
    #[must_use]
    pub fn with_pdf(mut self, pdf: impl Into<Vec<u8>>) -> Self {
        self.pdf = pdf.into();
        self
    }

    /// Number of launch attempts, failed ones included.
    pub fn launches(&self) -> usize {
        self.state.launches.load(Ordering::SeqCst)
    }

    /// Number of pages closed.
    pub fn closes(&self) -> usize {
        self.state.closes.load(Ordering::SeqCst)
    }

    /// Number of scripts evaluated.
    pub fn evaluations(&self) -> usize {
        self.state.evaluations.load(Ordering::SeqCst)
    }

    /// Highest number of evaluations observed running at once.
    pub fn max_in_flight(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// Configurations passed to launch.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn configs(&self) -> Vec<LaunchConfig> {
        self.state.configs.lock().unwrap().clone()
    }

    /// URLs navigated to, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn navigations(&self) -> Vec<String> {
        self.state.navigations.lock().unwrap().clone()
    }

    /// Scripts evaluated, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn scripts(&self) -> Vec<String> {
        self.state.scripts.lock().unwrap().clone()
    }

    /// Print parameters received, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn prints(&self) -> Vec<PrintParams> {
        self.state.prints.lock().unwrap().clone()
    }
}

impl BrowserLauncher for MockLauncher {
    type Page = MockPage;

    fn launch(&self, config: &LaunchConfig) -> Result<MockPage, BrowserError> {
        self.state.launches.fetch_add(1, Ordering::SeqCst);
        self.state.configs.lock().unwrap().push(config.clone());

        let failing = self
            .state
            .remaining_launch_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(BrowserError::Launch("mock launch failure".to_owned()));
        }

        Ok(MockPage {
            launcher: self.clone(),
            closed: false,
        })
    }
}

/// Page handed out by [`MockLauncher`].
pub struct MockPage {
    launcher: MockLauncher,
    closed: bool,
}

impl MockPage {
    fn ensure_open(&self) -> Result<(), BrowserError> {
        if self.closed {
            return Err(BrowserError::Evaluation("page is closed".to_owned()));
        }
        Ok(())
    }
}

impl BrowserPage for MockPage {
    fn navigate(&mut self, url: &str, _ready_selector: &str) -> Result<(), BrowserError> {
        self.ensure_open()?;
        let state = &self.launcher.state;
        state.navigations.lock().unwrap().push(url.to_owned());
        if self.launcher.fail_navigation {
            return Err(BrowserError::Navigation {
                url: url.to_owned(),
                message: "mock navigation failure".to_owned(),
            });
        }
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> Result<serde_json::Value, BrowserError> {
        self.ensure_open()?;
        let state = &self.launcher.state;
        state.evaluations.fetch_add(1, Ordering::SeqCst);
        state.scripts.lock().unwrap().push(script.to_owned());

        let running = state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        state.max_in_flight.fetch_max(running, Ordering::SeqCst);
        if !self.launcher.eval_delay.is_zero() {
            thread::sleep(self.launcher.eval_delay);
        }
        let result = (self.launcher.responder)(script);
        state.in_flight.fetch_sub(1, Ordering::SeqCst);

        result
    }

    fn print_to_pdf(&mut self, params: &PrintParams) -> Result<Vec<u8>, BrowserError> {
        self.ensure_open()?;
        self.launcher.state.prints.lock().unwrap().push(*params);
        if self.launcher.fail_print {
            return Err(BrowserError::Print("mock print failure".to_owned()));
        }
        Ok(self.launcher.pdf.clone())
    }

    fn close(&mut self) -> Result<(), BrowserError> {
        if !self.closed {
            self.closed = true;
            self.launcher.state.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_mock_records_calls() {
        let launcher = MockLauncher::new().with_responder(|script| Ok(serde_json::json!(script.len())));
        let mut page = launcher.launch(&LaunchConfig::for_printing()).unwrap();

        page.navigate("file:///tmp/a.html", "body").unwrap();
        let value = page.evaluate("1 + 1").unwrap();
        page.close().unwrap();
        page.close().unwrap();

        assert_eq!(value, serde_json::json!(5));
        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.closes(), 1);
        assert_eq!(launcher.navigations(), vec!["file:///tmp/a.html".to_owned()]);
        assert_eq!(launcher.scripts(), vec!["1 + 1".to_owned()]);
        assert!(!launcher.configs()[0].shm_workaround);
    }

    #[test]
    fn test_mock_failing_launches_recover() {
        let launcher = MockLauncher::new().failing_launches(1);

        assert!(launcher.launch(&LaunchConfig::default()).is_err());
        assert!(launcher.launch(&LaunchConfig::default()).is_ok());
        assert_eq!(launcher.launches(), 2);
    }

    #[test]
    fn test_mock_closed_page_rejects_calls() {
        let launcher = MockLauncher::new();
        let mut page = launcher.launch(&LaunchConfig::default()).unwrap();
        page.close().unwrap();

        assert!(page.evaluate("x").is_err());
        assert_eq!(launcher.evaluations(), 0);
    }
}
