//! Server-side mermaid rendering in a headless browser.
//!
//! A [`BrowserRenderSession`] owns one browser process, one page and one
//! temporary directory holding the bootstrap page. Everything is created on
//! the first render and kept until [`BrowserRenderSession::release`].
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──render──▶ Initializing ──ok──▶ Ready ──release──▶ Closed
//!       ▲                        │
//!       └─────────error──────────┘
//! ```
//!
//! A single mutex guards both initialization and every render, so only one
//! script is ever evaluated in the shared page at a time.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use mdflux_browser::{BrowserLauncher, BrowserPage, ChromeLauncher, LaunchConfig, file_url};
use serde_json::Value;
use tempfile::TempDir;

use crate::render::{DiagramRenderer, RenderError};
use crate::template::{MermaidLibrary, bootstrap_page, render_script};

/// Selector the bootstrap page sets once its scripts have run.
pub const READY_SELECTOR: &str = "body[data-mermaid-ready]";

const BOOTSTRAP_FILE: &str = "mermaid.html";
const TEMP_DIR_PREFIX: &str = "mermaid-renderer-";

/// Configuration of a render session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Browser launch options.
    pub launch: LaunchConfig,
    /// Where the bootstrap page loads mermaid from.
    pub library: MermaidLibrary,
    /// Mermaid theme name.
    pub theme: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            launch: LaunchConfig::for_rendering(),
            library: MermaidLibrary::default(),
            theme: "default".to_owned(),
        }
    }
}

/// Observable lifecycle state of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initializing,
    Ready,
    Closed,
}

struct Ready<P> {
    temp_dir: TempDir,
    bootstrap_path: PathBuf,
    page: P,
}

enum Inner<P> {
    Uninitialized,
    Initializing,
    Ready(Ready<P>),
    Closed,
}

/// Lazily launched headless browser rendering mermaid diagrams.
///
/// Construct one per conversion, share it behind an `Arc`, and call
/// [`release`](Self::release) when done. Dropping the session releases it
/// as well.
pub struct BrowserRenderSession<L: BrowserLauncher = ChromeLauncher> {
    launcher: L,
    config: SessionConfig,
    inner: Mutex<Inner<L::Page>>,
}

impl BrowserRenderSession<ChromeLauncher> {
    /// Create a session backed by a local Chromium.
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self::with_launcher(ChromeLauncher::new(), config)
    }
}

impl<L: BrowserLauncher> BrowserRenderSession<L> {
    /// Create a session with a custom browser launcher.
    #[must_use]
    pub fn with_launcher(launcher: L, config: SessionConfig) -> Self {
        Self {
            launcher,
            config,
            inner: Mutex::new(Inner::Uninitialized),
        }
    }

    /// Session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Current lifecycle state.
    ///
    /// Blocks while another thread holds the guard, so `Initializing` is
    /// only observed after an initialization panicked.
    pub fn state(&self) -> SessionState {
        match &*self.lock() {
            Inner::Uninitialized => SessionState::Uninitialized,
            Inner::Initializing => SessionState::Initializing,
            Inner::Ready(_) => SessionState::Ready,
            Inner::Closed => SessionState::Closed,
        }
    }

    /// Path of the bootstrap page while the session is ready.
    pub fn bootstrap_path(&self) -> Option<PathBuf> {
        match &*self.lock() {
            Inner::Ready(ready) => Some(ready.bootstrap_path.clone()),
            _ => None,
        }
    }

    /// Shut the browser down and remove the temporary directory.
    ///
    /// Idempotent. Does nothing unless the session is ready, so a session
    /// released before its first render stays usable. Cleanup failures are
    /// logged, never returned.
    pub fn release(&self) {
        let mut inner = self.lock();
        if !matches!(*inner, Inner::Ready(_)) {
            return;
        }
        if let Inner::Ready(ready) = std::mem::replace(&mut *inner, Inner::Closed) {
            tracing::debug!("Releasing mermaid render session");
            teardown(ready.page, ready.temp_dir);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<L::Page>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_ready(&self, inner: &mut Inner<L::Page>) -> Result<(), RenderError> {
        match inner {
            Inner::Ready(_) => Ok(()),
            Inner::Closed => Err(RenderError::Closed),
            // `Initializing` is only left behind by a panic; start over.
            Inner::Uninitialized | Inner::Initializing => {
                *inner = Inner::Initializing;
                match self.initialize() {
                    Ok(ready) => {
                        *inner = Inner::Ready(ready);
                        Ok(())
                    }
                    Err(err) => {
                        *inner = Inner::Uninitialized;
                        Err(err)
                    }
                }
            }
        }
    }

    fn initialize(&self) -> Result<Ready<L::Page>, RenderError> {
        let temp_dir = tempfile::Builder::new()
            .prefix(TEMP_DIR_PREFIX)
            .tempdir()
            .map_err(RenderError::TempDir)?;

        let bootstrap_path = temp_dir.path().join(BOOTSTRAP_FILE);
        if let Err(err) = bootstrap_page(&self.config.library)
            .and_then(|html| fs::write(&bootstrap_path, html).map_err(RenderError::Bootstrap))
        {
            remove_temp_dir(temp_dir);
            return Err(err);
        }

        let mut page = match self.launcher.launch(&self.config.launch) {
            Ok(page) => page,
            Err(err) => {
                remove_temp_dir(temp_dir);
                return Err(err.into());
            }
        };

        let url = file_url(&bootstrap_path);
        if let Err(err) = page.navigate(&url, READY_SELECTOR) {
            teardown(page, temp_dir);
            return Err(err.into());
        }

        tracing::info!(path = %bootstrap_path.display(), "Mermaid render session ready");
        Ok(Ready {
            temp_dir,
            bootstrap_path,
            page,
        })
    }
}

impl<L: BrowserLauncher> DiagramRenderer for BrowserRenderSession<L> {
    fn render(&self, source: &str) -> Result<String, RenderError> {
        let mut inner = self.lock();
        self.ensure_ready(&mut inner)?;
        let Inner::Ready(ready) = &mut *inner else {
            return Err(RenderError::Closed);
        };

        let code = serde_json::to_string(source).map_err(RenderError::Encode)?;
        let theme = serde_json::to_string(&self.config.theme).map_err(RenderError::Encode)?;
        let script = render_script(&code, &theme)?;

        let value = ready.page.evaluate(&script)?;
        parse_result(value)
    }
}

impl<L: BrowserLauncher> Drop for BrowserRenderSession<L> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Extract the SVG from the render script's `{svg, error}` result.
///
/// The script returns the object JSON-encoded; a plain object is accepted
/// too.
fn parse_result(value: Value) -> Result<String, RenderError> {
    let object = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(parsed) => parsed,
            Err(_) => return Err(RenderError::MalformedResult(raw)),
        },
        other => other,
    };

    if let Some(Value::String(error)) = object.get("error")
        && !error.is_empty()
    {
        return Err(RenderError::Diagram(error.clone()));
    }

    match object.get("svg") {
        Some(Value::String(svg)) if !svg.is_empty() => Ok(svg.clone()),
        _ => Err(RenderError::MalformedResult(object.to_string())),
    }
}

fn teardown<P: BrowserPage>(mut page: P, temp_dir: TempDir) {
    if let Err(err) = page.close() {
        tracing::warn!(error = %err, "Failed to close browser");
    }
    drop(page);
    remove_temp_dir(temp_dir);
}

fn remove_temp_dir(temp_dir: TempDir) {
    let path = temp_dir.path().to_path_buf();
    if let Err(err) = temp_dir.close() {
        tracing::warn!(path = %path.display(), error = %err, "Failed to remove temp directory");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    use mdflux_browser::{BrowserError, MockLauncher};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn svg_launcher() -> MockLauncher {
        MockLauncher::new().with_responder(|_| {
            Ok(Value::String(
                json!({"svg": "<svg>ok</svg>", "error": null}).to_string(),
            ))
        })
    }

    fn session(launcher: &MockLauncher) -> BrowserRenderSession<MockLauncher> {
        BrowserRenderSession::with_launcher(launcher.clone(), SessionConfig::default())
    }

    #[test]
    fn test_lazy_initialization() {
        let launcher = svg_launcher();
        let session = session(&launcher);

        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(launcher.launches(), 0);

        assert_eq!(session.render("graph TD").unwrap(), "<svg>ok</svg>");
        assert_eq!(session.render("graph LR").unwrap(), "<svg>ok</svg>");

        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.evaluations(), 2);
        assert!(launcher.configs()[0].shm_workaround);
    }

    #[test]
    fn test_bootstrap_page_written_and_navigated() {
        let launcher = svg_launcher();
        let session = session(&launcher);

        session.render("A").unwrap();

        let path = session.bootstrap_path().unwrap();
        assert!(path.exists());
        assert!(path.ends_with("mermaid.html"));
        let dir_name = path.parent().unwrap().file_name().unwrap().to_string_lossy().into_owned();
        assert!(dir_name.starts_with("mermaid-renderer-"));
        assert_eq!(launcher.navigations(), vec![file_url(&path)]);

        session.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_source_is_json_encoded_in_script() {
        let launcher = svg_launcher();
        let session = session(&launcher);

        session.render("A[\"quote\"] -->\nB').x;alert(1)").unwrap();

        let script = &launcher.scripts()[0];
        assert!(script.contains(r#"mermaid.render(id, "A[\"quote\"] -->\nB').x;alert(1)")"#));
        assert!(script.contains("theme: \"default\""));
    }

    #[test]
    fn test_diagram_error_reported() {
        let launcher = MockLauncher::new().with_responder(|_| {
            Ok(Value::String(
                json!({"svg": null, "error": "Parse error on line 1"}).to_string(),
            ))
        });
        let session = session(&launcher);

        let err = session.render("nonsense").unwrap_err();

        assert!(matches!(&err, RenderError::Diagram(message) if message == "Parse error on line 1"));
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_object_result_accepted() {
        let launcher = MockLauncher::new().with_responder(|_| Ok(json!({"svg": "<svg/>"})));
        let session = session(&launcher);

        assert_eq!(session.render("A").unwrap(), "<svg/>");
    }

    #[test]
    fn test_malformed_results() {
        for value in [
            Value::Null,
            json!({}),
            json!({"svg": ""}),
            json!({"svg": 42}),
            json!({"error": ""}),
            Value::String("not json".to_owned()),
        ] {
            let launcher = MockLauncher::new().with_responder(move |_| Ok(value.clone()));
            let session = session(&launcher);

            let err = session.render("A").unwrap_err();

            assert!(matches!(err, RenderError::MalformedResult(_)), "{err:?}");
        }
    }

    #[test]
    fn test_evaluation_failure_propagates() {
        let launcher = MockLauncher::new()
            .with_responder(|_| Err(BrowserError::Evaluation("target closed".to_owned())));
        let session = session(&launcher);

        let err = session.render("A").unwrap_err();

        assert!(matches!(err, RenderError::Browser(BrowserError::Evaluation(_))));
        assert!(!err.is_initialization());
    }

    #[test]
    fn test_empty_source_still_evaluated() {
        let launcher = svg_launcher();
        let session = session(&launcher);

        session.render("").unwrap();

        assert_eq!(launcher.evaluations(), 1);
        assert!(launcher.scripts()[0].contains(r#"mermaid.render(id, "")"#));
    }

    #[test]
    fn test_failed_launch_rolls_back_and_retries() {
        let launcher = svg_launcher().failing_launches(1);
        let session = session(&launcher);

        let err = session.render("A").unwrap_err();
        assert!(err.is_initialization());
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(launcher.evaluations(), 0);

        assert_eq!(session.render("A").unwrap(), "<svg>ok</svg>");
        assert_eq!(launcher.launches(), 2);
        assert_eq!(session.state(), SessionState::Ready);
    }

    #[test]
    fn test_failed_navigation_closes_browser() {
        let launcher = svg_launcher().failing_navigation();
        let session = session(&launcher);

        let err = session.render("A").unwrap_err();

        assert!(matches!(err, RenderError::Browser(BrowserError::Navigation { .. })));
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(launcher.closes(), 1);
    }

    #[test]
    fn test_missing_library_file_fails_before_launch() {
        let launcher = svg_launcher();
        let config = SessionConfig {
            library: MermaidLibrary::File(PathBuf::from("/nonexistent/mermaid.min.js")),
            ..SessionConfig::default()
        };
        let session = BrowserRenderSession::with_launcher(launcher.clone(), config);

        let err = session.render("A").unwrap_err();

        assert!(matches!(err, RenderError::Library { .. }));
        assert_eq!(launcher.launches(), 0);
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn test_release_is_idempotent() {
        let launcher = svg_launcher();
        let session = session(&launcher);
        session.render("A").unwrap();

        session.release();
        session.release();

        assert_eq!(session.state(), SessionState::Closed);
        assert_eq!(launcher.closes(), 1);
        assert!(matches!(session.render("A"), Err(RenderError::Closed)));
        assert_eq!(launcher.launches(), 1);
    }

    #[test]
    fn test_release_before_initialization() {
        let launcher = svg_launcher();
        let session = session(&launcher);

        session.release();
        session.release();

        assert_eq!(launcher.launches(), 0);
        assert_eq!(launcher.closes(), 0);
        assert_eq!(session.state(), SessionState::Uninitialized);

        assert_eq!(session.render("graph TD").unwrap(), "<svg>ok</svg>");
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(launcher.launches(), 1);
    }

    #[test]
    fn test_drop_releases() {
        let launcher = svg_launcher();
        {
            let session = session(&launcher);
            session.render("A").unwrap();
        }

        assert_eq!(launcher.closes(), 1);
    }

    #[test]
    fn test_concurrent_renders_are_serialized() {
        let launcher = svg_launcher().with_eval_delay(Duration::from_millis(5));
        let session = Arc::new(session(&launcher));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let session = Arc::clone(&session);
                thread::spawn(move || session.render(&format!("graph TD; N{i}")))
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), "<svg>ok</svg>");
        }

        assert_eq!(launcher.launches(), 1);
        assert_eq!(launcher.evaluations(), 8);
        assert_eq!(launcher.max_in_flight(), 1);
    }
}
