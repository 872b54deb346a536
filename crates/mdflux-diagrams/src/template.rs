//! Bootstrap page and render script templates.

use std::fs;
use std::path::PathBuf;

use minijinja::{AutoEscape, Environment, context};

use crate::render::RenderError;

/// jsDelivr bundle of mermaid 11.
pub const DEFAULT_MERMAID_URL: &str = "https://cdn.jsdelivr.net/npm/mermaid@11/dist/mermaid.min.js";

/// Mermaid bundle compiled in by the `embed` feature.
#[cfg(feature = "embed")]
const EMBEDDED_MERMAID_JS: Option<&str> =
    Some(include_str!(concat!(env!("OUT_DIR"), "/mermaid.min.js")));
#[cfg(not(feature = "embed"))]
const EMBEDDED_MERMAID_JS: Option<&str> = None;

const BOOTSTRAP_TEMPLATE: &str = include_str!("../templates/mermaid.html");
const RENDER_SCRIPT_TEMPLATE: &str = include_str!("../templates/mermaid-render.js");

/// Where the bootstrap page loads mermaid from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MermaidLibrary {
    /// Bundle compiled into the crate, inlined into the page.
    Embedded,
    /// Local script, inlined into the page.
    File(PathBuf),
    /// Remote script, referenced by `<script src>`.
    Url(String),
}

impl MermaidLibrary {
    /// Source of the bundle compiled into this build, if any.
    #[must_use]
    pub fn embedded_source() -> Option<&'static str> {
        EMBEDDED_MERMAID_JS
    }
}

impl Default for MermaidLibrary {
    /// The embedded bundle when built with `embed`, the jsDelivr bundle
    /// otherwise.
    fn default() -> Self {
        if EMBEDDED_MERMAID_JS.is_some() {
            Self::Embedded
        } else {
            Self::Url(DEFAULT_MERMAID_URL.to_owned())
        }
    }
}

fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    // Values are JavaScript and JSON literals, never HTML text.
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env
}

/// Render the bootstrap page that loads the mermaid library.
pub(crate) fn bootstrap_page(library: &MermaidLibrary) -> Result<String, RenderError> {
    let (mermaid_js, mermaid_url) = match library {
        MermaidLibrary::Embedded => {
            let source = MermaidLibrary::embedded_source().ok_or(RenderError::NotEmbedded)?;
            (Some(source.to_owned()), None)
        }
        MermaidLibrary::File(path) => {
            let source = fs::read_to_string(path).map_err(|source| RenderError::Library {
                path: path.clone(),
                source,
            })?;
            (Some(source), None)
        }
        MermaidLibrary::Url(url) => (None, Some(url.as_str())),
    };

    Ok(environment().render_str(
        BOOTSTRAP_TEMPLATE,
        context! { mermaid_js => mermaid_js, mermaid_url => mermaid_url },
    )?)
}

/// Render the evaluation script for one diagram.
///
/// `code` and `theme` are substituted verbatim, so both must already be
/// JSON string literals.
pub(crate) fn render_script(code: &str, theme: &str) -> Result<String, RenderError> {
    Ok(environment().render_str(
        RENDER_SCRIPT_TEMPLATE,
        context! { code => code, theme => theme },
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_page_references_url() {
        let html = bootstrap_page(&MermaidLibrary::Url("https://example.com/m.js".to_owned())).unwrap();

        assert!(html.contains("<script src=\"https://example.com/m.js\"></script>"));
        assert!(html.contains("data-mermaid-ready"));
    }

    #[test]
    fn test_bootstrap_page_inlines_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mermaid.min.js");
        fs::write(&path, "window.mermaid = {a: '<b>'};").unwrap();

        let html = bootstrap_page(&MermaidLibrary::File(path)).unwrap();

        assert!(html.contains("window.mermaid = {a: '<b>'};"));
        assert!(!html.contains("<script src="));
    }

    #[test]
    fn test_bootstrap_page_missing_file() {
        let err = bootstrap_page(&MermaidLibrary::File(PathBuf::from("/nonexistent/mermaid.js")))
            .unwrap_err();

        assert!(matches!(err, RenderError::Library { .. }));
        assert!(err.is_initialization());
    }

    #[test]
    fn test_render_script_embeds_literals_verbatim() {
        let code = serde_json::to_string("graph TD\n  A[\"x\"] --> B").unwrap();

        let script = render_script(&code, "\"dark\"").unwrap();

        assert!(script.contains(r#"mermaid.render(id, "graph TD\n  A[\"x\"] --> B")"#));
        assert!(script.contains("theme: \"dark\""));
        assert!(script.contains("JSON.stringify"));
    }

    #[test]
    fn test_default_library_prefers_embedded_bundle() {
        let expected = if MermaidLibrary::embedded_source().is_some() {
            MermaidLibrary::Embedded
        } else {
            MermaidLibrary::Url(DEFAULT_MERMAID_URL.to_owned())
        };

        assert_eq!(MermaidLibrary::default(), expected);
    }

    #[cfg(feature = "embed")]
    #[test]
    fn test_bootstrap_page_inlines_embedded_bundle() {
        let html = bootstrap_page(&MermaidLibrary::Embedded).unwrap();

        assert!(html.contains("mermaid"));
        assert!(!html.contains("<script src="));
    }

    #[cfg(not(feature = "embed"))]
    #[test]
    fn test_embedded_library_missing_from_build() {
        assert_eq!(MermaidLibrary::embedded_source(), None);

        let err = bootstrap_page(&MermaidLibrary::Embedded).unwrap_err();

        assert!(matches!(err, RenderError::NotEmbedded));
        assert!(err.is_initialization());
    }
}
