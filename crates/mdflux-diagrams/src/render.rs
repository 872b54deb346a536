use std::path::PathBuf;

use mdflux_browser::BrowserError;

/// Turns diagram source into SVG markup.
pub trait DiagramRenderer: Send + Sync {
    /// Render `source` to SVG.
    ///
    /// # Errors
    ///
    /// Returns an error if the renderer cannot start or the diagram does
    /// not render.
    fn render(&self, source: &str) -> Result<String, RenderError>;
}

/// Error from rendering a diagram.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Temporary working directory could not be created.
    #[error("failed to create temp directory: {0}")]
    TempDir(#[source] std::io::Error),
    /// Bootstrap page or render script template failed.
    #[error("failed to render template: {0}")]
    Template(#[from] minijinja::Error),
    /// The embedded library was requested but this build has none.
    #[error("mermaid library is not embedded in this build (enable the `embed` feature)")]
    NotEmbedded,
    /// Local mermaid library could not be read.
    #[error("failed to read mermaid library {}: {source}", path.display())]
    Library {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Bootstrap page could not be written.
    #[error("failed to write mermaid bootstrap page: {0}")]
    Bootstrap(#[source] std::io::Error),
    /// Browser launch, navigation or evaluation failed.
    #[error(transparent)]
    Browser(#[from] BrowserError),
    /// Diagram source could not be encoded for the render script.
    #[error("failed to encode diagram source: {0}")]
    Encode(#[source] serde_json::Error),
    /// Mermaid reported an error for the diagram.
    #[error("{0}")]
    Diagram(String),
    /// Render script returned something other than `{svg, error}`.
    #[error("mermaid render returned no valid SVG (result: {0})")]
    MalformedResult(String),
    /// Session was released.
    #[error("render session is closed")]
    Closed,
}

impl RenderError {
    /// Whether the error happened while bringing the session up.
    ///
    /// The session stays uninitialized after such errors and the next
    /// render retries initialization.
    #[must_use]
    pub fn is_initialization(&self) -> bool {
        match self {
            Self::TempDir(_) | Self::NotEmbedded | Self::Library { .. } | Self::Bootstrap(_) => {
                true
            }
            Self::Browser(err) => matches!(
                err,
                BrowserError::Launch(_) | BrowserError::Navigation { .. }
            ),
            Self::Template(_)
            | Self::Encode(_)
            | Self::Diagram(_)
            | Self::MalformedResult(_)
            | Self::Closed => false,
        }
    }
}
