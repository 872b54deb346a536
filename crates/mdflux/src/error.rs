//! CLI error types.

use std::path::PathBuf;

use mdflux_config::ConfigError;
use mdflux_pdf::PdfError;
use mdflux_renderer::PipelineError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("conversion error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("PDF rendering failed: {0}")]
    Pdf(#[from] PdfError),

    #[error("{0}")]
    Logging(String),

    #[error("{0}")]
    Validation(String),
}
