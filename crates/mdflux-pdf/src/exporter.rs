//! HTML to PDF export.

use std::fs;
use std::path::{Path, PathBuf};

use mdflux_browser::{
    BrowserError, BrowserLauncher, BrowserPage, ChromeLauncher, LaunchConfig, PrintParams,
    file_url,
};

use crate::options::PdfOptions;

/// Error from a PDF export.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF output cannot be streamed; a file path is required.
    #[error("PDF output requires a file path (got {0:?})")]
    InvalidOutput(String),
    /// Browser launch, navigation or printing failed.
    #[error(transparent)]
    Browser(#[from] BrowserError),
    /// PDF bytes could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Prints HTML files to PDF.
///
/// Stateless: every export launches its own browser and shuts it down
/// before returning, so concurrent exports never share a process.
#[derive(Debug, Default, Clone)]
pub struct PdfExporter<L: BrowserLauncher = ChromeLauncher> {
    launcher: L,
}

impl PdfExporter<ChromeLauncher> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_launcher(ChromeLauncher::new())
    }
}

impl<L: BrowserLauncher> PdfExporter<L> {
    /// Create an exporter with a custom browser launcher.
    #[must_use]
    pub fn with_launcher(launcher: L) -> Self {
        Self { launcher }
    }

    /// Print `html_path` to `output`.
    ///
    /// `output` must be a real file path; `""` and `"-"` are rejected before
    /// any browser is launched.
    pub fn export(&self, html_path: &Path, output: &Path, options: &PdfOptions) -> Result<(), PdfError> {
        let output_str = output.to_string_lossy();
        if output_str.is_empty() || output_str == "-" {
            return Err(PdfError::InvalidOutput(output_str.into_owned()));
        }

        let (paper_width, paper_height) = options.paper_size();
        let params = PrintParams {
            paper_width,
            paper_height,
            scale: options.effective_scale(),
            margin_top: options.margin_top,
            margin_bottom: options.margin_bottom,
            margin_left: options.margin_left,
            margin_right: options.margin_right,
            print_background: true,
        };
        let config = LaunchConfig::for_printing().with_executable(options.executable.clone());

        tracing::debug!(
            input = %html_path.display(),
            output = %output.display(),
            page_size = %options.page_size,
            landscape = options.landscape,
            "Exporting PDF"
        );

        let mut page = self.launcher.launch(&config)?;
        let printed = print(&mut page, html_path, &params);
        if let Err(err) = page.close() {
            tracing::warn!(error = %err, "Failed to close browser");
        }
        drop(page);
        let pdf = printed?;

        fs::write(output, &pdf).map_err(|source| PdfError::Write {
            path: output.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %output.display(), bytes = pdf.len(), "PDF written");
        Ok(())
    }
}

fn print<P: BrowserPage>(page: &mut P, html_path: &Path, params: &PrintParams) -> Result<Vec<u8>, BrowserError> {
    page.navigate(&file_url(html_path), "body")?;
    page.print_to_pdf(params)
}
