//! Markdown conversion command.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use mdflux_browser::{BrowserLauncher, LaunchConfig};
use mdflux_config::{CliSettings, Config, HtmlTheme, MermaidMode, OutputFormat};
use mdflux_diagrams::{
    BrowserRenderSession, CachingRenderer, DiagramRenderer, MermaidLibrary, SessionConfig,
};
use mdflux_pdf::{PageSize, PdfExporter, PdfOptions};

use crate::converter::{Converter, mermaid_library};
use crate::error::CliError;
use crate::logging;
use crate::output::Output;

/// Arguments for a conversion.
#[derive(Args)]
pub(crate) struct ConvertArgs {
    /// Markdown file to convert (`-` or omitted reads stdin).
    #[arg(env = "MDFLUX_INPUT")]
    input: Option<PathBuf>,

    /// Output file (`-` or omitted writes stdout, HTML only).
    #[arg(short, long, env = "MDFLUX_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format: html or pdf.
    #[arg(short, long, env = "MDFLUX_FORMAT")]
    format: Option<OutputFormat>,

    /// Path to configuration file (default: auto-discover mdflux.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Page color theme: auto, light or dark.
    #[arg(short, long, env = "MDFLUX_THEME")]
    theme: Option<HtmlTheme>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, env = "MDFLUX_LOG_LEVEL")]
    log_level: Option<String>,

    /// Write logs to this file instead of stderr.
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Render mermaid diagrams on the server or in the page.
    #[arg(long)]
    mermaid_mode: Option<MermaidMode>,

    /// PDF page size: A4, Letter or Legal.
    #[arg(long)]
    page_size: Option<String>,

    /// Print PDF pages in landscape orientation.
    #[arg(long)]
    landscape: bool,

    /// Browser executable used for diagrams and PDF export.
    #[arg(long)]
    chrome_path: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

impl ConvertArgs {
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let config = Config::load(self.config.as_deref(), Some(&self.cli_settings()))?;
        logging::init(
            self.verbose,
            config.log_level.as_deref(),
            config.log_file.as_deref(),
        )?;
        tracing::debug!(config_file = ?config.config_path, "Configuration loaded");

        run(&config)
    }

    fn cli_settings(&self) -> CliSettings {
        CliSettings {
            input: self.input.clone(),
            output: self.output.clone(),
            format: self.format,
            theme: self.theme,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
            mermaid_mode: self.mermaid_mode,
            page_size: self.page_size.clone(),
            landscape: self.landscape.then_some(true),
            chrome_path: self.chrome_path.clone(),
        }
    }
}

/// Convert the configured input and write the result.
fn run(config: &Config) -> Result<(), CliError> {
    // PDF output cannot be streamed; reject it before reading any input.
    let pdf_output = match config.output.format {
        OutputFormat::Pdf => Some(config.output.file.clone().ok_or_else(|| {
            CliError::Validation(
                "PDF output requires a file path, cannot write to stdout".to_owned(),
            )
        })?),
        OutputFormat::Html => None,
    };

    tracing::info!(format = %config.output.format, "Starting conversion");
    let markdown = read_input(config.input.file.as_deref())?;
    let html = render_page(config, &markdown)?;

    match pdf_output {
        Some(output) => write_pdf(config, &html, &output),
        None => write_html(config.output.file.as_deref(), &html),
    }
}

/// Render `markdown` to a full page, releasing the render session afterwards.
fn render_page(config: &Config, markdown: &str) -> Result<String, CliError> {
    let session = (config.mermaid.enabled && config.mermaid.mode == MermaidMode::Server)
        .then(|| Arc::new(BrowserRenderSession::new(session_config(config))));
    let renderer = session
        .as_ref()
        .map(|session| caching_renderer(session, &config.mermaid.theme));
    if session.is_some() {
        tracing::debug!(
            chrome_path = ?config.chrome.executable(),
            "Mermaid server-side rendering enabled"
        );
    }

    let result = Converter::new(config, renderer).and_then(|converter| converter.convert(markdown));
    if let Some(session) = session {
        session.release();
    }
    result
}

/// Share `session` with the pipeline, memoizing repeated diagrams.
fn caching_renderer<L>(
    session: &Arc<BrowserRenderSession<L>>,
    theme: &str,
) -> Arc<dyn DiagramRenderer>
where
    L: BrowserLauncher + 'static,
    L::Page: 'static,
{
    let inner = Arc::clone(session) as Arc<dyn DiagramRenderer>;
    Arc::new(CachingRenderer::new(inner, theme))
}

fn session_config(config: &Config) -> SessionConfig {
    let library = mermaid_library(&config.mermaid);
    SessionConfig {
        launch: LaunchConfig::for_rendering()
            .with_executable(config.chrome.executable().map(Path::to_path_buf)),
        library,
        theme: config.mermaid.theme.clone(),
    }
}

fn pdf_options(config: &Config) -> PdfOptions {
    let pdf = &config.pdf;
    PdfOptions {
        page_size: PageSize::parse(&pdf.page_size),
        landscape: pdf.landscape,
        scale: pdf.scale,
        margin_top: pdf.margin_top,
        margin_bottom: pdf.margin_bottom,
        margin_left: pdf.margin_left,
        margin_right: pdf.margin_right,
        executable: config.chrome.executable().map(Path::to_path_buf),
    }
}

fn read_input(path: Option<&Path>) -> Result<String, CliError> {
    if let Some(path) = path {
        tracing::debug!(file = %path.display(), "Reading from file");
        return fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        });
    }

    tracing::debug!("Reading from stdin");
    let mut markdown = String::new();
    io::stdin().read_to_string(&mut markdown)?;
    Ok(markdown)
}

fn write_html(path: Option<&Path>, html: &str) -> Result<(), CliError> {
    let Some(path) = path else {
        tracing::debug!("Writing to stdout");
        let mut stdout = io::stdout().lock();
        stdout.write_all(html.as_bytes())?;
        stdout.flush()?;
        return Ok(());
    };

    fs::write(path, html).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    Output::new().success(&format!("Wrote {}", path.display()));
    Ok(())
}

fn write_pdf(config: &Config, html: &str, output: &Path) -> Result<(), CliError> {
    let mut file = tempfile::Builder::new()
        .prefix("mdflux-")
        .suffix(".html")
        .tempfile()?;
    file.write_all(html.as_bytes())?;
    file.flush()?;
    let html_path = file.into_temp_path();
    tracing::debug!(temp_file = %html_path.display(), "Created temporary HTML file");

    let output = std::path::absolute(output)?;
    let result = PdfExporter::new().export(&html_path, &output, &pdf_options(config));
    if let Err(err) = html_path.close() {
        tracing::warn!(error = %err, "Failed to remove temporary file");
    }
    result?;

    Output::new().success(&format!("Wrote {}", output.display()));
    Ok(())
}
