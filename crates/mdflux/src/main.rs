//! mdflux CLI - Markdown to HTML and PDF converter.
//!
//! Converts one markdown document into a styled HTML page or a PDF file.
//! Mermaid diagrams are rendered to inline SVG with a headless browser, or
//! left for the page to render when `--mermaid-mode client` is used.

mod convert;
mod converter;
mod error;
mod logging;
mod output;
mod template;

use clap::Parser;

use convert::ConvertArgs;
use output::Output;

/// mdflux - Markdown to HTML and PDF converter.
#[derive(Parser)]
#[command(name = "mdflux", version, about)]
struct Cli {
    #[command(flatten)]
    args: ConvertArgs,
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    if let Err(err) = cli.args.execute() {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
