//! PDF export for mdflux.
//!
//! [`PdfExporter`] prints a finished HTML file to PDF with a fresh headless
//! browser per call. [`PdfOptions`] describes the page geometry.

mod exporter;
mod options;

pub use exporter::{PdfError, PdfExporter};
pub use options::{DEFAULT_MARGIN, DEFAULT_SCALE, PageSize, PdfOptions};
