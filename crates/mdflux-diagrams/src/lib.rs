//! Mermaid diagrams for mdflux.
//!
//! This crate plugs mermaid support into the `mdflux-renderer` pipeline:
//! - [`MermaidExtractor`] replaces ```` ```mermaid ```` fenced blocks with
//!   placeholder nodes of kind [`MERMAID_KIND`]
//! - [`MermaidNodeRenderer`] turns placeholders into HTML, either as a
//!   passthrough `<div class="mermaid">` for client-side rendering or as
//!   inline SVG produced by a [`DiagramRenderer`]
//! - [`BrowserRenderSession`] is the server-side [`DiagramRenderer`]: one
//!   lazily launched headless browser evaluating mermaid for every diagram
//! - [`CachingRenderer`] memoizes successful renders of repeated diagrams
//!
//! The `embed` feature compiles the mermaid bundle into the crate and makes
//! [`MermaidLibrary::Embedded`] the default library.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use mdflux_diagrams::{BrowserRenderSession, MermaidExtension, SessionConfig};
//! use mdflux_renderer::MarkdownPipeline;
//!
//! let session = Arc::new(BrowserRenderSession::new(SessionConfig::default()));
//! let pipeline = MarkdownPipeline::builder()
//!     .with_extension(MermaidExtension::server(session.clone()))
//!     .build();
//!
//! let html = pipeline.render("```mermaid\ngraph TD; A-->B\n```\n")?;
//! session.release();
//! ```

mod cache;
mod extension;
mod extractor;
mod language;
mod output;
mod render;
mod session;
mod template;

pub use cache::{CachingRenderer, DiagramKey};
pub use extension::MermaidExtension;
pub use extractor::{MERMAID_KIND, MermaidExtractor};
pub use language::MERMAID_LANGUAGE;
pub use output::MermaidNodeRenderer;
pub use render::{DiagramRenderer, RenderError};
pub use session::{BrowserRenderSession, READY_SELECTOR, SessionConfig, SessionState};
pub use template::{DEFAULT_MERMAID_URL, MermaidLibrary};
