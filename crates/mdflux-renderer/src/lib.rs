//! Markdown document tree with pluggable transformers and node renderers.
//!
//! This crate turns markdown into HTML in three phases:
//!
//! 1. **Parse**: pulldown-cmark events are folded into an owned [`Document`] tree.
//! 2. **Transform**: registered [`Transformer`]s run in priority order and may
//!    rewrite the tree, e.g. replacing fenced code blocks with [`ExtensionNode`]s.
//! 3. **Serialize**: generic nodes go through pulldown-cmark's HTML writer,
//!    extension nodes are dispatched by [`ExtensionKind`] to their [`NodeRenderer`].
//!
//! The pipeline knows nothing about specific extensions. Features such as
//! diagrams plug in through [`Extension`] and the two registration calls on
//! [`PipelineBuilder`].
//!
//! # Example
//!
//! ```
//! use mdflux_renderer::{MarkdownOptions, MarkdownPipeline};
//!
//! let pipeline = MarkdownPipeline::builder()
//!     .with_options(MarkdownOptions::default())
//!     .build();
//! let html = pipeline.render("# Hello\n\n**Bold** text").unwrap();
//! assert!(html.contains("<strong>Bold</strong>"));
//! ```

mod extension;
mod options;
mod renderer;
mod tree;

pub use extension::{Extension, ExtensionError, NodeRenderer, PipelineBuilder, Transformer};
pub use options::MarkdownOptions;
pub use renderer::{MarkdownPipeline, PipelineError};
pub use tree::{CodeBlock, Document, ExtensionKind, ExtensionNode, Node, NodeKind, NodePath, TreeError};
