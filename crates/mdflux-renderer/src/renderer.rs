//! Markdown to HTML pipeline.

use std::collections::HashMap;
use std::sync::Arc;

use pulldown_cmark::{CowStr, Event, Parser, Tag, html};

use crate::extension::{ExtensionError, NodeRenderer, PipelineBuilder, Transformer};
use crate::options::MarkdownOptions;
use crate::tree::{Document, ExtensionKind, ExtensionNode, Node, NodeKind, TreeError};

const RAW_HTML_OMITTED: &str = "<!-- raw HTML omitted -->";

/// Error produced while converting a document.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Event stream could not be folded into a tree.
    #[error(transparent)]
    Tree(#[from] TreeError),
    /// A transformer failed.
    #[error("transformer {name} failed: {source}")]
    Transform {
        name: &'static str,
        #[source]
        source: ExtensionError,
    },
    /// A transformer inserted a node nobody registered a renderer for.
    #[error("no node renderer registered for {0}")]
    MissingRenderer(ExtensionKind),
    /// A node renderer failed.
    #[error("failed to render {kind} node: {source}")]
    Render {
        kind: ExtensionKind,
        #[source]
        source: ExtensionError,
    },
}

/// Configured markdown converter.
///
/// Immutable once built, so one pipeline can serve any number of documents
/// and threads.
pub struct MarkdownPipeline {
    options: MarkdownOptions,
    transformers: Vec<Arc<dyn Transformer>>,
    renderers: HashMap<ExtensionKind, Arc<dyn NodeRenderer>>,
}

impl MarkdownPipeline {
    pub(crate) fn new(
        options: MarkdownOptions,
        transformers: Vec<Arc<dyn Transformer>>,
        renderers: HashMap<ExtensionKind, Arc<dyn NodeRenderer>>,
    ) -> Self {
        Self {
            options,
            transformers,
            renderers,
        }
    }

    /// Start configuring a pipeline.
    #[must_use]
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    /// Options this pipeline was built with.
    #[must_use]
    pub fn options(&self) -> &MarkdownOptions {
        &self.options
    }

    /// Convert markdown source to an HTML fragment.
    ///
    /// # Errors
    ///
    /// Returns an error if a transformer or node renderer fails, or if a
    /// transformer leaves an extension node without a registered renderer.
    pub fn render(&self, markdown: &str) -> Result<String, PipelineError> {
        let parser = Parser::new_ext(markdown, self.options.parser_options());
        let mut document = Document::parse(parser)?;

        for transformer in &self.transformers {
            tracing::trace!(transformer = transformer.name(), "Running transformer");
            transformer
                .transform(&mut document)
                .map_err(|source| PipelineError::Transform {
                    name: transformer.name(),
                    source,
                })?;
        }

        let mut events = Vec::new();
        self.flatten(document.into_children(), &mut events)?;

        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, events.into_iter());
        Ok(out)
    }

    fn flatten<'a>(&self, nodes: Vec<Node<'a>>, events: &mut Vec<Event<'a>>) -> Result<(), PipelineError> {
        for node in nodes {
            match node.kind {
                NodeKind::Container(Tag::HtmlBlock) if !self.options.unsafe_html => {
                    events.push(Event::Html(CowStr::from(format!("{RAW_HTML_OMITTED}\n"))));
                }
                NodeKind::Container(tag) => {
                    let end = tag.to_end();
                    events.push(Event::Start(tag));
                    self.flatten(node.children, events)?;
                    events.push(Event::End(end));
                }
                NodeKind::Leaf(event) => events.push(self.leaf(event)),
                NodeKind::CodeBlock(block) => {
                    events.push(Event::Start(Tag::CodeBlock(block.kind)));
                    events.extend(block.lines.into_iter().map(Event::Text));
                    events.push(Event::End(pulldown_cmark::TagEnd::CodeBlock));
                }
                NodeKind::Extension(extension) => {
                    events.push(Event::Html(CowStr::from(self.render_extension(&extension)?)));
                }
            }
        }
        Ok(())
    }

    fn leaf<'a>(&self, event: Event<'a>) -> Event<'a> {
        match event {
            Event::InlineHtml(_) if !self.options.unsafe_html => {
                Event::InlineHtml(CowStr::Borrowed(RAW_HTML_OMITTED))
            }
            Event::SoftBreak if self.options.hard_wraps => Event::HardBreak,
            other => other,
        }
    }

    fn render_extension(&self, node: &ExtensionNode) -> Result<String, PipelineError> {
        let renderer = self
            .renderers
            .get(&node.kind)
            .ok_or(PipelineError::MissingRenderer(node.kind))?;
        let mut out = String::new();
        renderer
            .render(node, &mut out)
            .map_err(|source| PipelineError::Render {
                kind: node.kind,
                source,
            })?;
        Ok(out)
    }
}
