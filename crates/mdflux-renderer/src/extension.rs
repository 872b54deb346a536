//! Extension registration.
//!
//! Extensions hook into two pipeline phases: a [`Transformer`] rewrites the
//! parsed [`Document`] and a [`NodeRenderer`] serializes the extension nodes
//! that transformers inserted. Both are registered with an integer priority;
//! lower values run (or win dispatch) first.

use std::collections::HashMap;
use std::sync::Arc;

use crate::options::MarkdownOptions;
use crate::renderer::MarkdownPipeline;
use crate::tree::{Document, ExtensionKind, ExtensionNode};

/// Error type returned by extension hooks.
pub type ExtensionError = Box<dyn std::error::Error + Send + Sync>;

/// Rewrites the document tree between parsing and serialization.
pub trait Transformer: Send + Sync {
    /// Name used in error messages and logs.
    fn name(&self) -> &'static str;

    /// Transform the document in place.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be transformed. The whole
    /// conversion fails with it.
    fn transform(&self, document: &mut Document<'_>) -> Result<(), ExtensionError>;
}

/// Serializes one kind of extension node to HTML.
pub trait NodeRenderer: Send + Sync {
    /// Append the HTML for `node` to `out`.
    ///
    /// # Errors
    ///
    /// Returns an error if the node cannot be written.
    fn render(&self, node: &ExtensionNode, out: &mut String) -> Result<(), ExtensionError>;
}

/// A bundle of transformers and node renderers installed together.
pub trait Extension {
    /// Register this extension's hooks on the builder.
    fn extend(self, builder: &mut PipelineBuilder);
}

struct Prioritized<T> {
    priority: i32,
    value: T,
}

/// Builder for [`MarkdownPipeline`].
#[derive(Default)]
pub struct PipelineBuilder {
    options: MarkdownOptions,
    transformers: Vec<Prioritized<Arc<dyn Transformer>>>,
    renderers: Vec<Prioritized<(ExtensionKind, Arc<dyn NodeRenderer>)>>,
}

impl PipelineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set parser and serializer options.
    #[must_use]
    pub fn with_options(mut self, options: MarkdownOptions) -> Self {
        self.options = options;
        self
    }

    /// Install an extension.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Extension) -> Self {
        extension.extend(&mut self);
        self
    }

    /// Register a tree transformer.
    ///
    /// Transformers run in ascending priority order; equal priorities keep
    /// registration order.
    pub fn register_transformer(&mut self, transformer: impl Transformer + 'static, priority: i32) {
        self.transformers.push(Prioritized {
            priority,
            value: Arc::new(transformer),
        });
    }

    /// Register a renderer for nodes of `kind`.
    ///
    /// When several renderers claim the same kind, the lowest priority wins
    /// and ties go to the first registered.
    pub fn register_node_renderer(
        &mut self,
        kind: ExtensionKind,
        renderer: impl NodeRenderer + 'static,
        priority: i32,
    ) {
        self.renderers.push(Prioritized {
            priority,
            value: (kind, Arc::new(renderer)),
        });
    }

    /// Build the pipeline.
    #[must_use]
    pub fn build(self) -> MarkdownPipeline {
        let Self {
            options,
            mut transformers,
            mut renderers,
        } = self;

        transformers.sort_by_key(|entry| entry.priority);
        renderers.sort_by_key(|entry| entry.priority);

        let mut dispatch: HashMap<ExtensionKind, Arc<dyn NodeRenderer>> = HashMap::new();
        for entry in renderers {
            let (kind, renderer) = entry.value;
            dispatch.entry(kind).or_insert(renderer);
        }

        MarkdownPipeline::new(
            options,
            transformers.into_iter().map(|entry| entry.value).collect(),
            dispatch,
        )
    }
}
