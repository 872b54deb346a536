use std::sync::Arc;

use mdflux_renderer::{Extension, PipelineBuilder};

use crate::extractor::{MERMAID_KIND, MermaidExtractor};
use crate::output::MermaidNodeRenderer;
use crate::render::DiagramRenderer;

const PRIORITY: i32 = 100;

/// Mermaid support for a markdown pipeline.
#[derive(Clone, Default)]
pub struct MermaidExtension {
    renderer: MermaidNodeRenderer,
}

impl MermaidExtension {
    /// Leave diagrams to the mermaid library loaded by the page.
    #[must_use]
    pub fn client() -> Self {
        Self {
            renderer: MermaidNodeRenderer::client(),
        }
    }

    /// Pre-render diagrams to SVG with `renderer`.
    #[must_use]
    pub fn server(renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self {
            renderer: MermaidNodeRenderer::server(renderer),
        }
    }
}

impl Extension for MermaidExtension {
    fn extend(self, builder: &mut PipelineBuilder) {
        builder.register_transformer(MermaidExtractor, PRIORITY);
        builder.register_node_renderer(MERMAID_KIND, self.renderer, PRIORITY);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use mdflux_renderer::MarkdownPipeline;

    use super::*;
    use crate::render::RenderError;

    struct Echo;

    impl DiagramRenderer for Echo {
        fn render(&self, source: &str) -> Result<String, RenderError> {
            Ok(format!("<svg>{}</svg>", source.trim()))
        }
    }

    #[test]
    fn test_client_pipeline() {
        let pipeline = MarkdownPipeline::builder()
            .with_extension(MermaidExtension::client())
            .build();

        let html = pipeline
            .render("Intro\n\n```mermaid\ngraph TD\n  A-->B\n```\n")
            .unwrap();

        assert_eq!(
            html,
            "<p>Intro</p>\n<div class=\"mermaid\">graph TD\n  A-->B\n</div>\n"
        );
    }

    #[test]
    fn test_server_pipeline() {
        let pipeline = MarkdownPipeline::builder()
            .with_extension(MermaidExtension::server(Arc::new(Echo)))
            .build();

        let html = pipeline
            .render("```mermaid\nA\n```\n\n```text\nplain\n```\n")
            .unwrap();

        assert_eq!(
            html,
            "<div class=\"mermaid\"><svg>A</svg></div>\n<pre><code class=\"language-text\">plain\n</code></pre>\n"
        );
    }
}
