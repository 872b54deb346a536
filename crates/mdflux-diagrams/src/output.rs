//! HTML output for mermaid placeholders.

use std::sync::Arc;

use mdflux_renderer::{ExtensionError, ExtensionNode, NodeRenderer};

use crate::render::DiagramRenderer;

/// Serializes mermaid placeholders.
///
/// Without a renderer the raw source is wrapped for client-side rendering.
/// With one, the SVG is inlined; render failures degrade to an HTML comment
/// and a `<pre>` block with the source, so a broken diagram never fails
/// the document.
#[derive(Clone, Default)]
pub struct MermaidNodeRenderer {
    renderer: Option<Arc<dyn DiagramRenderer>>,
}

impl MermaidNodeRenderer {
    /// Emit `<div class="mermaid">` passthrough blocks.
    #[must_use]
    pub fn client() -> Self {
        Self { renderer: None }
    }

    /// Render diagrams to inline SVG.
    #[must_use]
    pub fn server(renderer: Arc<dyn DiagramRenderer>) -> Self {
        Self {
            renderer: Some(renderer),
        }
    }

    /// Append the HTML fragment for one diagram source.
    pub fn write(&self, source: &str, out: &mut String) {
        let Some(renderer) = &self.renderer else {
            push_div(out, source);
            return;
        };

        match renderer.render(source) {
            Ok(svg) => push_div(out, &svg),
            Err(err) => {
                tracing::warn!(error = %err, "Mermaid render failed, emitting source");
                out.push_str("<!-- mermaid render error: ");
                // A literal `-->` would end the comment early.
                out.push_str(&err.to_string().replace("-->", "--&gt;"));
                out.push_str(" -->\n");
                out.push_str("<pre class=\"mermaid-error\"><code>");
                out.push_str(source);
                out.push_str("</code></pre>\n");
            }
        }
    }
}

fn push_div(out: &mut String, content: &str) {
    out.push_str("<div class=\"mermaid\">");
    out.push_str(content);
    out.push_str("</div>\n");
}

impl NodeRenderer for MermaidNodeRenderer {
    fn render(&self, node: &ExtensionNode, out: &mut String) -> Result<(), ExtensionError> {
        self.write(&node.source, out);
        Ok(())
    }
}
