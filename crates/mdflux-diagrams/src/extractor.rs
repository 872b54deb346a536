//! Mermaid block extraction.

use mdflux_renderer::{Document, ExtensionError, ExtensionKind, ExtensionNode, Node, NodePath, Transformer};

use crate::language::is_mermaid;

/// Kind of the placeholder node standing in for a mermaid block.
pub const MERMAID_KIND: ExtensionKind = ExtensionKind::new("MermaidBlock");

/// Replaces fenced mermaid blocks with [`MERMAID_KIND`] placeholder nodes.
///
/// Matches are collected during the walk and replaced afterwards, so the
/// tree is never mutated while it is being traversed. The placeholder
/// carries the block content unescaped; an empty block still yields a
/// placeholder with empty source.
#[derive(Debug, Default, Clone, Copy)]
pub struct MermaidExtractor;

impl Transformer for MermaidExtractor {
    fn name(&self) -> &'static str {
        "mermaid"
    }

    fn transform(&self, document: &mut Document<'_>) -> Result<(), ExtensionError> {
        let mut pending: Vec<(NodePath, String)> = Vec::new();
        document.walk(|path, node| {
            if let Some(block) = node.as_code_block()
                && block.language().is_some_and(is_mermaid)
            {
                pending.push((path.to_vec(), block.content()));
            }
        });

        if !pending.is_empty() {
            tracing::debug!(count = pending.len(), "Extracted mermaid blocks");
        }

        for (path, source) in pending {
            let placeholder = Node::extension(ExtensionNode::new(MERMAID_KIND, source));
            document.replace(&path, placeholder)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::Parser;

    use super::*;

    fn extract(markdown: &str) -> Vec<String> {
        let mut document = Document::parse(Parser::new(markdown)).unwrap();
        MermaidExtractor.transform(&mut document).unwrap();

        let mut sources = Vec::new();
        document.walk(|_, node| {
            if let Some(placeholder) = node.as_extension() {
                assert_eq!(placeholder.kind, MERMAID_KIND);
                sources.push(placeholder.source.clone());
            }
        });
        sources
    }

    #[test]
    fn test_extracts_mermaid_block() {
        let sources = extract("# Title\n\n```mermaid\ngraph TD\n  A --> B\n```\n");

        assert_eq!(sources, vec!["graph TD\n  A --> B\n".to_owned()]);
    }

    #[test]
    fn test_ignores_other_languages() {
        let sources = extract("```Mermaid\nx\n```\n\n```rust\nfn f() {}\n```\n\n    indented\n");

        assert!(sources.is_empty());
    }

    #[test]
    fn test_empty_block_yields_empty_placeholder() {
        let sources = extract("```mermaid\n```\n");

        assert_eq!(sources, vec![String::new()]);
    }

    #[test]
    fn test_extracts_nested_and_multiple_blocks() {
        let markdown = "```mermaid\nA\n```\n\n> ```mermaid\n> B\n> ```\n\n- item\n\n  ```mermaid\n  C\n  ```\n";

        let sources = extract(markdown);

        assert_eq!(
            sources,
            vec!["A\n".to_owned(), "B\n".to_owned(), "C\n".to_owned()]
        );
    }

    #[test]
    fn test_source_is_not_escaped() {
        let sources = extract("```mermaid\nA[\"<b>&</b>\"] --> B\n```\n");

        assert_eq!(sources, vec!["A[\"<b>&</b>\"] --> B\n".to_owned()]);
    }

    #[test]
    fn test_info_string_extra_words() {
        let sources = extract("```mermaid title=\"flow\"\nA\n```\n");

        assert_eq!(sources, vec!["A\n".to_owned()]);
    }
}
