//! Owned document tree built from the pulldown-cmark event stream.
//!
//! pulldown-cmark produces a flat stream of balanced start/end events. The
//! [`Document`] folds that stream into nested [`Node`]s so transformers can
//! find and replace whole blocks, then flattens it back for serialization.

use std::collections::HashMap;
use std::fmt;

use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};

/// Child indices leading from the document root to a node.
pub type NodePath = Vec<usize>;

/// Token identifying an extension node in the renderer dispatch table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtensionKind(&'static str);

impl ExtensionKind {
    /// Create a kind token from a unique name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Name of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Node inserted by a transformer and serialized by a registered node renderer.
///
/// Carries raw, unescaped source text. The node does not own the tree it
/// lives in; it is consumed once during serialization and dropped with the
/// document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionNode {
    /// Dispatch key for the node renderer.
    pub kind: ExtensionKind,
    /// Raw source text.
    pub source: String,
    /// Extra attributes collected by the transformer.
    pub attrs: HashMap<String, String>,
}

impl ExtensionNode {
    /// Create an extension node with no attributes.
    #[must_use]
    pub fn new(kind: ExtensionKind, source: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            attrs: HashMap::new(),
        }
    }

    /// Attach an attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }
}

/// Code block collapsed into a single node.
#[derive(Debug, Clone, PartialEq)]
pub struct CodeBlock<'a> {
    /// Fenced (with info string) or indented.
    pub kind: CodeBlockKind<'a>,
    /// Content lines as emitted by the parser.
    pub lines: Vec<CowStr<'a>>,
}

impl CodeBlock<'_> {
    /// Language tag of a fenced block: the first word of its info string.
    ///
    /// Indented blocks and fences without an info string have no language.
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            CodeBlockKind::Fenced(info) => info.split_whitespace().next(),
            CodeBlockKind::Indented => None,
        }
    }

    /// Concatenation of all content lines.
    #[must_use]
    pub fn content(&self) -> String {
        self.lines.iter().map(AsRef::<str>::as_ref).collect()
    }
}

/// What a node represents.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind<'a> {
    /// Start/end tag pair; content lives in the node's children.
    Container(Tag<'a>),
    /// Any event that is not a start or end tag.
    Leaf(Event<'a>),
    /// Fenced or indented code block.
    CodeBlock(CodeBlock<'a>),
    /// Node produced by an extension.
    Extension(ExtensionNode),
}

/// A node of the document tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Node<'a> {
    pub kind: NodeKind<'a>,
    pub children: Vec<Node<'a>>,
}

impl<'a> Node<'a> {
    #[must_use]
    pub fn leaf(event: Event<'a>) -> Self {
        Self {
            kind: NodeKind::Leaf(event),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn container(tag: Tag<'a>, children: Vec<Node<'a>>) -> Self {
        Self {
            kind: NodeKind::Container(tag),
            children,
        }
    }

    #[must_use]
    pub fn code_block(block: CodeBlock<'a>) -> Self {
        Self {
            kind: NodeKind::CodeBlock(block),
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn extension(node: ExtensionNode) -> Self {
        Self {
            kind: NodeKind::Extension(node),
            children: Vec::new(),
        }
    }

    /// The code block carried by this node, if any.
    #[must_use]
    pub fn as_code_block(&self) -> Option<&CodeBlock<'a>> {
        match &self.kind {
            NodeKind::CodeBlock(block) => Some(block),
            _ => None,
        }
    }

    /// The extension node carried by this node, if any.
    #[must_use]
    pub fn as_extension(&self) -> Option<&ExtensionNode> {
        match &self.kind {
            NodeKind::Extension(node) => Some(node),
            _ => None,
        }
    }
}

/// Structural error in the document tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// End tag without a matching start tag.
    #[error("unbalanced end tag {found:?} (expected {expected:?})")]
    Unbalanced {
        expected: Option<TagEnd>,
        found: TagEnd,
    },
    /// Start tag never closed.
    #[error("unclosed tag {0:?} at end of document")]
    Unclosed(TagEnd),
    /// Event other than text inside a code block.
    #[error("unexpected event inside code block: {0}")]
    UnexpectedInCodeBlock(String),
    /// Path does not point at a node.
    #[error("invalid node path {0:?}")]
    InvalidPath(NodePath),
}

/// Open container while folding events.
struct Frame<'a> {
    tag: Tag<'a>,
    children: Vec<Node<'a>>,
}

/// Ordered tree of nodes for one parsed document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document<'a> {
    children: Vec<Node<'a>>,
}

impl<'a> Document<'a> {
    /// Create a document from top-level nodes.
    #[must_use]
    pub fn new(children: Vec<Node<'a>>) -> Self {
        Self { children }
    }

    /// Fold a balanced event stream into a tree.
    pub fn parse<I>(events: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = Event<'a>>,
    {
        let mut root: Vec<Node<'a>> = Vec::new();
        let mut stack: Vec<Frame<'a>> = Vec::new();
        let mut code: Option<CodeBlock<'a>> = None;

        for event in events {
            if code.is_some() {
                match event {
                    Event::Text(text) => {
                        if let Some(block) = code.as_mut() {
                            block.lines.push(text);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(block) = code.take() {
                            attach(&mut stack, &mut root, Node::code_block(block));
                        }
                    }
                    other => return Err(TreeError::UnexpectedInCodeBlock(format!("{other:?}"))),
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code = Some(CodeBlock {
                        kind,
                        lines: Vec::new(),
                    });
                }
                Event::Start(tag) => stack.push(Frame {
                    tag,
                    children: Vec::new(),
                }),
                Event::End(end) => {
                    let Some(frame) = stack.pop() else {
                        return Err(TreeError::Unbalanced {
                            expected: None,
                            found: end,
                        });
                    };
                    let expected = frame.tag.to_end();
                    if expected != end {
                        return Err(TreeError::Unbalanced {
                            expected: Some(expected),
                            found: end,
                        });
                    }
                    attach(
                        &mut stack,
                        &mut root,
                        Node::container(frame.tag, frame.children),
                    );
                }
                leaf => attach(&mut stack, &mut root, Node::leaf(leaf)),
            }
        }

        if code.is_some() {
            return Err(TreeError::Unclosed(TagEnd::CodeBlock));
        }
        if let Some(frame) = stack.pop() {
            return Err(TreeError::Unclosed(frame.tag.to_end()));
        }

        Ok(Self { children: root })
    }

    /// Top-level nodes.
    #[must_use]
    pub fn children(&self) -> &[Node<'a>] {
        &self.children
    }

    /// Consume the document, returning its top-level nodes.
    #[must_use]
    pub fn into_children(self) -> Vec<Node<'a>> {
        self.children
    }

    /// Visit every node depth-first in document order.
    ///
    /// The visitor receives the node's path from the root. The tree cannot
    /// be mutated during the walk; collect paths and call [`replace`](Self::replace)
    /// afterwards.
    pub fn walk<F>(&self, mut visit: F)
    where
        F: FnMut(&[usize], &Node<'a>),
    {
        let mut path = Vec::new();
        walk_nodes(&self.children, &mut path, &mut visit);
    }

    /// Node at the given path.
    #[must_use]
    pub fn get(&self, path: &[usize]) -> Option<&Node<'a>> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get(*first)?;
        for &index in rest {
            node = node.children.get(index)?;
        }
        Some(node)
    }

    fn get_mut(&mut self, path: &[usize]) -> Option<&mut Node<'a>> {
        let (first, rest) = path.split_first()?;
        let mut node = self.children.get_mut(*first)?;
        for &index in rest {
            node = node.children.get_mut(index)?;
        }
        Some(node)
    }

    /// Replace the node at `path`, returning the previous node.
    pub fn replace(&mut self, path: &[usize], node: Node<'a>) -> Result<Node<'a>, TreeError> {
        let slot = self
            .get_mut(path)
            .ok_or_else(|| TreeError::InvalidPath(path.to_vec()))?;
        Ok(std::mem::replace(slot, node))
    }
}

fn attach<'a>(stack: &mut [Frame<'a>], root: &mut Vec<Node<'a>>, node: Node<'a>) {
    match stack.last_mut() {
        Some(frame) => frame.children.push(node),
        None => root.push(node),
    }
}

fn walk_nodes<'a, F>(nodes: &[Node<'a>], path: &mut Vec<usize>, visit: &mut F)
where
    F: FnMut(&[usize], &Node<'a>),
{
    for (index, node) in nodes.iter().enumerate() {
        path.push(index);
        visit(path, node);
        walk_nodes(&node.children, path, visit);
        path.pop();
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use pulldown_cmark::Parser;

    use super::*;

    const KIND: ExtensionKind = ExtensionKind::new("Test");

    fn parse(markdown: &str) -> Document<'_> {
        Document::parse(Parser::new(markdown)).unwrap()
    }

    #[test]
    fn test_parse_nests_containers() {
        let doc = parse("> quoted *text*\n");

        assert_eq!(doc.children().len(), 1);
        let quote = &doc.children()[0];
        assert!(matches!(quote.kind, NodeKind::Container(Tag::BlockQuote(_))));
        let paragraph = &quote.children[0];
        assert!(matches!(paragraph.kind, NodeKind::Container(Tag::Paragraph)));
        assert!(matches!(
            paragraph.children[1].kind,
            NodeKind::Container(Tag::Emphasis)
        ));
    }

    #[test]
    fn test_parse_collapses_code_block() {
        let doc = parse("```rust extra\nfn main() {}\nlet x = 1;\n```\n");

        let block = doc.children()[0].as_code_block().unwrap();
        assert_eq!(block.language(), Some("rust"));
        assert_eq!(block.content(), "fn main() {}\nlet x = 1;\n");
        assert!(doc.children()[0].children.is_empty());
    }

    #[test]
    fn test_parse_empty_fenced_block() {
        let doc = parse("```mermaid\n```\n");

        let block = doc.children()[0].as_code_block().unwrap();
        assert_eq!(block.language(), Some("mermaid"));
        assert_eq!(block.content(), "");
    }

    #[test]
    fn test_indented_block_has_no_language() {
        let doc = parse("    indented code\n");

        let block = doc.children()[0].as_code_block().unwrap();
        assert_eq!(block.language(), None);
        assert_eq!(block.content(), "indented code\n");
    }

    #[test]
    fn test_fence_without_info_has_no_language() {
        let doc = parse("```\nplain\n```\n");

        assert_eq!(doc.children()[0].as_code_block().unwrap().language(), None);
    }

    #[test]
    fn test_parse_rejects_unbalanced_end() {
        let events = vec![Event::End(TagEnd::Paragraph)];

        let err = Document::parse(events).unwrap_err();
        assert!(matches!(err, TreeError::Unbalanced { expected: None, .. }));
    }

    #[test]
    fn test_parse_rejects_mismatched_end() {
        let events = vec![Event::Start(Tag::Paragraph), Event::End(TagEnd::Emphasis)];

        let err = Document::parse(events).unwrap_err();
        assert!(matches!(
            err,
            TreeError::Unbalanced {
                expected: Some(TagEnd::Paragraph),
                found: TagEnd::Emphasis
            }
        ));
    }

    #[test]
    fn test_parse_rejects_unclosed_tag() {
        let events = vec![Event::Start(Tag::Paragraph), Event::Text("x".into())];

        let err = Document::parse(events).unwrap_err();
        assert!(matches!(err, TreeError::Unclosed(TagEnd::Paragraph)));
    }

    #[test]
    fn test_walk_visits_in_document_order() {
        let doc = parse("# Title\n\n- one\n- two\n");
        let mut paths = Vec::new();

        doc.walk(|path, _| paths.push(path.to_vec()));

        assert_eq!(paths[0], vec![0]);
        assert_eq!(paths[1], vec![0, 0]);
        assert!(paths.contains(&vec![1, 1]));
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_get_and_replace() {
        let mut doc = parse("text\n\n```x\ncode\n```\n");
        let replacement = Node::extension(ExtensionNode::new(KIND, "code\n"));

        let previous = doc.replace(&[1], replacement).unwrap();

        assert!(previous.as_code_block().is_some());
        let node = doc.get(&[1]).unwrap().as_extension().unwrap();
        assert_eq!(node.kind, KIND);
        assert_eq!(node.source, "code\n");
    }

    #[test]
    fn test_replace_invalid_path() {
        let mut doc = parse("text\n");

        let err = doc
            .replace(&[0, 5], Node::extension(ExtensionNode::new(KIND, "")))
            .unwrap_err();
        assert!(matches!(err, TreeError::InvalidPath(path) if path == vec![0, 5]));
        assert!(doc.get(&[]).is_none());
    }

    #[test]
    fn test_extension_node_attrs() {
        let node = ExtensionNode::new(KIND, "src").with_attr("theme", "dark");

        assert_eq!(node.attrs.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(node.kind.name(), "Test");
        assert_eq!(KIND.to_string(), "Test");
    }
}
