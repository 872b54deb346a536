//! Diagram language marker.

/// Info-string language that marks a fenced block as a mermaid diagram.
pub const MERMAID_LANGUAGE: &str = "mermaid";

/// Whether a fence language tag selects a mermaid diagram.
///
/// Exact, case-sensitive byte comparison: `Mermaid` or `mermaid-js` are
/// ordinary code blocks.
#[must_use]
pub fn is_mermaid(language: &str) -> bool {
    language == MERMAID_LANGUAGE
}
