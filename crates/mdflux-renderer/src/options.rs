use pulldown_cmark::Options;

/// Markdown dialect and HTML output options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct MarkdownOptions {
    /// GFM tables.
    pub tables: bool,
    /// `~~strikethrough~~`.
    pub strikethrough: bool,
    /// `- [x]` task list items.
    pub task_lists: bool,
    /// `[^1]` footnotes.
    pub footnotes: bool,
    /// Typographic quotes and dashes.
    pub smart_punctuation: bool,
    /// Definition lists.
    pub definition_lists: bool,
    /// Pass raw HTML through. When false it is replaced by a comment.
    pub unsafe_html: bool,
    /// Render soft line breaks as `<br />`.
    pub hard_wraps: bool,
}

impl Default for MarkdownOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: true,
            footnotes: true,
            smart_punctuation: true,
            definition_lists: true,
            unsafe_html: false,
            hard_wraps: false,
        }
    }
}

impl MarkdownOptions {
    /// Parser options for pulldown-cmark.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        options.set(Options::ENABLE_TABLES, self.tables);
        options.set(Options::ENABLE_STRIKETHROUGH, self.strikethrough);
        options.set(Options::ENABLE_TASKLISTS, self.task_lists);
        options.set(Options::ENABLE_FOOTNOTES, self.footnotes);
        options.set(Options::ENABLE_SMART_PUNCTUATION, self.smart_punctuation);
        options.set(Options::ENABLE_DEFINITION_LIST, self.definition_lists);
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_enables_gfm() {
        let options = MarkdownOptions::default().parser_options();

        assert!(options.contains(Options::ENABLE_TABLES));
        assert!(options.contains(Options::ENABLE_STRIKETHROUGH));
        assert!(options.contains(Options::ENABLE_TASKLISTS));
        assert!(options.contains(Options::ENABLE_FOOTNOTES));
        assert!(options.contains(Options::ENABLE_DEFINITION_LIST));
    }

    #[test]
    fn test_disabled_flags_are_cleared() {
        let options = MarkdownOptions {
            tables: false,
            smart_punctuation: false,
            ..MarkdownOptions::default()
        }
        .parser_options();

        assert!(!options.contains(Options::ENABLE_TABLES));
        assert!(!options.contains(Options::ENABLE_SMART_PUNCTUATION));
        assert!(options.contains(Options::ENABLE_STRIKETHROUGH));
    }
}
