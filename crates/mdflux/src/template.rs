//! HTML page template wrapping converted markdown.

use std::fmt::Write;

use mdflux_config::HtmlTheme;

const STYLES: &str = include_str!("../assets/styles.css");

/// How the page loads mermaid for client-side rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MermaidLoader {
    /// Library source inlined into a `<script>` element.
    Inline(String),
    /// Library referenced by URL.
    Url(String),
}

/// Everything needed to render a page besides the body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageTemplate {
    pub(crate) title: String,
    pub(crate) theme: HtmlTheme,
    /// Emit an XHTML 1.0 Strict document instead of HTML5.
    pub(crate) xhtml: bool,
    /// Present only when diagrams are rendered in the browser viewing the page.
    pub(crate) mermaid: Option<(MermaidLoader, String)>,
}

impl PageTemplate {
    /// Render a complete HTML5 or XHTML document around `body`.
    pub(crate) fn render(&self, body: &str) -> String {
        let mut html = String::with_capacity(STYLES.len() + body.len() + 512);
        let close = if self.xhtml { " />" } else { ">" };

        if self.xhtml {
            let _ = write!(
                html,
                "{XML_DECLARATION}\n{XHTML_DOCTYPE}\n<html xmlns=\"http://www.w3.org/1999/xhtml\" \
                 lang=\"en\" xml:lang=\"en\" data-theme=\"{}\">\n<head>\n",
                self.theme
            );
            let _ = writeln!(
                html,
                "<meta http-equiv=\"Content-Type\" content=\"application/xhtml+xml; charset=utf-8\"{close}"
            );
        } else {
            let _ = write!(
                html,
                "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"{}\">\n<head>\n",
                self.theme
            );
            html.push_str("<meta charset=\"utf-8\">\n");
        }
        let _ = writeln!(
            html,
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"{close}"
        );
        let _ = writeln!(html, "<title>{}</title>", escape(&self.title));
        html.push_str("<style>\n");
        push_raw_text(&mut html, STYLES, self.xhtml, ("/*<![CDATA[*/\n", "/*]]>*/\n"));
        html.push_str("</style>\n");
        html.push_str("</head>\n<body>\n");
        html.push_str(body);
        if let Some((loader, theme)) = &self.mermaid {
            render_mermaid_loader(&mut html, loader, theme, self.xhtml);
        }
        html.push_str("</body>\n</html>\n");
        html
    }
}

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";
const XHTML_DOCTYPE: &str = "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\" \
                             \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">";

/// Append script or style text, inside a commented CDATA section for XHTML.
///
/// A `]]>` in the text would end the section early, so it is split across
/// two sections.
fn push_raw_text(html: &mut String, text: &str, xhtml: bool, (open, close): (&str, &str)) {
    if xhtml {
        html.push_str(open);
        html.push_str(&text.replace("]]>", "]]]]><![CDATA[>"));
        if !text.ends_with('\n') {
            html.push('\n');
        }
        html.push_str(close);
    } else {
        html.push_str(text);
    }
}

fn render_mermaid_loader(html: &mut String, loader: &MermaidLoader, theme: &str, xhtml: bool) {
    match loader {
        MermaidLoader::Inline(source) => {
            html.push_str("<script>\n");
            push_raw_text(html, source, xhtml, ("//<![CDATA[\n", "//]]>\n"));
            if !xhtml {
                html.push('\n');
            }
            html.push_str("</script>\n");
        }
        MermaidLoader::Url(url) => {
            let _ = writeln!(html, "<script src=\"{}\"></script>", escape(url));
        }
    }
    let theme = serde_json::to_string(theme).unwrap_or_else(|_| "\"default\"".to_owned());
    let _ = writeln!(
        html,
        "<script>mermaid.initialize({{ startOnLoad: true, theme: {theme} }});</script>"
    );
}

fn escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
