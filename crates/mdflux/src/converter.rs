//! Markdown to HTML page conversion.

use std::fs;
use std::sync::Arc;

use mdflux_config::{Config, MermaidConfig, MermaidMode};
use mdflux_diagrams::{DEFAULT_MERMAID_URL, DiagramRenderer, MermaidExtension, MermaidLibrary};
use mdflux_renderer::{MarkdownOptions, MarkdownPipeline};

use crate::error::CliError;
use crate::template::{MermaidLoader, PageTemplate};

/// Converts markdown documents into complete HTML pages.
pub(crate) struct Converter {
    pipeline: MarkdownPipeline,
    template: PageTemplate,
}

impl Converter {
    /// Build a converter for `config`.
    ///
    /// `renderer` is used for server-side mermaid rendering. Without one,
    /// enabled diagrams are left to the browser viewing the page.
    pub(crate) fn new(
        config: &Config,
        renderer: Option<Arc<dyn DiagramRenderer>>,
    ) -> Result<Self, CliError> {
        let mut builder = MarkdownPipeline::builder().with_options(markdown_options(config));
        let mut mermaid = None;

        if config.mermaid.enabled {
            match renderer {
                Some(renderer) if config.mermaid.mode == MermaidMode::Server => {
                    builder = builder.with_extension(MermaidExtension::server(renderer));
                }
                _ => {
                    builder = builder.with_extension(MermaidExtension::client());
                    let loader = client_loader(mermaid_library(&config.mermaid))?;
                    mermaid = Some((loader, config.mermaid.theme.clone()));
                }
            }
        }

        Ok(Self {
            pipeline: builder.build(),
            template: PageTemplate {
                title: config.html.title.clone(),
                theme: config.html.theme,
                xhtml: config.html.xhtml,
                mermaid,
            },
        })
    }

    /// Convert `markdown` into a full HTML document.
    pub(crate) fn convert(&self, markdown: &str) -> Result<String, CliError> {
        let body = self.pipeline.render(markdown)?;
        Ok(self.template.render(&body))
    }
}

fn markdown_options(config: &Config) -> MarkdownOptions {
    let markdown = &config.markdown;
    MarkdownOptions {
        tables: markdown.tables,
        strikethrough: markdown.strikethrough,
        task_lists: markdown.task_lists,
        footnotes: markdown.footnotes,
        smart_punctuation: markdown.smart_punctuation,
        definition_lists: markdown.definition_lists,
        unsafe_html: config.html.unsafe_html,
        hard_wraps: config.html.hard_wraps,
    }
}

/// Mermaid library selected by configuration.
///
/// A local script wins over a URL. Without either, the bundle built into
/// the binary is used, or the jsDelivr bundle when none is built in.
pub(crate) fn mermaid_library(mermaid: &MermaidConfig) -> MermaidLibrary {
    match (&mermaid.script, &mermaid.script_url) {
        (Some(path), _) => MermaidLibrary::File(path.clone()),
        (None, Some(url)) => MermaidLibrary::Url(url.clone()),
        (None, None) => MermaidLibrary::default(),
    }
}

fn client_loader(library: MermaidLibrary) -> Result<MermaidLoader, CliError> {
    match library {
        MermaidLibrary::Embedded => Ok(MermaidLibrary::embedded_source().map_or_else(
            || MermaidLoader::Url(DEFAULT_MERMAID_URL.to_owned()),
            |source| MermaidLoader::Inline(source.to_owned()),
        )),
        MermaidLibrary::File(path) => match fs::read_to_string(&path) {
            Ok(source) => Ok(MermaidLoader::Inline(source)),
            Err(source) => Err(CliError::Read { path, source }),
        },
        MermaidLibrary::Url(url) => Ok(MermaidLoader::Url(url)),
    }
}
