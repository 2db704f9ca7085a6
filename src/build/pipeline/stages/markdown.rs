//! Markdown rendering stage.
//!
//! Renders `.md` and `.markdown` files to HTML fragments.

use pulldown_cmark::Options;

use crate::build::markdown::{parser_options, render_markdown};
use crate::build::paths::{has_extension, replace_extension};
use crate::build::pipeline::{BuildContext, PipelineContext, PipelineError, Stage};
use crate::config::MarkdownConfig;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Stage that converts markdown files to HTML.
///
/// The body is replaced with the rendered fragment and the key's extension
/// becomes `.html`. Metadata is untouched.
pub struct MarkdownStage {
    options: Options,
}

impl MarkdownStage {
    pub fn new(markdown_config: &MarkdownConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            options: parser_options(markdown_config)?,
        })
    }
}

impl Stage for MarkdownStage {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn process(
        &self,
        build: &mut BuildContext,
        _ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for key in build.keys() {
            if !has_extension(&key, MARKDOWN_EXTENSIONS) {
                continue;
            }
            let Some(record) = build.get_mut(&key) else {
                continue;
            };

            let source = record
                .text()
                .map_err(|_| PipelineError::NotText { path: key.clone() })?;
            let html = render_markdown(source, self.options);
            record.set_text(html);

            build.rename(&key, &replace_extension(&key, "html"))?;
        }

        Ok(())
    }
}
