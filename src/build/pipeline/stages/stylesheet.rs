//! Stylesheet compilation stage.

use crate::build::paths::{file_name, has_extension, replace_extension};
use crate::build::pipeline::{BuildContext, PipelineContext, PipelineError, Stage};
use crate::build::stylesheet::compile_less;

/// Stage that compiles `.less` files to `.css`.
pub struct StylesheetStage {
    minify: bool,
}

impl StylesheetStage {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }
}

impl Stage for StylesheetStage {
    fn name(&self) -> &'static str {
        "stylesheets"
    }

    fn process(
        &self,
        build: &mut BuildContext,
        _ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for key in build.keys() {
            if !has_extension(&key, &["less"]) {
                continue;
            }
            let Some(record) = build.get_mut(&key) else {
                continue;
            };

            let source = record
                .text()
                .map_err(|_| PipelineError::NotText { path: key.clone() })?;
            let css = compile_less(source, file_name(&key), self.minify).map_err(|source| {
                PipelineError::Stylesheet {
                    path: key.clone(),
                    source,
                }
            })?;
            record.set_text(css);

            build.rename(&key, &replace_extension(&key, "css"))?;
        }

        Ok(())
    }
}
