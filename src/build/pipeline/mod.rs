//! Build pipeline for site files.
//!
//! The pipeline transforms the build context through a series of stages:
//! 1. Collections (group files into named, ordered lists)
//! 2. Markdown rendering (`.md` to `.html`)
//! 3. Permalinks (`name.html` to `name/index.html`, optional)
//! 4. Template rendering (`.tera` files)
//! 5. Stylesheet compilation (`.less` to `.css`)
//! 6. Layouts (wrap HTML pages)
//! 7. File writing (output to disk)
//!
//! Custom stages can be inserted before or after any named stage.

mod context;
mod error;
mod stages;

pub use context::{BuildContext, PipelineContext};
pub use error::PipelineError;
pub use stages::clean_output_dir;

use stages::{
    CollectionsStage, LayoutStage, MarkdownStage, PermalinkStage, StylesheetStage,
    TemplateStage, WriteStage,
};

use crate::config::SiteConfig;

/// A stage in the build pipeline.
///
/// Stages run one after another over the whole build context. Each stage
/// finishes before the next one starts, and the first error stops the build.
pub trait Stage {
    /// Unique name for this stage (used for insertion points).
    fn name(&self) -> &'static str;

    /// Process the build context through this stage.
    ///
    /// Files are transformed in place; a stage that changes a file's output
    /// path does so with [`BuildContext::rename`].
    fn process(
        &self,
        build: &mut BuildContext,
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError>;
}

/// The build pipeline.
///
/// Orchestrates the transformation of the build context through a series of
/// stages. The default pipeline is:
/// collections → markdown → permalinks → templates → stylesheets → layouts → write.
///
/// # Extension Points
///
/// Insert custom stages using `insert_before` or `insert_after`:
///
/// ```ignore
/// pipeline.insert_after("markdown", MyCustomStage)?;
/// ```
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// Create an empty pipeline with no stages.
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    /// Create the pipeline described by the site configuration.
    pub fn from_config(config: &SiteConfig) -> Result<Self, PipelineError> {
        let mut pipeline = Self::new();
        pipeline.add_stage(CollectionsStage::new(&config.collections)?);
        pipeline.add_stage(MarkdownStage::new(&config.markdown)?);
        pipeline.add_stage(TemplateStage::new(&config.templates.extensions));
        pipeline.add_stage(StylesheetStage::new(config.stylesheets.minify));
        pipeline.add_stage(LayoutStage::new(&config.layouts)?);
        pipeline.add_stage(WriteStage);

        if config.permalinks.enabled {
            pipeline.insert_after("markdown", PermalinkStage)?;
        }

        Ok(pipeline)
    }

    /// Add a stage to the end of the pipeline.
    pub fn add_stage<S: Stage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Insert a stage before the named stage.
    #[allow(dead_code)]
    pub fn insert_before<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self.position(name)?;
        self.stages.insert(pos, Box::new(stage));
        Ok(self)
    }

    /// Insert a stage after the named stage.
    pub fn insert_after<S: Stage + 'static>(
        &mut self,
        name: &str,
        stage: S,
    ) -> Result<&mut Self, PipelineError> {
        let pos = self.position(name)?;
        self.stages.insert(pos + 1, Box::new(stage));
        Ok(self)
    }

    fn position(&self, name: &str) -> Result<usize, PipelineError> {
        self.stages
            .iter()
            .position(|s| s.name() == name)
            .ok_or_else(|| PipelineError::stage(name, "stage not found in pipeline"))
    }

    /// Run the pipeline over the build context.
    pub fn run(
        &self,
        build: &mut BuildContext,
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for stage in &self.stages {
            log::debug!("running stage '{}' over {} file(s)", stage.name(), build.len());
            stage.process(build, ctx)?;
        }
        Ok(())
    }

    /// Get the names of all stages in order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
