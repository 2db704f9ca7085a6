use std::path::PathBuf;

use crate::config::SiteConfig;

use super::pipeline::{BuildContext, Pipeline, PipelineContext, PipelineError};
use super::render::{RenderError, Renderer};
use super::source::{SourceError, SourceReader};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl BuildError {
    /// The file this error concerns, if any.
    pub fn path(&self) -> Option<String> {
        match self {
            Self::Source(
                SourceError::PathNotFound(path)
                | SourceError::NotADirectory(path)
                | SourceError::ReadDir { path, .. }
                | SourceError::ReadEntry { path, .. }
                | SourceError::ReadFile { path, .. },
            ) => Some(path.display().to_string()),
            Self::Source(SourceError::Pattern(_)) | Self::Render(_) => None,
            Self::Pipeline(err) => err.path(),
        }
    }
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    /// Files written to the output directory
    pub files: usize,
    /// Collections computed, by name and size
    pub collections: Vec<(String, usize)>,
}

pub struct Builder {
    config: SiteConfig,
    /// Base path for resolving relative paths (typically the config file's directory)
    base_path: PathBuf,
}

impl Builder {
    pub fn new(config: SiteConfig, base_path: PathBuf) -> Self {
        Self { config, base_path }
    }

    pub fn build(&self) -> Result<BuildResult, BuildError> {
        // Build pipeline:
        // 1. Read the source tree -> BuildContext
        // 2. Load layouts
        // 3. Run the stages; the last one writes the output

        // Step 1: Read source files
        let source_dir = self.source_dir();
        let reader = SourceReader::new(&source_dir, &self.config.ignore, self.config.frontmatter)?;
        let files = reader.read()?;
        let display_source = reader.root().canonicalize().unwrap_or(source_dir.clone());
        log::info!("Read {} file(s) from {}", files.len(), display_source.display());

        let mut build = BuildContext::new(files);

        // Step 2: Load layouts
        let layouts_dir = self.config.layouts_dir(&self.base_path);
        let mut renderer = Renderer::new(&layouts_dir)?;

        // Step 3: Run the pipeline
        let pipeline = Pipeline::from_config(&self.config)?;
        let output_dir = self.output_dir();
        let mut ctx = PipelineContext::new(
            &output_dir,
            &source_dir,
            self.config.clean,
            &self.config.metadata,
            &mut renderer,
        );
        pipeline.run(&mut build, &mut ctx)?;

        let collections: Vec<(String, usize)> = build
            .collections()
            .iter()
            .map(|(name, members)| (name.clone(), members.len()))
            .collect();
        for (name, count) in &collections {
            log::info!("  - collection {}: {} file(s)", name, count);
        }

        let display_output = output_dir.canonicalize().unwrap_or(output_dir.clone());
        log::info!("Wrote {} file(s) to {}", build.len(), display_output.display());

        Ok(BuildResult {
            output_dir,
            files: build.len(),
            collections,
        })
    }

    /// Get the resolved source directory.
    fn source_dir(&self) -> PathBuf {
        self.config.source_dir(&self.base_path)
    }

    /// Get the resolved output directory.
    fn output_dir(&self) -> PathBuf {
        self.config.destination_dir(&self.base_path)
    }
}
