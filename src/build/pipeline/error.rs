//! Pipeline error types.

use std::path::PathBuf;

use crate::build::markdown::MarkdownError;
use crate::build::render::RenderError;
use crate::build::stylesheet::StylesheetError;

/// Errors that can occur during pipeline processing.
///
/// Errors raised while transforming a file carry that file's path so the
/// CLI can point at it.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("failed to render {path}: {source}")]
    Render { path: String, source: RenderError },

    #[error("failed to compile {path}: {source}")]
    Stylesheet {
        path: String,
        source: StylesheetError,
    },

    #[error("{path} is not valid UTF-8 text")]
    NotText { path: String },

    #[error("cannot rename {from} to {to}: {to} already exists")]
    DuplicatePath { from: String, to: String },

    #[error("invalid permalink '{permalink}' in {path}: segments must be plain names")]
    InvalidPermalink { path: String, permalink: String },

    #[error("{path} would be written outside the output directory")]
    OutsideOutput { path: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to clean {path}: {source}")]
    Clean {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("refusing to clean {destination}: it contains the source directory {source_dir}")]
    UnsafeClean {
        destination: PathBuf,
        source_dir: PathBuf,
    },

    #[error("markdown configuration error: {0}")]
    Markdown(#[from] MarkdownError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }

    /// The file this error concerns, if any.
    pub fn path(&self) -> Option<String> {
        match self {
            Self::Render { path, .. }
            | Self::Stylesheet { path, .. }
            | Self::NotText { path }
            | Self::InvalidPermalink { path, .. }
            | Self::OutsideOutput { path } => Some(path.clone()),
            Self::DuplicatePath { from, .. } => Some(from.clone()),
            Self::Write { path, .. } | Self::Clean { path, .. } => {
                Some(path.display().to_string())
            }
            Self::UnsafeClean { destination, .. } => Some(destination.display().to_string()),
            Self::Markdown(_) | Self::Pattern(_) | Self::Stage { .. } => None,
        }
    }
}
