//! File writing stage.
//!
//! Writes the final build context to the output directory.

use std::fs;
use std::path::Path;

use crate::build::paths::key_to_output_path;
use crate::build::pipeline::{BuildContext, PipelineContext, PipelineError, Stage};

/// Stage that writes every file to the output directory.
///
/// With `clean` set, everything already under the output directory is
/// removed first. This stage runs last, so a build that fails earlier
/// leaves the previous output in place.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(
        &self,
        build: &mut BuildContext,
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        let outputs = build
            .iter()
            .map(|(key, record)| {
                key_to_output_path(key, ctx.output_dir)
                    .map(|path| (path, record))
                    .ok_or_else(|| PipelineError::OutsideOutput { path: key.clone() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if ctx.clean {
            clean_output_dir(ctx.output_dir, ctx.source_dir)?;
        }

        fs::create_dir_all(ctx.output_dir).map_err(|source| PipelineError::Write {
            path: ctx.output_dir.to_path_buf(),
            source,
        })?;

        for (output_path, record) in &outputs {
            // Create parent directories if needed
            if let Some(parent) = output_path.parent() {
                fs::create_dir_all(parent).map_err(|source| PipelineError::Write {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }

            fs::write(output_path, &record.contents).map_err(|source| PipelineError::Write {
                path: output_path.clone(),
                source,
            })?;
        }

        log::debug!("wrote {} file(s) to {}", build.len(), ctx.output_dir.display());
        Ok(())
    }
}

/// Remove every entry under `output_dir`, keeping the directory itself.
///
/// Refuses when the output directory is, or contains, the source directory.
pub fn clean_output_dir(output_dir: &Path, source_dir: &Path) -> Result<(), PipelineError> {
    if !output_dir.exists() {
        return Ok(());
    }

    let clean_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| PipelineError::Clean { path, source }
    };

    let output = output_dir.canonicalize().map_err(clean_err(output_dir))?;
    if let Ok(source) = source_dir.canonicalize()
        && source.starts_with(&output)
    {
        return Err(PipelineError::UnsafeClean {
            destination: output_dir.to_path_buf(),
            source_dir: source_dir.to_path_buf(),
        });
    }

    for entry in fs::read_dir(output_dir).map_err(clean_err(output_dir))? {
        let entry = entry.map_err(clean_err(output_dir))?;
        let path = entry.path();
        let file_type = entry.file_type().map_err(clean_err(&path))?;
        if file_type.is_dir() {
            fs::remove_dir_all(&path).map_err(clean_err(&path))?;
        } else {
            fs::remove_file(&path).map_err(clean_err(&path))?;
        }
    }

    Ok(())
}
