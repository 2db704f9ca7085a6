//! Pipeline contexts: the file map being transformed and the shared
//! resources every stage can read.

use std::collections::BTreeMap;
use std::path::Path;

use serde_json::Value;

use crate::build::document::{FileRecord, Metadata};
use crate::build::paths::key_to_url;
use crate::build::pipeline::PipelineError;
use crate::build::render::Renderer;

// =============================================================================
// Build context
// =============================================================================

/// All files of one build, keyed by source-relative path.
///
/// Keys stay unique at every stage boundary: [`BuildContext::rename`] refuses
/// to overwrite an existing key. Collections refer to files by key and are
/// kept in step with renames.
#[derive(Debug, Default)]
pub struct BuildContext {
    files: BTreeMap<String, FileRecord>,
    collections: BTreeMap<String, Vec<String>>,
}

impl BuildContext {
    /// Create a context from the files read out of the source directory.
    pub fn new(files: BTreeMap<String, FileRecord>) -> Self {
        Self {
            files,
            collections: BTreeMap::new(),
        }
    }

    /// Number of files in the build.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Iterate files in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FileRecord)> {
        self.files.iter()
    }

    /// A snapshot of the current keys, for stages that rename while iterating.
    pub fn keys(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    pub fn get(&self, key: &str) -> Option<&FileRecord> {
        self.files.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut FileRecord> {
        self.files.get_mut(key)
    }

    /// Move a file to a new key.
    ///
    /// Renaming onto an existing key is an error; renaming a key to itself
    /// is a no-op. Collection entries follow the file.
    pub fn rename(&mut self, from: &str, to: &str) -> Result<(), PipelineError> {
        if from == to {
            return Ok(());
        }
        if self.files.contains_key(to) {
            return Err(PipelineError::DuplicatePath {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let Some(record) = self.files.remove(from) else {
            return Err(PipelineError::stage(
                "rename",
                format!("no file named {from} in the build"),
            ));
        };
        self.files.insert(to.to_string(), record);

        for members in self.collections.values_mut() {
            for member in members.iter_mut().filter(|m| m.as_str() == from) {
                *member = to.to_string();
            }
        }
        Ok(())
    }

    /// The computed collections, by name.
    pub fn collections(&self) -> &BTreeMap<String, Vec<String>> {
        &self.collections
    }

    /// Replace the computed collections.
    pub fn set_collections(&mut self, collections: BTreeMap<String, Vec<String>>) {
        self.collections = collections;
    }

    /// Template view of one file: its metadata plus `path`, `url` and `title`.
    ///
    /// With `with_contents`, the file body is included as `contents`.
    pub fn page_view(&self, key: &str, with_contents: bool) -> Metadata {
        let Some(record) = self.files.get(key) else {
            return Metadata::new();
        };

        let mut view = record.metadata.clone();
        view.insert("path".to_string(), Value::from(key));
        view.insert("url".to_string(), Value::from(key_to_url(key)));
        view.insert("title".to_string(), Value::from(record.title(key)));
        if with_contents {
            view.insert("contents".to_string(), Value::from(record.text_lossy()));
        }
        view
    }

    /// Template view of every collection: name to a list of page views.
    pub fn collection_views(&self) -> Metadata {
        self.collections
            .iter()
            .map(|(name, members)| {
                let entries = members
                    .iter()
                    .map(|key| Value::Object(self.page_view(key, true)))
                    .collect();
                (name.clone(), Value::Array(entries))
            })
            .collect()
    }
}

// =============================================================================
// Pipeline context
// =============================================================================

/// Shared, read-mostly resources for pipeline stages.
pub struct PipelineContext<'a> {
    // === Output configuration ===
    /// Directory where output files are written
    pub output_dir: &'a Path,

    /// Directory the files were read from
    pub source_dir: &'a Path,

    /// Remove existing output before writing
    pub clean: bool,

    // === Site-level data ===
    /// Global metadata, exposed to templates as `site`
    pub site: &'a Metadata,

    // === Services ===
    /// Template renderer (needs mutable access for inline templates)
    pub renderer: &'a mut Renderer,
}

impl<'a> PipelineContext<'a> {
    /// Create a new pipeline context.
    pub fn new(
        output_dir: &'a Path,
        source_dir: &'a Path,
        clean: bool,
        site: &'a Metadata,
        renderer: &'a mut Renderer,
    ) -> Self {
        Self {
            output_dir,
            source_dir,
            clean,
            site,
            renderer,
        }
    }
}
