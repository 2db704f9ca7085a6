//! Configuration type definitions.
//!
//! This module contains the data structures used in `kiln.yaml`.
//! These types are pure data - no I/O or complex logic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// =============================================================================
// Site configuration
// =============================================================================

/// The full site configuration.
///
/// Every field has a default, so an empty (or missing) config file
/// describes the conventional layout:
///
/// ```yaml
/// metadata:
///   sitename: My Site
/// source: src/site
/// destination: build
/// clean: true
/// collections:
///   - name: posts
///     pattern: "*.md"
/// layouts:
///   directory: src/layouts
///   default: page.html
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site-wide values, available in every template as `site.*`
    pub metadata: serde_json::Map<String, serde_json::Value>,
    /// Directory the source tree is read from
    pub source: PathBuf,
    /// Directory the output tree is written to
    pub destination: PathBuf,
    /// Remove everything under `destination` before writing
    pub clean: bool,
    /// Parse YAML front matter at the top of text files
    pub frontmatter: bool,
    /// Glob patterns (relative to `source`) for files to skip entirely
    pub ignore: Vec<String>,
    /// Named collections, in declaration order
    pub collections: Vec<CollectionConfig>,
    pub markdown: MarkdownConfig,
    pub permalinks: PermalinkConfig,
    pub templates: TemplateConfig,
    pub stylesheets: StylesheetConfig,
    pub layouts: LayoutConfig,
}

fn default_source() -> PathBuf {
    PathBuf::from("src/site")
}

fn default_destination() -> PathBuf {
    PathBuf::from("build")
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            metadata: serde_json::Map::new(),
            source: default_source(),
            destination: default_destination(),
            clean: true,
            frontmatter: true,
            ignore: Vec::new(),
            collections: Vec::new(),
            markdown: MarkdownConfig::default(),
            permalinks: PermalinkConfig::default(),
            templates: TemplateConfig::default(),
            stylesheets: StylesheetConfig::default(),
            layouts: LayoutConfig::default(),
        }
    }
}

impl SiteConfig {
    /// The source directory, resolved against `base_path`.
    pub fn source_dir(&self, base_path: &Path) -> PathBuf {
        resolve(base_path, &self.source)
    }

    /// The destination directory, resolved against `base_path`.
    pub fn destination_dir(&self, base_path: &Path) -> PathBuf {
        resolve(base_path, &self.destination)
    }

    /// The layouts directory, resolved against `base_path`.
    pub fn layouts_dir(&self, base_path: &Path) -> PathBuf {
        resolve(base_path, &self.layouts.directory)
    }
}

fn resolve(base_path: &Path, path: &Path) -> PathBuf {
    if path.is_relative() {
        base_path.join(path)
    } else {
        path.to_path_buf()
    }
}

// =============================================================================
// Collections
// =============================================================================

/// A named group of files selected by a glob pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    /// Glob matched against the source-relative path (e.g. `*.md`, `blog/**/*.md`)
    pub pattern: String,
    /// Metadata key to sort by; files lacking it keep traversal order
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    /// Sort descending (newest first for dates)
    #[serde(default = "default_reverse")]
    pub reverse: bool,
}

fn default_sort_by() -> String {
    "date".to_string()
}

fn default_reverse() -> bool {
    true
}

impl CollectionConfig {
    pub fn new(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            sort_by: default_sort_by(),
            reverse: default_reverse(),
        }
    }
}

// =============================================================================
// Markdown configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Extensions to enable for markdown processing
    #[serde(default = "default_markdown_extensions")]
    pub extensions: Vec<String>,
}

fn default_markdown_extensions() -> Vec<String> {
    vec![
        "definition_lists".to_string(),
        "footnotes".to_string(),
        "gfm".to_string(),
        "heading_attributes".to_string(),
        "strikethrough".to_string(),
        "tables".to_string(),
        "tasklists".to_string(),
    ]
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            extensions: default_markdown_extensions(),
        }
    }
}

// =============================================================================
// Permalinks
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermalinkConfig {
    /// Rewrite `name.html` to `name/index.html`
    #[serde(default = "default_permalinks_enabled")]
    pub enabled: bool,
}

fn default_permalinks_enabled() -> bool {
    true
}

impl Default for PermalinkConfig {
    fn default() -> Self {
        Self {
            enabled: default_permalinks_enabled(),
        }
    }
}

// =============================================================================
// Templates and stylesheets
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// File extensions rendered as Tera templates (without the dot)
    #[serde(default = "default_template_extensions")]
    pub extensions: Vec<String>,
}

fn default_template_extensions() -> Vec<String> {
    vec!["tera".to_string()]
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            extensions: default_template_extensions(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StylesheetConfig {
    /// Minify compiled CSS
    #[serde(default)]
    pub minify: bool,
}

// =============================================================================
// Layouts
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Directory containing layout templates
    #[serde(default = "default_layouts_directory")]
    pub directory: PathBuf,
    /// Layout applied to files that don't name one
    #[serde(default)]
    pub default: Option<String>,
    /// Which files receive a layout
    #[serde(default = "default_layout_pattern")]
    pub pattern: String,
}

fn default_layouts_directory() -> PathBuf {
    PathBuf::from("src/layouts")
}

fn default_layout_pattern() -> String {
    "**/*.html".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            directory: default_layouts_directory(),
            default: None,
            pattern: default_layout_pattern(),
        }
    }
}
