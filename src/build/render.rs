use std::path::{Path, PathBuf};

use serde::Serialize;
use tera::{Context, Tera};

use crate::build::document::Metadata;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {}", describe(.0))]
    Template(#[from] tera::Error),

    #[error("layout '{name}' not found in {}", .dir.display())]
    LayoutNotFound { name: String, dir: PathBuf },
}

/// Tera's top-level errors are terse ("Failed to render 'x'"); the useful
/// part is further down the source chain.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

/// Prefix for page templates added on the fly, so they never shadow a layout.
const INLINE_TEMPLATE_PREFIX: &str = "__page__/";

/// The template renderer, wrapping Tera.
///
/// Layouts are loaded once from the layouts directory. Page templates from
/// the source tree are added one at a time so they can `extends` or
/// `include` those layouts.
pub struct Renderer {
    tera: Tera,
    layouts_dir: PathBuf,
}

impl Renderer {
    /// Create a new renderer loading every file in the layouts directory.
    ///
    /// A missing directory yields a renderer with no layouts; asking for a
    /// layout is what fails.
    pub fn new(layouts_dir: &Path) -> Result<Self, RenderError> {
        let tera = if layouts_dir.is_dir() {
            let glob = layouts_dir.join("**/*");
            let glob_str = glob.to_string_lossy();
            Tera::new(&glob_str)?
        } else {
            log::debug!("no layouts directory at {}", layouts_dir.display());
            Tera::default()
        };

        Ok(Self {
            tera,
            layouts_dir: layouts_dir.to_path_buf(),
        })
    }

    /// Returns true if a layout with this name was loaded.
    pub fn has_layout(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a page through a layout.
    pub fn render_layout(&self, name: &str, context: &PageContext) -> Result<String, RenderError> {
        if !self.has_layout(name) {
            return Err(RenderError::LayoutNotFound {
                name: name.to_string(),
                dir: self.layouts_dir.clone(),
            });
        }
        Ok(self.tera.render(name, &context.to_tera())?)
    }

    /// Render a template from the source tree.
    ///
    /// The source is added as a temporary template so it has access to the
    /// layouts (for `extends`, `include` and macros).
    pub fn render_template(
        &mut self,
        name: &str,
        source: &str,
        context: &PageContext,
    ) -> Result<String, RenderError> {
        let template_name = format!("{INLINE_TEMPLATE_PREFIX}{name}");
        self.tera.add_raw_template(&template_name, source)?;

        let result = self.tera.render(&template_name, &context.to_tera());

        // Clean up the temporary template
        self.tera.templates.remove(&template_name);

        Ok(result?)
    }
}

/// Context passed to page templates and layouts.
#[derive(Debug, Serialize)]
pub struct PageContext<'a> {
    /// Global metadata, as `site.*`
    pub site: &'a Metadata,
    /// Collections, as `collections.<name>`
    pub collections: &'a Metadata,
    /// The current file's metadata plus `path`, `url` and `title`
    pub page: Metadata,
    /// The rendered body, for layouts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contents: Option<String>,
}

impl PageContext<'_> {
    fn to_tera(&self) -> Context {
        let mut tera_context = Context::new();
        tera_context.insert("site", self.site);
        tera_context.insert("collections", self.collections);
        tera_context.insert("page", &self.page);
        if let Some(contents) = &self.contents {
            tera_context.insert("contents", contents);
        }
        tera_context
    }
}
