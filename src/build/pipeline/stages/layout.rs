//! Layout stage.
//!
//! Wraps rendered HTML pages in a layout template: site header, footer and
//! whatever else every page shares.

use serde_json::Value;

use crate::build::paths::key_matches;
use crate::build::pipeline::{BuildContext, PipelineContext, PipelineError, Stage};
use crate::build::render::PageContext;
use crate::config::LayoutConfig;

/// Stage that applies layouts.
///
/// The layout comes from the file's `layout` metadata, falling back to the
/// configured default. `layout: false` leaves the file as it is.
///
/// Layouts see the same `site`, `collections` and `page` values as source
/// templates, with the page body in `contents`.
pub struct LayoutStage {
    pattern: glob::Pattern,
    default: Option<String>,
}

impl LayoutStage {
    pub fn new(layout_config: &LayoutConfig) -> Result<Self, PipelineError> {
        Ok(Self {
            pattern: glob::Pattern::new(&layout_config.pattern)?,
            default: layout_config.default.clone(),
        })
    }

    /// The layout a file should be wrapped in, if any.
    fn layout_for(&self, metadata: &serde_json::Map<String, Value>) -> Option<String> {
        match metadata.get("layout") {
            Some(Value::String(name)) => Some(name.clone()),
            Some(Value::Bool(false)) | Some(Value::Null) => None,
            _ => self.default.clone(),
        }
    }
}

impl Stage for LayoutStage {
    fn name(&self) -> &'static str {
        "layouts"
    }

    fn process(
        &self,
        build: &mut BuildContext,
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        let collections = build.collection_views();

        for key in build.keys() {
            if !key_matches(&self.pattern, &key) {
                continue;
            }
            let Some(record) = build.get(&key) else {
                continue;
            };
            let Some(layout) = self.layout_for(&record.metadata) else {
                continue;
            };

            let contents = record
                .text()
                .map_err(|_| PipelineError::NotText { path: key.clone() })?
                .to_string();
            let context = PageContext {
                site: ctx.site,
                collections: &collections,
                page: build.page_view(&key, false),
                contents: Some(contents),
            };

            log::debug!("applying layout {layout} to {key}");
            let html = ctx
                .renderer
                .render_layout(&layout, &context)
                .map_err(|source| PipelineError::Render {
                    path: key.clone(),
                    source,
                })?;

            if let Some(record) = build.get_mut(&key) {
                record.set_text(html);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::Metadata;
    use crate::build::pipeline::stages::test_support::{build_context, run_stage};
    use crate::build::render::RenderError;

    fn layouts_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("page.html"),
            "<title>{{ page.title }} - {{ site.sitename }}</title><main>{{ contents | safe }}</main>",
        )
        .unwrap();
        std::fs::write(dir.path().join("bare.html"), "[{{ contents | safe }}]").unwrap();
        dir
    }

    fn config(default: Option<&str>) -> LayoutConfig {
        LayoutConfig {
            default: default.map(str::to_string),
            ..LayoutConfig::default()
        }
    }

    fn site() -> Metadata {
        let mut site = Metadata::new();
        site.insert("sitename".to_string(), "Blog".into());
        site
    }

    #[test]
    fn test_applies_default_layout() {
        let dir = layouts_dir();
        let stage = LayoutStage::new(&config(Some("page.html"))).unwrap();
        let mut build = build_context(&[
            ("post1/index.html", "<p>hi</p>"),
            ("css/site.css", "a{}"),
        ]);
        run_stage(&stage, &mut build, dir.path(), &site()).unwrap();

        assert_eq!(
            build.get("post1/index.html").unwrap().text().unwrap(),
            "<title>Post1 - Blog</title><main><p>hi</p></main>"
        );
        assert_eq!(build.get("css/site.css").unwrap().contents, b"a{}");
    }

    #[test]
    fn test_front_matter_layout_and_opt_out() {
        let dir = layouts_dir();
        let stage = LayoutStage::new(&config(Some("page.html"))).unwrap();
        let mut build = build_context(&[("a.html", "A"), ("b.html", "B")]);
        build
            .get_mut("a.html")
            .unwrap()
            .metadata
            .insert("layout".to_string(), "bare.html".into());
        build
            .get_mut("b.html")
            .unwrap()
            .metadata
            .insert("layout".to_string(), Value::Bool(false));
        run_stage(&stage, &mut build, dir.path(), &site()).unwrap();

        assert_eq!(build.get("a.html").unwrap().text().unwrap(), "[A]");
        assert_eq!(build.get("b.html").unwrap().text().unwrap(), "B");
    }

    #[test]
    fn test_no_default_means_no_layout() {
        let dir = layouts_dir();
        let stage = LayoutStage::new(&config(None)).unwrap();
        let mut build = build_context(&[("a.html", "A")]);
        run_stage(&stage, &mut build, dir.path(), &site()).unwrap();
        assert_eq!(build.get("a.html").unwrap().text().unwrap(), "A");
    }

    #[test]
    fn test_missing_layout() {
        let dir = layouts_dir();
        let stage = LayoutStage::new(&config(Some("nope.html"))).unwrap();
        let mut build = build_context(&[("a.html", "A")]);
        let err = run_stage(&stage, &mut build, dir.path(), &site()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Render {
                source: RenderError::LayoutNotFound { .. },
                ..
            }
        ));
        assert_eq!(err.path().as_deref(), Some("a.html"));
    }
}
