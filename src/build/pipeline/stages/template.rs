//! Template rendering stage.
//!
//! Renders Tera templates from the source tree, such as an index page that
//! lists a collection.

use crate::build::paths::{has_extension, key_to_url, template_output_key};
use crate::build::pipeline::{BuildContext, PipelineContext, PipelineError, Stage};
use crate::build::render::PageContext;

/// Stage that renders source templates.
///
/// Each template sees:
/// - `site`: global metadata
/// - `collections`: every collection as a list of pages (with `contents`)
/// - `page`: the file's own metadata plus `path`, `url` and `title`
/// - `contents`: the file's raw body
///
/// The template extension is dropped from the key (`index.html.tera`
/// becomes `index.html`).
pub struct TemplateStage {
    extensions: Vec<String>,
}

impl TemplateStage {
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions.to_vec(),
        }
    }

    fn is_template(&self, key: &str) -> bool {
        let exts: Vec<&str> = self.extensions.iter().map(String::as_str).collect();
        has_extension(key, &exts)
    }
}

impl Stage for TemplateStage {
    fn name(&self) -> &'static str {
        "templates"
    }

    fn process(
        &self,
        build: &mut BuildContext,
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        let templates: Vec<String> = build
            .keys()
            .into_iter()
            .filter(|key| self.is_template(key))
            .collect();
        if templates.is_empty() {
            return Ok(());
        }

        // Templates don't change collection members, so one view serves all
        let collections = build.collection_views();

        for key in templates {
            let output_key = template_output_key(&key);

            let Some(record) = build.get(&key) else {
                continue;
            };
            let source = record
                .text()
                .map_err(|_| PipelineError::NotText { path: key.clone() })?;

            let mut page = build.page_view(&key, false);
            // Templates describe the page they produce, not themselves
            page.insert("path".into(), output_key.clone().into());
            page.insert("url".into(), key_to_url(&output_key).into());

            let context = PageContext {
                site: ctx.site,
                collections: &collections,
                page,
                contents: Some(source.to_string()),
            };
            let html = ctx
                .renderer
                .render_template(&key, source, &context)
                .map_err(|source| PipelineError::Render {
                    path: key.clone(),
                    source,
                })?;

            if let Some(record) = build.get_mut(&key) {
                record.set_text(html);
            }
            build.rename(&key, &output_key)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::Metadata;
    use crate::build::pipeline::stages::test_support::{build_context, run_stage};
    use std::collections::BTreeMap;

    fn stage() -> TemplateStage {
        TemplateStage::new(&["tera".to_string()])
    }

    fn site() -> Metadata {
        let mut site = Metadata::new();
        site.insert("sitename".to_string(), "My Site".into());
        site
    }

    #[test]
    fn test_renders_site_and_page() {
        let dir = tempfile::tempdir().unwrap();
        let mut build = build_context(&[(
            "index.html.tera",
            "{{ site.sitename }} at {{ page.url }}",
        )]);
        run_stage(&stage(), &mut build, dir.path(), &site()).unwrap();

        assert!(build.get("index.html.tera").is_none());
        assert_eq!(build.get("index.html").unwrap().text().unwrap(), "My Site at /");
    }

    #[test]
    fn test_bare_template_becomes_html() {
        let dir = tempfile::tempdir().unwrap();
        let mut build = build_context(&[("about.tera", "about")]);
        run_stage(&stage(), &mut build, dir.path(), &site()).unwrap();
        assert!(build.get("about.html").is_some());
    }

    #[test]
    fn test_lists_collection() {
        let dir = tempfile::tempdir().unwrap();
        let mut build = build_context(&[
            (
                "index.html.tera",
                "{% for post in collections.posts %}[{{ post.title }} {{ post.url }}]{% endfor %}",
            ),
            ("post1/index.html", "<p>one</p>"),
            ("post2/index.html", "<p>two</p>"),
        ]);
        build
            .get_mut("post2/index.html")
            .unwrap()
            .metadata
            .insert("title".to_string(), "Second".into());
        build.set_collections(BTreeMap::from([(
            "posts".to_string(),
            vec!["post2/index.html".to_string(), "post1/index.html".to_string()],
        )]));

        run_stage(&stage(), &mut build, dir.path(), &site()).unwrap();
        assert_eq!(
            build.get("index.html").unwrap().text().unwrap(),
            "[Second /post2/][Post1 /post1/]"
        );
    }

    #[test]
    fn test_error_carries_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut build = build_context(&[("broken.html.tera", "{% if %}")]);
        let err = run_stage(&stage(), &mut build, dir.path(), &site()).unwrap_err();
        assert_eq!(err.path().as_deref(), Some("broken.html.tera"));
        // Nothing renamed on failure
        assert!(build.get("broken.html.tera").is_some());
    }

    #[test]
    fn test_non_templates_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut build = build_context(&[("raw.html", "{{ not rendered }}")]);
        run_stage(&stage(), &mut build, dir.path(), &site()).unwrap();
        assert_eq!(
            build.get("raw.html").unwrap().text().unwrap(),
            "{{ not rendered }}"
        );
    }
}
