//! Permalinks stage.
//!
//! Moves `name.html` to `name/index.html` so pages are served at `/name/`.

use serde_json::Value;

use crate::build::paths::{has_extension, is_contained, permalink_key};
use crate::build::pipeline::{BuildContext, PipelineContext, PipelineError, Stage};

/// Stage that rewrites HTML keys into directory-style permalinks.
///
/// A file opts out with `permalink: false`. A string `permalink` names the
/// directory the page moves to instead (`permalink: blog/first` puts the
/// page at `blog/first/index.html`).
pub struct PermalinkStage;

impl Stage for PermalinkStage {
    fn name(&self) -> &'static str {
        "permalinks"
    }

    fn process(
        &self,
        build: &mut BuildContext,
        _ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for key in build.keys() {
            if !has_extension(&key, &["html"]) {
                continue;
            }
            let Some(record) = build.get(&key) else {
                continue;
            };

            let target = match record.metadata.get("permalink") {
                Some(Value::Bool(false)) => None,
                Some(Value::String(custom)) => Some(custom_permalink(&key, custom)?),
                _ => permalink_key(&key),
            };

            if let Some(target) = target {
                log::debug!("permalink {key} -> {target}");
                build.rename(&key, &target)?;
            }
        }

        Ok(())
    }
}

/// The key for a custom permalink directory.
///
/// Only plain directory names are allowed, so the page stays inside the
/// output directory.
fn custom_permalink(key: &str, permalink: &str) -> Result<String, PipelineError> {
    if !is_contained(permalink) {
        return Err(PipelineError::InvalidPermalink {
            path: key.to_string(),
            permalink: permalink.to_string(),
        });
    }

    let dir = permalink
        .split('/')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("/");
    if dir.is_empty() {
        Ok("index.html".to_string())
    } else {
        Ok(format!("{dir}/index.html"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::Metadata;
    use crate::build::pipeline::stages::test_support::{build_context, run_stage};

    fn run(build: &mut BuildContext) -> Result<(), PipelineError> {
        let dir = tempfile::tempdir().unwrap();
        run_stage(&PermalinkStage, build, dir.path(), &Metadata::new())
    }

    #[test]
    fn test_rewrites_html() {
        let mut build = build_context(&[
            ("index.html", ""),
            ("post1.html", ""),
            ("blog/hello.html", ""),
            ("blog/index.html", ""),
            ("css/site.css", ""),
        ]);
        run(&mut build).unwrap();

        let keys = build.keys();
        assert_eq!(
            keys,
            vec![
                "blog/hello/index.html",
                "blog/index.html",
                "css/site.css",
                "index.html",
                "post1/index.html",
            ]
        );
    }

    #[test]
    fn test_opt_out_and_custom() {
        let mut build = build_context(&[("404.html", ""), ("first.html", "")]);
        build
            .get_mut("404.html")
            .unwrap()
            .metadata
            .insert("permalink".to_string(), Value::Bool(false));
        build
            .get_mut("first.html")
            .unwrap()
            .metadata
            .insert("permalink".to_string(), Value::from("/blog/first/"));
        run(&mut build).unwrap();

        assert!(build.get("404.html").is_some());
        assert!(build.get("blog/first/index.html").is_some());
    }

    #[test]
    fn test_custom_permalink_cannot_leave_output() {
        for permalink in ["../outside", "blog/../../x", "./here"] {
            let mut build = build_context(&[("evil.html", "")]);
            build
                .get_mut("evil.html")
                .unwrap()
                .metadata
                .insert("permalink".to_string(), Value::from(permalink));
            let err = run(&mut build).unwrap_err();
            assert!(matches!(err, PipelineError::InvalidPermalink { .. }));
            assert_eq!(err.path().as_deref(), Some("evil.html"));
            assert_eq!(build.keys(), vec!["evil.html"]);
        }
    }

    #[test]
    fn test_collision_is_error() {
        let mut build = build_context(&[("post1.html", ""), ("post1/index.html", "")]);
        let err = run(&mut build).unwrap_err();
        assert!(matches!(err, PipelineError::DuplicatePath { .. }));
    }
}
