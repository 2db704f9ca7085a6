//! Collections stage.
//!
//! Groups files into named, ordered lists that templates can iterate.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;

use crate::build::document::FileRecord;
use crate::build::paths::key_matches;
use crate::build::pipeline::{BuildContext, PipelineContext, PipelineError, Stage};
use crate::config::CollectionConfig;

/// Metadata key holding the collections a file belongs to.
const COLLECTION_KEY: &str = "collection";

struct Collection {
    config: CollectionConfig,
    pattern: glob::Pattern,
}

/// Stage that computes collections.
///
/// A file joins a collection when its key matches the collection's pattern
/// or its front matter names the collection under `collection`. Every member
/// gets a `collection` list naming the collections it belongs to, in
/// declaration order.
///
/// Members are sorted by the collection's `sort_by` key; members without
/// the key follow in traversal order.
pub struct CollectionsStage {
    collections: Vec<Collection>,
}

impl CollectionsStage {
    /// Compile the configured patterns up front, so a bad pattern fails
    /// before any file is touched.
    pub fn new(configs: &[CollectionConfig]) -> Result<Self, PipelineError> {
        let collections = configs
            .iter()
            .map(|config| {
                Ok(Collection {
                    pattern: glob::Pattern::new(&config.pattern)?,
                    config: config.clone(),
                })
            })
            .collect::<Result<Vec<_>, PipelineError>>()?;

        Ok(Self { collections })
    }

    /// Names of the collections this file belongs to, configured ones first.
    fn memberships(&self, key: &str, record: &FileRecord) -> Vec<String> {
        let declared = declared_collections(record);

        let mut names: Vec<String> = self
            .collections
            .iter()
            .filter(|c| key_matches(&c.pattern, key) || declared.contains(&c.config.name))
            .map(|c| c.config.name.clone())
            .collect();

        for name in declared {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    fn sort_members(&self, name: &str, members: &mut [String], build: &BuildContext) {
        let Some(collection) = self.collections.iter().find(|c| c.config.name == name) else {
            return;
        };
        let sort_by = collection.config.sort_by.as_str();
        let reverse = collection.config.reverse;

        let sort_value = |key: &str| build.get(key).and_then(|r| r.metadata.get(sort_by));

        // Stable, so equal keys and keyless files keep traversal order
        members.sort_by(|a, b| match (sort_value(a.as_str()), sort_value(b.as_str())) {
            (Some(a), Some(b)) => {
                let ordering = compare_values(a, b);
                if reverse { ordering.reverse() } else { ordering }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
    }
}

impl Stage for CollectionsStage {
    fn name(&self) -> &'static str {
        "collections"
    }

    fn process(
        &self,
        build: &mut BuildContext,
        _ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        let mut collections: BTreeMap<String, Vec<String>> = self
            .collections
            .iter()
            .map(|c| (c.config.name.clone(), Vec::new()))
            .collect();

        for key in build.keys() {
            let Some(record) = build.get_mut(&key) else {
                continue;
            };

            let names = self.memberships(&key, record);
            if names.is_empty() {
                continue;
            }

            for name in &names {
                collections.entry(name.clone()).or_default().push(key.clone());
            }
            record.metadata.insert(
                COLLECTION_KEY.to_string(),
                Value::Array(names.into_iter().map(Value::String).collect()),
            );
        }

        for (name, members) in &mut collections {
            self.sort_members(name, members, build);
            log::debug!("collection '{}': {} file(s)", name, members.len());
        }

        build.set_collections(collections);
        Ok(())
    }
}

/// Collections named in a file's `collection` metadata (a string or a list).
fn declared_collections(record: &FileRecord) -> Vec<String> {
    match record.metadata.get(COLLECTION_KEY) {
        Some(Value::String(name)) => vec![name.clone()],
        Some(Value::Array(names)) => names
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

/// Numbers compare numerically, everything else by its string form.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.as_f64(), b.as_f64()) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        _ => value_text(a).cmp(&value_text(b)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::document::Metadata;
    use crate::build::pipeline::stages::test_support::{build_context, run_stage};

    fn run(stage: &CollectionsStage, build: &mut BuildContext) {
        let dir = tempfile::tempdir().unwrap();
        run_stage(stage, build, dir.path(), &Metadata::new()).unwrap();
    }

    fn set_meta(build: &mut BuildContext, key: &str, name: &str, value: Value) {
        build
            .get_mut(key)
            .unwrap()
            .metadata
            .insert(name.to_string(), value);
    }

    fn posts_and_index() -> CollectionsStage {
        CollectionsStage::new(&[
            CollectionConfig::new("posts", "*.md"),
            CollectionConfig::new("index", "*.html.tera"),
        ])
        .unwrap()
    }

    #[test]
    fn test_invalid_pattern() {
        let err = CollectionsStage::new(&[CollectionConfig::new("bad", "[")]);
        assert!(matches!(err, Err(PipelineError::Pattern(_))));
    }

    #[test]
    fn test_membership_and_back_reference() {
        let stage = posts_and_index();
        let mut build = build_context(&[
            ("index.html.tera", ""),
            ("post1.md", ""),
            ("post2.md", ""),
            ("blog/nested.md", ""),
            ("style.less", ""),
        ]);
        run(&stage, &mut build);

        assert_eq!(build.collections()["posts"], vec!["post1.md", "post2.md"]);
        assert_eq!(build.collections()["index"], vec!["index.html.tera"]);
        assert_eq!(
            build.get("post1.md").unwrap().metadata["collection"],
            serde_json::json!(["posts"])
        );
        assert!(!build.get("style.less").unwrap().metadata.contains_key("collection"));
        assert!(!build.get("blog/nested.md").unwrap().metadata.contains_key("collection"));
    }

    #[test]
    fn test_zero_matches_is_empty_collection() {
        let stage = posts_and_index();
        let mut build = build_context(&[("about.txt", "")]);
        run(&stage, &mut build);
        assert!(build.collections()["posts"].is_empty());
    }

    #[test]
    fn test_sorted_by_date_descending() {
        let stage = posts_and_index();
        let mut build = build_context(&[("a.md", ""), ("b.md", ""), ("c.md", ""), ("d.md", "")]);
        set_meta(&mut build, "a.md", "date", Value::from("2024-01-01"));
        set_meta(&mut build, "c.md", "date", Value::from("2024-03-01"));
        run(&stage, &mut build);

        // Dated files newest first, undated ones after in traversal order
        assert_eq!(build.collections()["posts"], vec!["c.md", "a.md", "b.md", "d.md"]);
    }

    #[test]
    fn test_sort_numeric_ascending() {
        let mut config = CollectionConfig::new("chapters", "*.md");
        config.sort_by = "order".to_string();
        config.reverse = false;
        let stage = CollectionsStage::new(&[config]).unwrap();

        let mut build = build_context(&[("a.md", ""), ("b.md", ""), ("c.md", "")]);
        set_meta(&mut build, "a.md", "order", Value::from(10));
        set_meta(&mut build, "b.md", "order", Value::from(9));
        set_meta(&mut build, "c.md", "order", Value::from(1));
        run(&stage, &mut build);

        assert_eq!(build.collections()["chapters"], vec!["c.md", "b.md", "a.md"]);
    }

    #[test]
    fn test_front_matter_membership() {
        let stage = posts_and_index();
        let mut build = build_context(&[("about.html", ""), ("post1.md", "")]);
        set_meta(&mut build, "about.html", "collection", Value::from("pages"));
        set_meta(&mut build, "post1.md", "collection", serde_json::json!(["featured"]));
        run(&stage, &mut build);

        assert_eq!(build.collections()["pages"], vec!["about.html"]);
        assert_eq!(build.collections()["featured"], vec!["post1.md"]);
        assert_eq!(
            build.get("post1.md").unwrap().metadata["collection"],
            serde_json::json!(["posts", "featured"])
        );
    }

    #[test]
    fn test_idempotent() {
        let stage = CollectionsStage::new(&[
            CollectionConfig::new("posts", "*.md"),
            CollectionConfig::new("all", "*"),
        ])
        .unwrap();
        let mut build = build_context(&[("a.md", ""), ("b.md", ""), ("c.txt", "")]);
        set_meta(&mut build, "b.md", "date", Value::from("2024-05-05"));

        run(&stage, &mut build);
        let first_collections = build.collections().clone();
        let first_meta: Vec<_> = build.iter().map(|(_, r)| r.metadata.clone()).collect();

        run(&stage, &mut build);
        assert_eq!(build.collections(), &first_collections);
        let second_meta: Vec<_> = build.iter().map(|(_, r)| r.metadata.clone()).collect();
        assert_eq!(first_meta, second_meta);
        assert_eq!(
            build.get("a.md").unwrap().metadata["collection"],
            serde_json::json!(["posts", "all"])
        );
    }
}
