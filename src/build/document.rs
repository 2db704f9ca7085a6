use serde_json::Value;

use crate::build::paths::page_slug;
use crate::util::title_case;

/// Metadata attached to a file: front matter plus keys added by stages.
pub type Metadata = serde_json::Map<String, Value>;

// =============================================================================
// File records
// =============================================================================

/// A single file flowing through the build pipeline.
///
/// Contents are bytes so binary assets pass through untouched; stages that
/// work on text (markdown, templates, stylesheets) go through [`FileRecord::text`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileRecord {
    /// Raw or transformed file contents
    pub contents: Vec<u8>,
    /// Front matter and stage-provided metadata
    pub metadata: Metadata,
}

impl FileRecord {
    /// Create a record with no metadata.
    pub fn new(contents: impl Into<Vec<u8>>) -> Self {
        Self {
            contents: contents.into(),
            metadata: Metadata::new(),
        }
    }

    /// Create a record with the given metadata.
    pub fn with_metadata(contents: impl Into<Vec<u8>>, metadata: Metadata) -> Self {
        Self {
            contents: contents.into(),
            metadata,
        }
    }

    /// The contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(&self.contents)
    }

    /// The contents as text, replacing invalid sequences.
    pub fn text_lossy(&self) -> String {
        String::from_utf8_lossy(&self.contents).into_owned()
    }

    /// Replace the contents with text.
    pub fn set_text(&mut self, text: String) {
        self.contents = text.into_bytes();
    }

    /// Look up a string metadata value.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    /// Get the page title, falling back to the file name if not in front matter.
    pub fn title(&self, path: &str) -> String {
        self.meta_str("title")
            .map(str::to_string)
            .unwrap_or_else(|| title_case(page_slug(path)))
    }
}

// =============================================================================
// Front matter
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum FrontMatterError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("front matter must be a mapping of keys to values")]
    NotAMapping,
}

/// Result of splitting front matter off a file.
#[derive(Debug)]
pub struct ParsedContent {
    /// The parsed front matter (empty if the block was empty)
    pub front_matter: Metadata,
    /// The content without the front matter block
    pub content: String,
}

/// Parse front matter from the top of a text file.
///
/// Front matter is a YAML block delimited by `---` lines at the very start
/// of the file:
///
/// ```markdown
/// ---
/// title: My Post
/// date: 2024-03-01
/// ---
///
/// # Content starts here
/// ```
///
/// Returns `Ok(None)` when the file has no front matter block, so callers can
/// keep the original bytes unchanged.
pub fn parse_front_matter(content: &str) -> Result<Option<ParsedContent>, FrontMatterError> {
    let Some(after_opening) = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))
    else {
        return Ok(None);
    };

    // The closing delimiter is either the very next line or a later one
    let (yaml_content, rest) = if let Some(rest) = after_opening.strip_prefix("---") {
        ("", rest)
    } else {
        let Some(closing_pos) = after_opening.find("\n---") else {
            // No closing delimiter found, not front matter
            return Ok(None);
        };
        (&after_opening[..closing_pos], &after_opening[closing_pos + 4..])
    };

    // The delimiter must be a line of its own
    let body = if rest.is_empty() {
        ""
    } else if let Some(body) = rest.strip_prefix('\n') {
        body
    } else if let Some(body) = rest.strip_prefix("\r\n") {
        body
    } else {
        return Ok(None);
    };

    let front_matter = if yaml_content.trim().is_empty() {
        Metadata::new()
    } else {
        match serde_yaml::from_str::<Value>(yaml_content)? {
            Value::Object(map) => map,
            Value::Null => Metadata::new(),
            _ => return Err(FrontMatterError::NotAMapping),
        }
    };

    Ok(Some(ParsedContent {
        front_matter,
        content: body.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_front_matter_basic() {
        let content = r#"---
title: My Page
description: A test page
---

# Hello World
"#;
        let parsed = parse_front_matter(content).unwrap().unwrap();
        assert_eq!(parsed.front_matter["title"], "My Page");
        assert_eq!(parsed.front_matter["description"], "A test page");
        assert_eq!(parsed.content.trim(), "# Hello World");
    }

    #[test]
    fn test_parse_front_matter_with_custom_fields() {
        let content = r#"---
title: Custom Page
date: 2024-03-01
tags:
  - rust
  - static
---
Content here
"#;
        let parsed = parse_front_matter(content).unwrap().unwrap();
        assert_eq!(parsed.front_matter["date"], "2024-03-01");
        assert_eq!(parsed.front_matter["tags"][1], "static");
        assert_eq!(parsed.content, "Content here\n");
    }

    #[test]
    fn test_parse_front_matter_no_front_matter() {
        let content = "# Just Markdown\n\nNo front matter here.";
        assert!(parse_front_matter(content).unwrap().is_none());
    }

    #[test]
    fn test_parse_front_matter_unclosed() {
        let content = "---\ntitle: Oops\n\n# Body";
        assert!(parse_front_matter(content).unwrap().is_none());
    }

    #[test]
    fn test_parse_front_matter_horizontal_rule_is_not_front_matter() {
        assert!(parse_front_matter("-----\ntext\n-----\n").unwrap().is_none());
    }

    #[test]
    fn test_parse_front_matter_empty_front_matter() {
        let parsed = parse_front_matter("---\n---\n\n# Content").unwrap().unwrap();
        assert!(parsed.front_matter.is_empty());
        assert_eq!(parsed.content, "\n# Content");
    }

    #[test]
    fn test_parse_front_matter_scalar_is_error() {
        let result = parse_front_matter("---\njust a string\n---\nbody");
        assert!(matches!(result, Err(FrontMatterError::NotAMapping)));
    }

    #[test]
    fn test_title_fallback() {
        let record = FileRecord::new("body");
        assert_eq!(record.title("getting-started.md"), "Getting Started");
        assert_eq!(record.title("my-post/index.html"), "My Post");
    }

    #[test]
    fn test_title_from_front_matter() {
        let mut record = FileRecord::new("body");
        record
            .metadata
            .insert("title".to_string(), Value::from("Welcome"));
        assert_eq!(record.title("intro.md"), "Welcome");
    }
}
