//! Markdown rendering with heading anchors.

use std::collections::HashSet;

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd, html};
use tera::escape_html;

use crate::config::MarkdownConfig;

#[derive(thiserror::Error, Debug)]
pub enum MarkdownError {
    #[error("invalid markdown extension: {0}")]
    InvalidExtension(String),
}

/// Build the pulldown-cmark options for the configured extensions.
pub fn parser_options(markdown_config: &MarkdownConfig) -> Result<Options, MarkdownError> {
    let mut options = Options::empty();
    for extension in &markdown_config.extensions {
        match extension.as_str() {
            "definition_lists" => options.insert(Options::ENABLE_DEFINITION_LIST),
            "footnotes" => options.insert(Options::ENABLE_FOOTNOTES),
            "gfm" => options.insert(Options::ENABLE_GFM),
            "heading_attributes" => options.insert(Options::ENABLE_HEADING_ATTRIBUTES),
            "strikethrough" => options.insert(Options::ENABLE_STRIKETHROUGH),
            "tables" => options.insert(Options::ENABLE_TABLES),
            "tasklists" => options.insert(Options::ENABLE_TASKLISTS),
            other => return Err(MarkdownError::InvalidExtension(other.to_string())),
        }
    }
    Ok(options)
}

/// Render markdown to an HTML fragment.
///
/// Headings without an explicit `{#id}` get a unique slug id so pages can
/// link to sections.
pub fn render_markdown(markdown: &str, options: Options) -> String {
    let mut ids = HeadingIds::default();
    let mut pending: Option<PendingHeading> = None;
    let mut events: Vec<Event> = Vec::new();

    for event in Parser::new_ext(markdown, options) {
        match event {
            Event::Start(Tag::Heading {
                level,
                id: None,
                classes,
                attrs,
            }) => {
                pending = Some(PendingHeading {
                    level,
                    classes: classes.iter().map(|c| c.to_string()).collect(),
                    attrs: attrs
                        .iter()
                        .map(|(k, v)| (k.to_string(), v.as_ref().map(|v| v.to_string())))
                        .collect(),
                    html: String::new(),
                    text: String::new(),
                });
            }
            Event::Start(Tag::Heading { id: Some(ref id), .. }) => {
                ids.reserve(id);
                events.push(event);
            }
            Event::End(TagEnd::Heading(_)) if pending.is_some() => {
                if let Some(heading) = pending.take() {
                    let id = ids.claim(&slugify(&heading.text));
                    events.push(Event::Html(heading.into_html(&id).into()));
                }
            }
            // Inline content inside a heading is rendered on its own so
            // emphasis and code survive the rewrite.
            other => match pending.as_mut() {
                Some(heading) => heading.push(other),
                None => events.push(other),
            },
        }
    }

    let mut html_output = String::new();
    html::push_html(&mut html_output, events.into_iter());
    html_output
}

/// A heading being collected until its end tag.
struct PendingHeading {
    level: HeadingLevel,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    html: String,
    text: String,
}

impl PendingHeading {
    fn push(&mut self, event: Event) {
        if let Event::Text(text) | Event::Code(text) = &event {
            self.text.push_str(text);
        }
        html::push_html(&mut self.html, std::iter::once(event));
    }

    fn into_html(self, id: &str) -> String {
        let level = self.level as usize;
        let mut open = format!("<h{level} id=\"{}\"", escape_html(id));
        if !self.classes.is_empty() {
            open.push_str(&format!(" class=\"{}\"", escape_html(&self.classes.join(" "))));
        }
        for (key, value) in &self.attrs {
            let key = escape_html(key);
            match value {
                Some(value) => open.push_str(&format!(" {key}=\"{}\"", escape_html(value))),
                None => open.push_str(&format!(" {key}")),
            }
        }
        format!("{open}>{}</h{level}>\n", self.html)
    }
}

/// Heading ids already used on a page.
#[derive(Default)]
struct HeadingIds {
    used: HashSet<String>,
}

impl HeadingIds {
    fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    /// The first free id of `base`, `base-1`, `base-2`, ...
    fn claim(&mut self, base: &str) -> String {
        let mut id = base.to_string();
        let mut suffix = 1;
        while self.used.contains(&id) {
            id = format!("{base}-{suffix}");
            suffix += 1;
        }
        self.used.insert(id.clone());
        id
    }
}

/// Convert a string to a slug suitable for use as an HTML id.
fn slugify(s: &str) -> String {
    let slug = s
        .to_lowercase()
        .replace(' ', "-")
        .replace(|c: char| !c.is_alphanumeric() && c != '-', "");
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> String {
        let options = parser_options(&MarkdownConfig::default()).unwrap();
        render_markdown(markdown, options)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("???"), "section");
    }

    #[test]
    fn test_render_basic_markdown() {
        let html = render("# Hello\n\nWorld");
        assert!(html.contains("<h1 id=\"hello\">Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let html = render("## Setup\n\n## Setup\n");
        assert!(html.contains("id=\"setup\""));
        assert!(html.contains("id=\"setup-1\""));
    }

    #[test]
    fn test_heading_keeps_inline_markup() {
        let html = render("## Using `kiln` *fast*\n");
        assert!(html.contains("<code>kiln</code>"));
        assert!(html.contains("<em>fast</em>"));
        assert!(html.contains("id=\"using-kiln-fast\""));
    }

    #[test]
    fn test_explicit_heading_id() {
        let html = render("# Intro {#start}\n");
        assert!(html.contains("id=\"start\""));
    }

    #[test]
    fn test_heading_attributes_are_escaped() {
        let html = render("# Title {.a\"b data-x=1<2}\n");
        assert!(html.contains("id=\"title\""));
        assert!(!html.contains("a\"b"));
        assert!(html.contains("a&quot;b"));
        assert!(html.contains("1&lt;2"));
    }

    #[test]
    fn test_tables_enabled_by_default() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_invalid_extension() {
        let config = MarkdownConfig {
            extensions: vec!["not_a_real_extension".to_string()],
        };
        assert!(parser_options(&config).is_err());
    }
}
