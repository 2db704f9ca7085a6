//! Path and URL conversion utilities.
//!
//! Files in the build context are keyed by their source-relative path,
//! always `/`-separated. This module handles conversions between:
//! - Filesystem paths and context keys
//! - Context keys and the URL a page is served at
//! - Context keys and output file paths

use std::path::{Component, Path, PathBuf};

/// Convert a source-relative filesystem path to a context key.
///
/// # Examples
/// ```ignore
/// path_to_key("posts/hello.md") => "posts/hello.md"
/// path_to_key("posts\\hello.md") => "posts/hello.md"   // on Windows
/// ```
pub fn path_to_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// The file name part of a key.
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// The last extension of a key, without the dot.
///
/// Hidden-file style names (".htaccess") have no extension.
pub fn extension(key: &str) -> Option<&str> {
    let name = file_name(key);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&name[pos + 1..]),
    }
}

/// Returns true if the key's last extension is one of `exts` (case-insensitive).
pub fn has_extension(key: &str, exts: &[&str]) -> bool {
    extension(key).is_some_and(|ext| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

/// Replace the last extension of a key.
///
/// # Examples
/// ```ignore
/// replace_extension("posts/hello.md", "html") => "posts/hello.html"
/// replace_extension("css/site.less", "css") => "css/site.css"
/// ```
pub fn replace_extension(key: &str, new_ext: &str) -> String {
    match extension(key) {
        Some(ext) => format!("{}{}", &key[..key.len() - ext.len()], new_ext),
        None => format!("{key}.{new_ext}"),
    }
}

/// Remove the last extension of a key.
///
/// Template files name their output: `index.html.tera` becomes `index.html`.
/// A template with no inner extension (`about.tera`) becomes `about.html`.
pub fn template_output_key(key: &str) -> String {
    let stripped = match extension(key) {
        Some(ext) => &key[..key.len() - ext.len() - 1],
        None => key,
    };
    if extension(stripped).is_some() {
        stripped.to_string()
    } else {
        format!("{stripped}.html")
    }
}

/// The permalink form of an HTML key.
///
/// Returns `None` when the key is not HTML or is already an index page.
///
/// # Examples
/// ```ignore
/// permalink_key("post1.html") => Some("post1/index.html")
/// permalink_key("blog/hello.html") => Some("blog/hello/index.html")
/// permalink_key("index.html") => None
/// ```
pub fn permalink_key(key: &str) -> Option<String> {
    if !has_extension(key, &["html"]) || file_name(key) == "index.html" {
        return None;
    }
    let stem = &key[..key.len() - ".html".len()];
    Some(format!("{stem}/index.html"))
}

/// The URL a key is served at.
///
/// # Examples
/// ```ignore
/// key_to_url("index.html") => "/"
/// key_to_url("post1/index.html") => "/post1/"
/// key_to_url("css/site.css") => "/css/site.css"
/// ```
pub fn key_to_url(key: &str) -> String {
    if key == "index.html" {
        "/".to_string()
    } else if let Some(dir) = key.strip_suffix("/index.html") {
        format!("/{dir}/")
    } else {
        format!("/{key}")
    }
}

/// The name a page is known by, for title fallbacks.
///
/// Index pages take their directory's name; other files drop all extensions.
pub fn page_slug(key: &str) -> &str {
    let key = key.strip_suffix("/index.html").unwrap_or(key);
    let name = file_name(key);
    match name.find('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

/// Returns true if a `/`-separated path stays where it is rooted: every
/// segment is a plain name (no `.`, `..`, root or drive prefix).
pub fn is_contained(key: &str) -> bool {
    key.split('/').filter(|part| !part.is_empty()).all(|part| {
        let mut components = Path::new(part).components();
        matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        )
    })
}

/// Convert a context key to an output file path.
///
/// Returns `None` for keys that would land outside `output_dir`.
///
/// # Examples
/// ```ignore
/// key_to_output_path("post1/index.html", output_dir) => Some(output_dir/post1/index.html)
/// key_to_output_path("../outside/index.html", output_dir) => None
/// ```
pub fn key_to_output_path(key: &str, output_dir: &Path) -> Option<PathBuf> {
    if !is_contained(key) {
        return None;
    }
    Some(
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(output_dir.to_path_buf(), |path, part| path.join(part)),
    )
}

/// Glob options shared by collection, ignore and layout patterns.
///
/// `*` stops at `/`, so `*.md` matches top-level files only and
/// `**/*.md` matches at any depth.
pub const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Returns true if `pattern` matches the key.
pub fn key_matches(pattern: &glob::Pattern, key: &str) -> bool {
    pattern.matches_with(key, MATCH_OPTIONS)
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
