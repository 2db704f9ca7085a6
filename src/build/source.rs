use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::document::{FileRecord, parse_front_matter};
use super::paths::{key_matches, path_to_key};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("source path does not exist: {0}")]
    PathNotFound(PathBuf),

    #[error("source path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read directory entry in {path}: {source}")]
    ReadEntry {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid ignore pattern: {0}")]
    Pattern(#[from] glob::PatternError),
}

// =============================================================================
// Source reader
// =============================================================================

/// Reads a source directory into a map of context keys to file records.
#[derive(Debug)]
pub struct SourceReader {
    /// The source directory
    root: PathBuf,
    /// Patterns for files and directories to skip
    ignore: Vec<glob::Pattern>,
    /// Whether to split YAML front matter off text files
    frontmatter: bool,
}

impl SourceReader {
    /// Create a reader, validating the source directory and ignore patterns.
    pub fn new(root: &Path, ignore: &[String], frontmatter: bool) -> Result<Self, SourceError> {
        if !root.exists() {
            return Err(SourceError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(SourceError::NotADirectory(root.to_path_buf()));
        }

        let ignore = ignore
            .iter()
            .map(|p| glob::Pattern::new(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            root: root.to_path_buf(),
            ignore,
            frontmatter,
        })
    }

    /// The source directory this reader walks.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read every file under the source directory.
    ///
    /// The returned map is ordered by key in plain string order, which is
    /// the order later stages see files in.
    pub fn read(&self) -> Result<BTreeMap<String, FileRecord>, SourceError> {
        let mut files = BTreeMap::new();
        self.walk_directory(&self.root, Path::new(""), &mut files)?;
        Ok(files)
    }

    /// Recursively walk a directory and collect file records.
    fn walk_directory(
        &self,
        dir: &Path,
        relative_path: &Path,
        files: &mut BTreeMap<String, FileRecord>,
    ) -> Result<(), SourceError> {
        let entries = std::fs::read_dir(dir).map_err(|e| SourceError::ReadDir {
            path: dir.to_path_buf(),
            source: e,
        })?;

        let mut entries = entries
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SourceError::ReadEntry {
                path: dir.to_path_buf(),
                source: e,
            })?;
        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let file_name = entry.file_name();

            // Skip hidden files and directories
            if file_name.to_string_lossy().starts_with('.') {
                continue;
            }

            let item_relative_path = relative_path.join(&file_name);
            let key = path_to_key(&item_relative_path);

            if self.ignore.iter().any(|pattern| key_matches(pattern, &key)) {
                log::debug!("ignoring {key}");
                continue;
            }

            if path.is_dir() {
                self.walk_directory(&path, &item_relative_path, files)?;
            } else if path.is_file() {
                let record = self.load_file(&path, &key)?;
                files.insert(key, record);
            }
        }

        Ok(())
    }

    /// Read a file, splitting off front matter when present.
    fn load_file(&self, path: &Path, key: &str) -> Result<FileRecord, SourceError> {
        let contents = std::fs::read(path).map_err(|e| SourceError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        if !self.frontmatter || !contents.starts_with(b"---") {
            return Ok(FileRecord::new(contents));
        }

        let Ok(text) = std::str::from_utf8(&contents) else {
            return Ok(FileRecord::new(contents));
        };

        match parse_front_matter(text) {
            Ok(Some(parsed)) => Ok(FileRecord::with_metadata(
                parsed.content,
                parsed.front_matter,
            )),
            Ok(None) => Ok(FileRecord::new(contents)),
            Err(e) => {
                // Keep the file as-is rather than failing the build
                log::warn!("failed to parse front matter in {key}: {e}");
                Ok(FileRecord::new(contents))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_missing_source_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = SourceReader::new(&dir.path().join("nope"), &[], true);
        assert!(matches!(result, Err(SourceError::PathNotFound(_))));
    }

    #[test]
    fn test_reads_tree_in_sorted_order() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b.txt", b"b");
        write(dir.path(), "a/z.txt", b"z");
        write(dir.path(), "a/c.txt", b"c");
        write(dir.path(), ".hidden", b"secret");
        write(dir.path(), ".git/config", b"secret");

        let reader = SourceReader::new(dir.path(), &[], true).unwrap();
        let files = reader.read().unwrap();
        let keys: Vec<_> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a/c.txt", "a/z.txt", "b.txt"]);
    }

    #[test]
    fn test_keys_order_by_full_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a/x.txt", b"x");
        write(dir.path(), "a-b.txt", b"ab");

        let reader = SourceReader::new(dir.path(), &[], true).unwrap();
        let files = reader.read().unwrap();
        let keys: Vec<_> = files.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a-b.txt", "a/x.txt"]);
    }

    #[test]
    fn test_ignore_patterns() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "drafts/wip.md", b"wip");
        write(dir.path(), "notes.bak", b"old");
        write(dir.path(), "post.md", b"post");

        let ignore = vec!["drafts".to_string(), "*.bak".to_string()];
        let reader = SourceReader::new(dir.path(), &ignore, true).unwrap();
        let files = reader.read().unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["post.md"]);
    }

    #[test]
    fn test_front_matter_is_split_off() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "post.md", b"---\ntitle: Hi\n---\n# Body\n");

        let files = SourceReader::new(dir.path(), &[], true).unwrap().read().unwrap();
        let post = &files["post.md"];
        assert_eq!(post.meta_str("title"), Some("Hi"));
        assert_eq!(post.text().unwrap(), "# Body\n");
    }

    #[test]
    fn test_front_matter_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let raw = b"---\ntitle: Hi\n---\n# Body\n";
        write(dir.path(), "post.md", raw);

        let files = SourceReader::new(dir.path(), &[], false).unwrap().read().unwrap();
        assert_eq!(files["post.md"].contents, raw);
        assert!(files["post.md"].metadata.is_empty());
    }

    #[test]
    fn test_invalid_front_matter_keeps_file() {
        let dir = tempfile::tempdir().unwrap();
        let raw = b"---\ntitle: [unclosed\n---\nbody";
        write(dir.path(), "post.md", raw);

        let files = SourceReader::new(dir.path(), &[], true).unwrap().read().unwrap();
        assert_eq!(files["post.md"].contents, raw);
    }

    #[test]
    fn test_binary_files_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let raw = [b'-', b'-', b'-', 0xff, 0xfe, 0x00];
        write(dir.path(), "blob.bin", &raw);

        let files = SourceReader::new(dir.path(), &[], true).unwrap().read().unwrap();
        assert_eq!(files["blob.bin"].contents, raw);
    }
}
