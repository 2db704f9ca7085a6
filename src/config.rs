//! Configuration loading and types for kiln.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

pub use load::DEFAULT_CONFIG_FILE;
pub use types::{CollectionConfig, LayoutConfig, MarkdownConfig, SiteConfig};

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("config path is not valid UTF-8: {0}")]
    EncodePath(std::path::PathBuf),

    #[error("{0}")]
    Validation(String),
}

impl SiteConfig {
    /// Check the parts of the config serde can't: unique collection names
    /// and well-formed glob patterns.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for collection in &self.collections {
            if collection.name.is_empty() {
                return Err(ConfigError::Validation(
                    "invalid config: collection name must not be empty".to_string(),
                ));
            }
            if !seen.insert(collection.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "invalid config: collection '{}' is declared more than once",
                    collection.name
                )));
            }
            check_pattern(&format!("collections.{}", collection.name), &collection.pattern)?;
        }

        for pattern in &self.ignore {
            check_pattern("ignore", pattern)?;
        }
        check_pattern("layouts.pattern", &self.layouts.pattern)?;

        if self.templates.extensions.iter().any(|e| e.is_empty() || e.starts_with('.')) {
            return Err(ConfigError::Validation(
                "invalid config: template extensions are written without a leading dot".to_string(),
            ));
        }

        Ok(())
    }
}

fn check_pattern(field: &str, pattern: &str) -> Result<(), ConfigError> {
    glob::Pattern::new(pattern).map(|_| ()).map_err(|e| {
        ConfigError::Validation(format!("invalid config: bad pattern '{pattern}' in {field}: {e}"))
    })
}
