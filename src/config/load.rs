//! Configuration loading from files and the environment.

use std::path::Path;

use super::{ConfigError, SiteConfig};

/// Config file used when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "kiln.yaml";

/// Prefix for environment overrides, e.g. `KILN_DESTINATION=public`.
const ENV_PREFIX: &str = "KILN";

impl SiteConfig {
    /// Load the config from the command line argument, defaulting to `kiln.yaml`
    pub fn load_from_arg(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        Self::load_from_file(&config_file)
    }

    /// Load the config from a file path.
    ///
    /// A missing file is not an error: every field has a default, and
    /// `KILN_*` environment variables are layered on top either way.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        if !path.exists() {
            log::debug!("no config file at {path_str}, using defaults");
        }

        let config = config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<SiteConfig>()?;

        config.validate()?;
        Ok(config)
    }
}
