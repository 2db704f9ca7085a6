use crate::{
    BuildArgs,
    build::{Builder, base_path_from_config},
    config::SiteConfig,
};

use super::resolve_config_path;

pub fn run(args: &BuildArgs) -> Result<(), anyhow::Error> {
    let config_path = resolve_config_path(args.config_file.as_deref())?;
    let config = SiteConfig::load_from_arg(Some(config_path.as_path()))?;

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);

    let builder = Builder::new(config, base_path);
    let result = builder.build()?;

    log::info!(
        "Built site to {} ({} files, {} collections)",
        result.output_dir.display(),
        result.files,
        result.collections.len()
    );

    Ok(())
}
