use crate::{
    CleanArgs,
    build::{base_path_from_config, pipeline::clean_output_dir},
    config::SiteConfig,
};

use super::resolve_config_path;

pub fn run(args: &CleanArgs) -> Result<(), anyhow::Error> {
    let config_path = resolve_config_path(args.config_file.as_deref())?;
    let config = SiteConfig::load_from_arg(Some(config_path.as_path()))?;

    // Get the base path for resolving relative paths
    let base_path = base_path_from_config(&config_path);

    // Delete the generated site folder
    let site_path = config.destination_dir(&base_path);
    if !site_path.exists() {
        log::info!("Nothing to clean at {}", site_path.display());
        return Ok(());
    }

    let site_path = site_path.canonicalize()?;
    if args.dry_run {
        log::info!("Would delete {}", site_path.display());
        return Ok(());
    }

    clean_output_dir(&site_path, &config.source_dir(&base_path))?;
    std::fs::remove_dir(&site_path)?;
    log::info!("Deleted {}", site_path.display());

    Ok(())
}
