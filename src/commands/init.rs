use std::path::Path;

use serde_json::Value;

use crate::{
    InitArgs,
    config::{CollectionConfig, DEFAULT_CONFIG_FILE, SiteConfig},
};

const SAMPLE_LAYOUT: &str = r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <title>{{ page.title }} | {{ site.sitename }}</title>
  <meta name="description" content="{{ site.description }}">
  <link rel="stylesheet" href="/css/site.css">
</head>
<body>
  <header><a href="/">{{ site.sitename }}</a></header>
  <main>{{ contents | safe }}</main>
  <footer>Built with <a href="{{ site.generatorurl }}">{{ site.generatorname }}</a></footer>
</body>
</html>
"#;

const SAMPLE_INDEX: &str = r#"---
title: Home
---
<h1>{{ site.sitename }}</h1>
<ul>
{% for post in collections.posts %}
  <li><a href="{{ post.url }}">{{ post.title }}</a>{% if post.date %} ({{ post.date }}){% endif %}</li>
{% endfor %}
</ul>
"#;

const SAMPLE_POST: &str = r#"---
title: Hello, world
date: 2024-01-01
---
# Hello, world

This is the first post. Edit `src/site/post1.md` and run `kiln build`.
"#;

const SAMPLE_STYLESHEET: &str = r#"// Site colours
@text: #222;
@accent: #336699;

body {
  color: @text;
  font-family: sans-serif;

  a { color: @accent; }
}
"#;

pub fn run(args: &InitArgs) -> Result<(), anyhow::Error> {
    let path = if args.path.is_relative() {
        std::env::current_dir()?.join(&args.path)
    } else {
        args.path.clone()
    };

    if !path.exists() {
        if args.create {
            std::fs::create_dir_all(&path)?;
            log::info!("Created directory {path}", path = path.display());
        } else {
            return Err(anyhow::anyhow!(
                "Directory does not exist: {path}",
                path = path.display()
            ));
        }
    }

    let config_file = path.join(DEFAULT_CONFIG_FILE);
    if config_file.exists() {
        return Err(anyhow::anyhow!(
            "Config file already exists: {config_file}",
            config_file = config_file.display()
        ));
    }

    log::info!("Initializing project in {}", path.display());

    let default_config = sample_config();
    let config_text = serde_yaml::to_string(&default_config)?;
    std::fs::write(&config_file, config_text)?;
    log::info!("Created config file {}", config_file.display());

    let source = default_config.source_dir(&path);
    let layouts = default_config.layouts_dir(&path);
    write_sample(&layouts.join("page.html"), SAMPLE_LAYOUT)?;
    write_sample(&source.join("index.html.tera"), SAMPLE_INDEX)?;
    write_sample(&source.join("post1.md"), SAMPLE_POST)?;
    write_sample(&source.join("css").join("site.less"), SAMPLE_STYLESHEET)?;

    Ok(())
}

fn sample_config() -> SiteConfig {
    let mut config = SiteConfig::default();
    for (key, value) in [
        ("sitename", "My Static Site & Blog"),
        ("siteurl", "https://example.com/"),
        ("description", "It's about saying »Hello« to the world."),
        ("generatorname", "kiln"),
        ("generatorurl", "https://crates.io/crates/kiln"),
    ] {
        config
            .metadata
            .insert(key.to_string(), Value::String(value.to_string()));
    }
    config.collections = vec![
        CollectionConfig::new("posts", "*.md"),
        CollectionConfig::new("index", "*.html.tera"),
    ];
    config.layouts.default = Some("page.html".to_string());
    config
}

/// Write a sample file unless something is already there.
fn write_sample(path: &Path, contents: &str) -> Result<(), anyhow::Error> {
    if path.exists() {
        log::info!("Keeping existing {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, contents)?;
    log::info!("Created {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Builder;

    #[test]
    fn test_init_then_build() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("site");
        run(&InitArgs {
            path: project.clone(),
            create: true,
        })
        .unwrap();

        let config = SiteConfig::load_from_file(&project.join(DEFAULT_CONFIG_FILE)).unwrap();
        assert_eq!(config.metadata["sitename"], "My Static Site & Blog");
        assert_eq!(config.collections.len(), 2);

        Builder::new(config, project.clone()).build().unwrap();
        let index = std::fs::read_to_string(project.join("build/index.html")).unwrap();
        assert!(index.contains("Hello, world"));
        assert!(project.join("build/post1/index.html").exists());
        assert!(project.join("build/css/site.css").exists());
    }

    #[test]
    fn test_init_requires_existing_dir() {
        let root = tempfile::tempdir().unwrap();
        let err = run(&InitArgs {
            path: root.path().join("missing"),
            create: false,
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_init_refuses_existing_config() {
        let root = tempfile::tempdir().unwrap();
        std::fs::write(root.path().join(DEFAULT_CONFIG_FILE), "clean: false\n").unwrap();
        let err = run(&InitArgs {
            path: root.path().to_path_buf(),
            create: false,
        });
        assert!(err.is_err());
        assert_eq!(
            std::fs::read_to_string(root.path().join(DEFAULT_CONFIG_FILE)).unwrap(),
            "clean: false\n"
        );
    }
}
