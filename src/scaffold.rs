//! Creates new sites: the standard folder skeleton, a default `site.yaml`,
//! and optionally one of the starter sets compiled into the binary.

use crate::config::{Config, CONFIG_FILE_NAME};
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// The folders every new site starts with.
pub const FOLDERS: &[&str] = &["_templates", "_posts", "_python", "css", "js", "images"];

/// A named set of starter files and the configuration changes they need.
pub struct Starter {
    pub name: &'static str,
    files: &'static [(&'static str, &'static str)],
    configure: fn(&mut Config),
}

macro_rules! starter_file {
    ($set:literal, $path:literal) => {
        ($path, include_str!(concat!("../starters/", $set, "/", $path)))
    };
}

pub const STARTERS: &[Starter] = &[
    Starter {
        name: "simple",
        files: &[
            starter_file!("simple", "_templates/page.html"),
            starter_file!("simple", "index.md"),
            starter_file!("simple", "about.md"),
            starter_file!("simple", "css/site.css"),
        ],
        configure: keep_defaults,
    },
    Starter {
        name: "blog",
        files: &[
            starter_file!("blog", "_templates/page.html"),
            starter_file!("blog", "_templates/post.html"),
            starter_file!("blog", "_templates/blog_index.html"),
            starter_file!("blog", "index.md"),
            starter_file!("blog", "_posts/2017-06-01-hello-world.md"),
            starter_file!("blog", "_posts/2017-06-15-second-post.md"),
            starter_file!("blog", "css/site.css"),
        ],
        configure: enable_blog,
    },
];

fn keep_defaults(_: &mut Config) {}

fn enable_blog(config: &mut Config) {
    config.blogposts = vec!["_posts".to_owned()];
    config.blogdir = "blog".to_owned();
    config.template_blog_index = "blog_index".to_owned();
}

/// Looks up a starter set by name.
pub fn starter(name: &str) -> Option<&'static Starter> {
    STARTERS.iter().find(|s| s.name == name)
}

/// Creates a new site at `site_dir` and returns the configuration written to
/// its `site.yaml`. An unknown starter name fails before anything is
/// written.
pub fn new_site(site_dir: &Path, starter_name: Option<&str>) -> Result<Config> {
    let starter = match starter_name {
        None => None,
        Some(name) => Some(starter(name).ok_or_else(|| {
            Error::Config(format!(
                "unknown site template '{}' (available: {})",
                name,
                STARTERS.iter().map(|s| s.name).collect::<Vec<_>>().join(", ")
            ))
        })?),
    };

    create_folders(site_dir)?;
    let mut config = Config::default();
    if let Some(starter) = starter {
        (starter.configure)(&mut config);
        for (relative, contents) in starter.files {
            let path = site_dir.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
            }
            fs::write(&path, contents).map_err(|e| Error::io(&path, e))?;
        }
    }
    config.write(&site_dir.join(CONFIG_FILE_NAME))?;
    info!(
        "created site at {} ({})",
        site_dir.display(),
        starter.map_or("empty", |s| s.name)
    );
    Ok(config)
}

/// Creates the standard folders under `site_dir`, leaving existing ones
/// alone.
pub fn create_folders(site_dir: &Path) -> Result<()> {
    for folder in FOLDERS {
        let path = site_dir.join(folder);
        fs::create_dir_all(&path).map_err(|e| Error::io(&path, e))?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_create_folders() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        create_folders(dir.path())?;
        for folder in FOLDERS {
            assert!(dir.path().join(folder).is_dir(), "{}", folder);
        }
        Ok(())
    }

    #[test]
    fn test_default_config_file() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let written = new_site(dir.path(), None)?;
        assert_eq!(written, Config::default());
        assert_eq!(Config::from_directory(dir.path())?, written);
        Ok(())
    }

    #[test]
    fn test_blog_starter() -> Result<()> {
        let dir = tempfile::tempdir().unwrap();
        let config = new_site(dir.path(), Some("blog"))?;
        assert_eq!(config.blogposts, vec!["_posts"]);
        assert!(config.blog_enabled());
        assert!(dir.path().join("_templates/blog_index.html").is_file());
        assert!(dir.path().join("_posts/2017-06-01-hello-world.md").is_file());
        Ok(())
    }

    #[test]
    fn test_unknown_starter() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("site");
        assert!(matches!(
            new_site(&target, Some("fancy")),
            Err(Error::Config(_))
        ));
        assert!(!target.exists());
    }
}
