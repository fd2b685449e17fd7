//! Exports [`render_site`], which stitches together the steps of a render:
//! loading templates, walking the source tree ([`crate::walk`]), rendering
//! every page ([`crate::template`]) and writing the blog index
//! ([`crate::blog`]).

use crate::blog;
use crate::config::{Config, Rules};
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::template::{Renderer, Templates, TEMPLATES_DIR};
use crate::walk::Walker;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a render produced.
#[derive(Debug)]
pub struct RenderReport {
    /// Output files written for pages, in permalink order.
    pub pages: Vec<PathBuf>,

    /// How many of the pages are blog posts.
    pub posts: usize,

    /// Output files written for blog index pages.
    pub index_pages: Vec<PathBuf>,

    /// Passthrough files copied, relative to the site root.
    pub copied: Vec<PathBuf>,

    /// Everything that was skipped or demoted along the way.
    pub diagnostics: Diagnostics,
}

/// Loads `{site_dir}/site.yaml` and renders the site into `output_dir`.
pub fn render_dir(site_dir: &Path, output_dir: Option<&Path>) -> Result<RenderReport> {
    let output_dir = require_output(output_dir)?;
    let config = Config::from_directory(site_dir)?;
    render_site(site_dir, Some(output_dir), config, Diagnostics::new())
}

/// Renders the site at `site_dir` into `output_dir` with `config`.
///
/// A missing output path is a configuration error raised before anything is
/// touched. The output directory is created if needed. Problems with single
/// files are recorded in `diagnostics`; the first fatal error (unknown
/// template, permalink collision, failed write) aborts the render.
pub fn render_site(
    site_dir: &Path,
    output_dir: Option<&Path>,
    config: Config,
    mut diagnostics: Diagnostics,
) -> Result<RenderReport> {
    let output_dir = require_output(output_dir)?;
    let rules = Rules::new(&config)?;

    let site_dir = site_dir
        .canonicalize()
        .map_err(|e| Error::io(site_dir, e))?;
    fs::create_dir_all(output_dir).map_err(|e| Error::io(output_dir, e))?;
    let output_dir = output_dir
        .canonicalize()
        .map_err(|e| Error::io(output_dir, e))?;

    let templates = Templates::load(&site_dir.join(TEMPLATES_DIR))?;
    info!("loaded {} templates", templates.len());

    let site = Walker::new(&site_dir, &output_dir, &rules).walk(config, &mut diagnostics)?;

    let renderer = Renderer::new(&site.config, &templates, &output_dir);
    let pages = site
        .pages
        .values()
        .map(|page| renderer.render_page(page))
        .collect::<Result<Vec<_>>>()?;
    info!("rendered {} pages", pages.len());

    let index_pages = if site.config.blog_enabled() {
        blog::write_index(&site, &renderer, &mut diagnostics)?
    } else {
        Vec::new()
    };

    Ok(RenderReport {
        pages,
        posts: site.posts.len(),
        index_pages,
        copied: site.copied,
        diagnostics,
    })
}

fn require_output(output_dir: Option<&Path>) -> Result<&Path> {
    match output_dir {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(dir),
        _ => Err(Error::Config("please state an output directory".to_owned())),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_missing_output_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            render_site(dir.path(), None, Config::default(), Diagnostics::new()),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            render_dir(dir.path(), Some(Path::new(""))),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("build");
        assert!(matches!(
            render_dir(dir.path(), Some(&out)),
            Err(Error::Config(_))
        ));
        // Nothing is created before the configuration loads.
        assert!(!out.exists());
    }
}
