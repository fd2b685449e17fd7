//! Defines [`Site`] and the [`Walker`], which traverses the source tree once
//! and produces every page, every blog post and every passthrough copy.
//!
//! Directories are visited pre-order. For each directory:
//!
//! 1. Subdirectories inside the output directory are pruned. Other
//!    subdirectories are walked unless `exclude` matches them and neither
//!    `render` nor `blogposts` does.
//! 2. Files matched by `interpret` are parsed for front matter. Those with
//!    front matter become [`Page`]s (and, in a blog directory, posts); the
//!    rest are put back with the plain files.
//! 3. Plain files are copied unless the directory or the file is excluded.
//! 4. Non-excluded subdirectories are created in the output tree.

use crate::config::{Config, Rules, CONFIG_FILE_NAME};
use crate::diagnostics::{Diagnostics, Kind};
use crate::error::{Error, Result};
use crate::frontmatter::{self, Document, FileType};
use crate::page::{Page, DATE, PERMALINK, SUMMARY, TIME};
use crate::path;
use crate::value::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

/// Blog posts without a `time` get this one.
pub const DEFAULT_POST_TIME: &str = "9:00";

const DATE_PREFIX_LEN: usize = 10;
const SUMMARY_WORDS: usize = 10;

/// Everything one render knows about a site. Built by [`Walker::walk`] and
/// only read afterwards.
#[derive(Debug)]
pub struct Site {
    /// The canonical site root.
    pub root: PathBuf,

    pub config: Config,

    /// Root-level folders that aren't excluded.
    pub folders: BTreeSet<String>,

    /// Pages keyed by permalink.
    pub pages: BTreeMap<String, Page>,

    /// Permalinks of the pages that are blog posts.
    pub posts: BTreeSet<String>,

    /// Passthrough files copied to the output, relative to the site root.
    pub copied: Vec<PathBuf>,
}

impl Site {
    /// The `site.yaml` this site was configured from.
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// The blog posts, in permalink order.
    pub fn posts(&self) -> impl Iterator<Item = &Page> {
        self.posts.iter().filter_map(move |p| self.pages.get(p))
    }
}

/// Walks a site directory into a [`Site`], copying passthrough files as it
/// goes.
pub struct Walker<'a> {
    /// The site root. Should be canonical so the output check works.
    site_dir: &'a Path,

    /// The output root. Must exist and be canonical.
    output_dir: &'a Path,

    rules: &'a Rules,
}

impl<'a> Walker<'a> {
    pub fn new(site_dir: &'a Path, output_dir: &'a Path, rules: &'a Rules) -> Walker<'a> {
        Walker {
            site_dir,
            output_dir,
            rules,
        }
    }

    /// Walks the whole tree. Unreadable directories and files and malformed
    /// front matter are reported to `diagnostics` and skipped. Fails on
    /// permalink collisions and on errors writing the output tree.
    pub fn walk(&self, config: Config, diagnostics: &mut Diagnostics) -> Result<Site> {
        let mut site = Site {
            root: self.site_dir.to_owned(),
            folders: self.root_folders(diagnostics),
            config,
            pages: BTreeMap::new(),
            posts: BTreeSet::new(),
            copied: Vec::new(),
        };

        let entries = WalkDir::new(self.site_dir)
            .follow_links(true)
            .sort_by(|a, b| a.file_name().cmp(b.file_name()))
            .into_iter()
            .filter_entry(|entry| !entry.file_type().is_dir() || self.admits(entry));

        for result in entries {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(self.site_dir).to_owned();
                    diagnostics.report(&path, Kind::Walk(err.to_string()));
                    continue;
                }
            };
            if entry.file_type().is_dir() {
                self.visit_dir(entry.path(), entry.depth(), &mut site, diagnostics)?;
            }
        }

        info!(
            "walked {}: {} pages, {} posts, {} files copied",
            self.site_dir.display(),
            site.pages.len(),
            site.posts.len(),
            site.copied.len()
        );
        Ok(site)
    }

    fn admits(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }
        if self.is_output(entry.path()) {
            debug!("pruning output directory {}", entry.path().display());
            return false;
        }
        let admitted = entry
            .file_name()
            .to_str()
            .map_or(false, |name| self.rules.admits_dir(name));
        if !admitted {
            debug!("pruning excluded directory {}", entry.path().display());
        }
        admitted
    }

    fn is_output(&self, path: &Path) -> bool {
        path.starts_with(self.output_dir)
    }

    fn root_folders(&self, diagnostics: &mut Diagnostics) -> BTreeSet<String> {
        match list_dir(self.site_dir) {
            Ok((_, dirs)) => dirs
                .into_iter()
                .filter(|name| {
                    !self.rules.is_excluded(name) && !self.is_output(&self.site_dir.join(name))
                })
                .collect(),
            Err(err) => {
                diagnostics.report(self.site_dir, Kind::Walk(err.to_string()));
                BTreeSet::new()
            }
        }
    }

    fn visit_dir(
        &self,
        dir: &Path,
        depth: usize,
        site: &mut Site,
        diagnostics: &mut Diagnostics,
    ) -> Result<()> {
        let (files, subdirs) = match list_dir(dir) {
            Ok(listing) => listing,
            Err(err) => {
                diagnostics.report(dir, Kind::Walk(err.to_string()));
                return Ok(());
            }
        };

        let relative = relative_dir(self.site_dir, dir);
        let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let is_blog_dir = depth > 0 && self.rules.is_blog_dir(name);
        let is_excluded = depth > 0 && self.rules.is_excluded(name);

        let mut rendered: BTreeSet<&String> = BTreeSet::new();
        for file_name in self.rules.interpreted(&files) {
            let file_path = dir.join(file_name);
            let document = match frontmatter::parse_file(&file_path) {
                Ok(Some(document)) => document,
                Ok(None) => {
                    debug!("no front matter in {}, copying", file_path.display());
                    continue;
                }
                Err(frontmatter::Error::Read(err)) => {
                    diagnostics.report(&file_path, Kind::Read(err.to_string()));
                    continue;
                }
                Err(err) => {
                    diagnostics.report(&file_path, Kind::FrontMatter(err.to_string()));
                    continue;
                }
            };
            let page = stamp(
                &site.config,
                &site.folders,
                &relative,
                file_name,
                file_path,
                document,
                is_blog_dir,
            )?;
            insert(site, page, is_blog_dir)?;
            rendered.insert(file_name);
        }

        let target_dir = self.output_dir.join(&relative);
        if !is_excluded {
            for file_name in files.iter().filter(|f| !rendered.contains(f)) {
                if self.rules.is_excluded(file_name)
                    || (depth == 0 && file_name.to_lowercase() == CONFIG_FILE_NAME)
                {
                    continue;
                }
                let source = dir.join(file_name);
                if copy_file(&source, &target_dir.join(file_name), diagnostics)? {
                    site.copied.push(Path::new(&relative).join(file_name));
                }
            }
        }

        for subdir in &subdirs {
            let path = dir.join(subdir);
            if self.rules.is_excluded(subdir) || self.is_output(&path) {
                continue;
            }
            let target = target_dir.join(subdir);
            fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        }
        Ok(())
    }
}

/// Builds the page for one parsed file: source fields, blog defaults, then
/// path fields. Fails if the page's explicit permalink is unusable.
fn stamp(
    config: &Config,
    folders: &BTreeSet<String>,
    relative_dir: &str,
    file_name: &str,
    filepath: PathBuf,
    document: Document,
    is_post: bool,
) -> Result<Page> {
    let mut metadata = document.metadata;
    if is_post {
        metadata
            .entry(TIME.to_owned())
            .or_insert_with(|| Value::from(DEFAULT_POST_TIME));
        metadata
            .entry(DATE.to_owned())
            .or_insert_with(|| Value::String(file_name.chars().take(DATE_PREFIX_LEN).collect()));
        metadata
            .entry(SUMMARY.to_owned())
            .or_insert_with(|| Value::String(summarize(&document.body)));
    }
    let resolved = match path::resolve(
        relative_dir,
        file_name,
        &metadata,
        &config.html_extension,
        folders,
        is_post,
    ) {
        Some(resolved) => resolved,
        None => {
            return Err(Error::InvalidPermalink {
                permalink: metadata
                    .get(PERMALINK)
                    .and_then(Value::to_plain_string)
                    .unwrap_or_default(),
                page: filepath,
            })
        }
    };
    Ok(Page {
        filetype: FileType::of(&filepath),
        filepath,
        permalink: resolved.permalink,
        basepath: resolved.basepath,
        folders: resolved.folders,
        metadata,
    })
}

fn insert(site: &mut Site, page: Page, is_post: bool) -> Result<()> {
    if let Some(existing) = site.pages.get(&page.permalink) {
        return Err(Error::PermalinkCollision {
            permalink: page.permalink.clone(),
            first: existing.filepath.clone(),
            second: page.filepath,
        });
    }
    debug!("page {} from {}", page.permalink, page.filepath.display());
    if is_post {
        site.posts.insert(page.permalink.clone());
    }
    site.pages.insert(page.permalink.clone(), page);
    Ok(())
}

/// The first few words of a body, used when a post has no `summary`.
fn summarize(body: &str) -> String {
    body.split_whitespace()
        .take(SUMMARY_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lists a directory into sorted file and subdirectory names. Entries whose
/// names aren't valid UTF-8 are left out.
fn list_dir(dir: &Path) -> io::Result<(Vec<String>, Vec<String>)> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for result in fs::read_dir(dir)? {
        let entry = result?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                debug!("skipping non UTF-8 name {:?}", raw);
                continue;
            }
        };
        // Follows symlinks, like the walk itself.
        if entry.path().is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    files.sort();
    dirs.sort();
    Ok((files, dirs))
}

/// `dir` relative to `root`, `/`-separated, empty for the root itself.
fn relative_dir(root: &Path, dir: &Path) -> String {
    dir.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/")
        })
        .unwrap_or_default()
}

/// Copies one passthrough file. A source that can't be opened is reported
/// and skipped (`Ok(false)`); failing to write the copy is an error.
fn copy_file(source: &Path, target: &Path, diagnostics: &mut Diagnostics) -> Result<bool> {
    let mut reader = match File::open(source) {
        Ok(file) => file,
        Err(err) => {
            diagnostics.report(source, Kind::Read(err.to_string()));
            return Ok(false);
        }
    };
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    let mut writer = File::create(target).map_err(|e| Error::io(target, e))?;
    io::copy(&mut reader, &mut writer).map_err(|e| Error::io(target, e))?;
    debug!("copied {}", source.display());
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn walk(site_dir: &Path, config: Config) -> (Site, Diagnostics, PathBuf) {
        let out = site_dir.join("build");
        fs::create_dir_all(&out).unwrap();
        let site_dir = site_dir.canonicalize().unwrap();
        let out = out.canonicalize().unwrap();
        let rules = Rules::new(&config).unwrap();
        let mut diagnostics = Diagnostics::new();
        let site = Walker::new(&site_dir, &out, &rules)
            .walk(config, &mut diagnostics)
            .unwrap();
        (site, diagnostics, out)
    }

    fn config() -> Config {
        Config {
            interpret: vec!["*.md".to_owned()],
            exclude: vec!["_*".to_owned()],
            html_extension: ".html".to_owned(),
            ..Config::default()
        }
    }

    #[test]
    fn test_page_without_blog() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("blog/2024-01-01-hello.md"),
            "---\ntemplate: post\n---\nHello there\n",
        );
        let (site, diagnostics, _) = walk(dir.path(), config());
        assert!(diagnostics.is_empty());
        let page = &site.pages["blog/2024-01-01-hello.html"];
        assert_eq!(page.basepath, "../");
        assert_eq!(page.template(), Some("post"));
        assert_eq!(page.date(), None);
        assert!(site.posts.is_empty());
    }

    #[test]
    fn test_blog_defaults() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("blog/2024-01-01-hello.md"),
            "---\ntemplate: post\n---\none two three four five six seven eight nine ten eleven\n",
        );
        let config = Config {
            blogposts: vec!["blog".to_owned()],
            ..config()
        };
        let (site, _, _) = walk(dir.path(), config);
        let posts: Vec<&Page> = site.posts().collect();
        assert_eq!(posts.len(), 1);
        let post = posts[0];
        assert_eq!(post.permalink, "blog/2024-01-01-hello.html");
        assert_eq!(post.date().as_deref(), Some("2024-01-01"));
        assert_eq!(post.time().as_deref(), Some("9:00"));
        assert_eq!(
            post.get(SUMMARY),
            Some(&Value::from("one two three four five six seven eight nine ten"))
        );
        assert_eq!(site.pages[&post.permalink], *post);
    }

    #[test]
    fn test_posts_flatten_under_blog() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("_posts/2023-05-06-x.md"),
            "---\ntemplate: post\ntime: '18:30'\ndate: '2023-05-07'\n---\nx\n",
        );
        let config = Config {
            blogposts: vec!["_posts".to_owned()],
            ..config()
        };
        let (site, _, out) = walk(dir.path(), config);
        let post = &site.pages["blog/2023-05-06-x.html"];
        assert_eq!(post.time().as_deref(), Some("18:30"));
        assert_eq!(post.date().as_deref(), Some("2023-05-07"));
        // The excluded blog directory isn't mirrored.
        assert!(!out.join("_posts").exists());
    }

    #[test]
    fn test_exclude_render_precedence() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("_pages/about.md"), "---\ntemplate: page\n---\n");
        write(&dir.path().join("_drafts/wip.md"), "---\ntemplate: page\n---\n");
        let config = Config {
            render: vec!["_pages".to_owned()],
            ..config()
        };
        let (site, _, _) = walk(dir.path(), config);
        assert!(site.pages.contains_key("_pages/about.html"));
        assert!(!site.pages.contains_key("_drafts/wip.html"));
    }

    #[test]
    fn test_passthrough_and_demotion() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("site.yaml"), "interpret: '*.md'\n");
        write(&dir.path().join("css/site.css"), "body {}\n");
        write(&dir.path().join("notes.md"), "# no front matter\n");
        write(&dir.path().join("broken.md"), "---\ntitle: [oops\n---\nbody\n");
        write(&dir.path().join("_templates/page.html"), "{{.body}}");
        fs::write(dir.path().join("blob.bin"), [0u8, 159, 146, 150]).unwrap();

        let (site, diagnostics, out) = walk(dir.path(), config());
        assert!(site.pages.is_empty());
        assert_eq!(fs::read_to_string(out.join("css/site.css")).unwrap(), "body {}\n");
        assert_eq!(fs::read(out.join("blob.bin")).unwrap(), vec![0u8, 159, 146, 150]);
        assert!(out.join("notes.md").exists());
        assert!(out.join("broken.md").exists());
        assert!(!out.join("site.yaml").exists());
        assert!(!out.join("_templates").exists());

        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics.entries()[0];
        assert!(d.path.ends_with("broken.md"));
        assert!(matches!(d.kind, Kind::FrontMatter(_)));
    }

    #[test]
    fn test_root_folders_skip_output_and_excluded() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::create_dir_all(dir.path().join("_templates")).unwrap();
        let (site, _, _) = walk(dir.path(), config());
        let folders: Vec<&str> = site.folders.iter().map(|s| s.as_str()).collect();
        assert_eq!(folders, vec!["css"]);
    }

    #[test]
    fn test_output_subtree_is_not_walked() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir.path().join("build/old.md"), "---\ntemplate: page\n---\n");
        let (site, _, _) = walk(dir.path(), config());
        assert!(site.pages.is_empty());
    }

    #[test]
    fn test_permalink_collision() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("a.md"),
            "---\npermalink: same.html\ntemplate: page\n---\n",
        );
        write(
            &dir.path().join("b.md"),
            "---\npermalink: same.html\ntemplate: page\n---\n",
        );
        let site_dir = dir.path().canonicalize().unwrap();
        let out = site_dir.join("build");
        fs::create_dir_all(&out).unwrap();
        let config = config();
        let rules = Rules::new(&config).unwrap();
        match Walker::new(&site_dir, &out, &rules).walk(config, &mut Diagnostics::new()) {
            Err(Error::PermalinkCollision { permalink, .. }) => assert_eq!(permalink, "same.html"),
            other => panic!("expected a collision, got {:?}", other),
        }
    }

    #[test]
    fn test_permalink_collision_after_normalizing() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("a.md"),
            "---\npermalink: about.html\ntemplate: page\n---\nA\n",
        );
        write(
            &dir.path().join("b.md"),
            "---\npermalink: /about.html\ntemplate: page\n---\nB\n",
        );
        let site_dir = dir.path().canonicalize().unwrap();
        let out = site_dir.join("build");
        fs::create_dir_all(&out).unwrap();
        let config = config();
        let rules = Rules::new(&config).unwrap();
        match Walker::new(&site_dir, &out, &rules).walk(config, &mut Diagnostics::new()) {
            Err(Error::PermalinkCollision {
                permalink,
                first,
                second,
            }) => {
                assert_eq!(permalink, "about.html");
                assert!(first.ends_with("a.md"));
                assert!(second.ends_with("b.md"));
            }
            other => panic!("expected a collision, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_permalink_names_the_page() {
        let dir = tempfile::tempdir().unwrap();
        write(
            &dir.path().join("docs/empty.md"),
            "---\npermalink: ''\ntemplate: page\n---\n",
        );
        let site_dir = dir.path().canonicalize().unwrap();
        let out = site_dir.join("build");
        fs::create_dir_all(&out).unwrap();
        let config = config();
        let rules = Rules::new(&config).unwrap();
        match Walker::new(&site_dir, &out, &rules).walk(config, &mut Diagnostics::new()) {
            Err(Error::InvalidPermalink { page, permalink }) => {
                assert!(page.ends_with("docs/empty.md"));
                assert_eq!(permalink, "");
            }
            other => panic!("expected an invalid permalink, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_page_is_copied() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bin.md"), [0xffu8, 0xfe, 0x00]).unwrap();
        write(&dir.path().join("ok.md"), "---\ntemplate: page\n---\nfine\n");
        let (site, diagnostics, out) = walk(dir.path(), config());
        assert!(site.pages.contains_key("ok.html"));
        assert_eq!(site.pages.len(), 1);
        assert_eq!(diagnostics.len(), 1);
        let d = &diagnostics.entries()[0];
        assert!(d.path.ends_with("bin.md"));
        assert!(matches!(d.kind, Kind::Read(_)));
        assert_eq!(fs::read(out.join("bin.md")).unwrap(), vec![0xffu8, 0xfe, 0x00]);
    }

    #[test]
    fn test_nested_dirs_are_created() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("deep/down/under")).unwrap();
        let (_, _, out) = walk(dir.path(), config());
        assert!(out.join("deep/down/under").is_dir());
    }

    #[test]
    fn test_summarize() {
        assert_eq!(summarize("  a\n b\tc  "), "a b c");
        assert_eq!(summarize(""), "");
    }
}
