//! Derives a page's `permalink`, `basepath` and folder links.
//!
//! The basepath is always computed from the permalink, never from the source
//! location, so an author-supplied permalink stays self-consistent.

use crate::page::PERMALINK;
use crate::value::{Metadata, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Blog posts without an explicit permalink are flattened under this
/// directory, whatever their source directory is.
pub const BLOG_PREFIX: &str = "blog";

const PARENT: &str = "../";

/// The path fields of one page.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub permalink: String,
    pub basepath: String,
    pub folders: BTreeMap<String, String>,
}

/// Resolves the path fields for `file_name` in `relative_dir` (relative to
/// the site root, `/`-separated, empty for the root). Returns `None` when an
/// explicit permalink doesn't name a file under the output root.
pub fn resolve(
    relative_dir: &str,
    file_name: &str,
    metadata: &Metadata,
    html_extension: &str,
    folders: &BTreeSet<String>,
    is_post: bool,
) -> Option<Resolved> {
    let permalink = match metadata.get(PERMALINK).and_then(Value::to_plain_string) {
        Some(explicit) => normalize(&explicit)?,
        None if is_post => permalink(BLOG_PREFIX, file_name, html_extension),
        None => permalink(relative_dir, file_name, html_extension),
    };
    let basepath = basepath(&permalink);
    let folders = folder_links(&basepath, folders);
    Some(Resolved {
        permalink,
        basepath,
        folders,
    })
}

/// Rewrites a permalink into the form it is keyed and written under: no
/// leading, trailing or doubled separators and no `.` segments. `None` if
/// nothing is left or a segment is `..`.
pub fn normalize(permalink: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in permalink.split('/').filter(|s| !s.is_empty() && *s != ".") {
        if segment == ".." {
            return None;
        }
        segments.push(segment);
    }
    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// `{relative_dir}/{stem}{html_extension}` without a leading separator.
pub fn permalink(relative_dir: &str, file_name: &str, html_extension: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_owned());
    let joined = format!("{}/{}{}", relative_dir, stem, html_extension);
    joined.trim_start_matches('/').to_owned()
}

/// `../` repeated once per separator in `permalink`. A leading separator
/// doesn't count.
pub fn basepath(permalink: &str) -> String {
    PARENT.repeat(permalink.trim_start_matches('/').matches('/').count())
}

/// `basepath + name` for every root folder.
pub fn folder_links(basepath: &str, folders: &BTreeSet<String>) -> BTreeMap<String, String> {
    folders
        .iter()
        .map(|name| (name.clone(), format!("{}{}", basepath, name)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn folders() -> BTreeSet<String> {
        vec!["css".to_owned(), "images".to_owned()].into_iter().collect()
    }

    #[test]
    fn test_root_page() {
        let r = resolve("", "index.md", &Metadata::new(), ".html", &folders(), false).unwrap();
        assert_eq!(r.permalink, "index.html");
        assert_eq!(r.basepath, "");
        assert_eq!(r.folders["css"], "css");
    }

    #[test]
    fn test_nested_page() {
        let r = resolve("deep/down", "test.html", &Metadata::new(), ".html", &folders(), false).unwrap();
        assert_eq!(r.permalink, "deep/down/test.html");
        assert_eq!(r.basepath, "../../");
        assert_eq!(r.folders["images"], "../../images");
    }

    #[test]
    fn test_explicit_permalink_drives_basepath() {
        let mut meta = Metadata::new();
        meta.insert(PERMALINK.to_owned(), Value::from("a/b/c/page.html"));
        let r = resolve("", "page.md", &meta, ".html", &folders(), true).unwrap();
        assert_eq!(r.permalink, "a/b/c/page.html");
        assert_eq!(r.basepath, "../../../");
    }

    #[test]
    fn test_post_is_flattened() {
        let r = resolve(
            "_posts/2024",
            "2024-01-01-hello.md",
            &Metadata::new(),
            ".html",
            &folders(),
            true,
        )
        .unwrap();
        assert_eq!(r.permalink, "blog/2024-01-01-hello.html");
        assert_eq!(r.basepath, "../");
        assert_eq!(r.folders["css"], "../css");
    }

    #[test]
    fn test_basepath_counts_separators() {
        for (permalink, n) in &[("x.html", 0), ("a/x.html", 1), ("a/b/c/d/x.html", 4)] {
            assert_eq!(basepath(permalink), PARENT.repeat(*n));
        }
    }

    #[test]
    fn test_stem_keeps_inner_dots() {
        assert_eq!(permalink("docs", "v1.2.md", ".htm"), "docs/v1.2.htm");
    }

    #[test]
    fn test_explicit_permalink_is_normalized() {
        let mut meta = Metadata::new();
        meta.insert(PERMALINK.to_owned(), Value::from("/docs//./about.html"));
        let r = resolve("", "about.md", &meta, ".html", &folders(), false).unwrap();
        assert_eq!(r.permalink, "docs/about.html");
        assert_eq!(r.basepath, "../");
        assert_eq!(r.folders["css"], "../css");
    }

    #[test]
    fn test_unusable_permalinks() {
        for bad in &["", "/", "./", "../out.html", "a/../../b.html"] {
            let mut meta = Metadata::new();
            meta.insert(PERMALINK.to_owned(), Value::from(*bad));
            assert_eq!(
                resolve("", "a.md", &meta, ".html", &folders(), false),
                None,
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("about.html").as_deref(), Some("about.html"));
        assert_eq!(normalize("/about.html").as_deref(), Some("about.html"));
        assert_eq!(normalize("blog//index.html/").as_deref(), Some("blog/index.html"));
        assert_eq!(normalize("//"), None);
    }
}
