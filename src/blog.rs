//! Builds and renders the blog index pages.
//!
//! Posts are ordered newest first by their `date` and `time`, then split
//! into index pages. A page is closed once it holds more than [`MAX_POSTS`]
//! posts, so full pages carry `MAX_POSTS + 1` posts, and the last page is
//! always written even when it ends up empty.

use crate::diagnostics::{Diagnostics, Kind};
use crate::error::{Error, Result};
use crate::page::{self, Page};
use crate::path;
use crate::template::Renderer;
use crate::walk::Site;
use chrono::NaiveDateTime;
use gtmpl_value::Value as TemplateValue;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;

pub const MAX_POSTS: usize = 5;

/// `date` and `time` are joined with `", "` and parsed with this format.
const DATE_TIME_FORMAT: &str = "%Y-%m-%d, %H:%M";

/// One blog index page.
#[derive(Debug)]
pub struct IndexPage<'a> {
    /// `index.html`, `index1.html`, ...
    pub file_name: String,
    pub permalink: String,
    pub basepath: String,
    pub folders: BTreeMap<String, String>,
    pub posts: Vec<&'a Page>,
}

impl IndexPage<'_> {
    /// The `.page` template value for this index page.
    fn to_value(&self, template: &str) -> TemplateValue {
        let mut fields = page::link_fields(&self.permalink, &self.basepath, &self.folders);
        fields.push((
            page::TEMPLATE.to_owned(),
            TemplateValue::String(template.to_owned()),
        ));
        fields.push((
            "file_name".to_owned(),
            TemplateValue::String(self.file_name.clone()),
        ));
        crate::value::object(fields)
    }
}

/// The instant a post was published, if its `date` and `time` parse.
pub fn published(post: &Page) -> Option<NaiveDateTime> {
    let stamp = format!("{}, {}", post.date()?, post.time()?);
    NaiveDateTime::parse_from_str(&stamp, DATE_TIME_FORMAT).ok()
}

/// Orders posts newest first. Posts whose date doesn't parse are reported
/// and go last. The order of posts with equal instants is unspecified.
pub fn sort_posts<'a>(
    posts: impl Iterator<Item = &'a Page>,
    diagnostics: &mut Diagnostics,
) -> Vec<&'a Page> {
    let mut dated: Vec<(Option<NaiveDateTime>, &Page)> = posts
        .map(|post| {
            let instant = published(post);
            if instant.is_none() {
                diagnostics.report(
                    &post.filepath,
                    Kind::Date(format!(
                        "'{}, {}' is not YYYY-MM-DD, H:MM",
                        post.date().unwrap_or_default(),
                        post.time().unwrap_or_default()
                    )),
                );
            }
            (instant, post)
        })
        .collect();
    dated.sort_by(|a, b| b.0.cmp(&a.0));
    dated.into_iter().map(|(_, post)| post).collect()
}

/// Splits sorted posts into index pages; see the module docs for the page
/// boundary. Always returns at least one (possibly empty) page.
pub fn paginate<'a>(posts: &[&'a Page]) -> Vec<Vec<&'a Page>> {
    let mut pages = Vec::new();
    let mut current = Vec::new();
    for post in posts {
        current.push(*post);
        if current.len() > MAX_POSTS {
            pages.push(std::mem::take(&mut current));
        }
    }
    pages.push(current);
    pages
}

/// `index.html` for the first page, `index{n}.html` after that.
pub fn index_file_name(n: usize) -> String {
    match n {
        0 => String::from("index.html"),
        _ => format!("index{}.html", n),
    }
}

/// Builds the index pages for all posts of `site`. An index page whose
/// permalink is already taken by a content page is a
/// [`Error::PermalinkCollision`].
pub fn index_pages<'a>(
    site: &'a Site,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<IndexPage<'a>>> {
    let blogdir = &site.config.blogdir;
    let sorted = sort_posts(site.posts(), diagnostics);
    paginate(&sorted)
        .into_iter()
        .enumerate()
        .map(|(n, posts)| {
            let file_name = index_file_name(n);
            let permalink = path::normalize(&format!("{}/{}", blogdir, file_name))
                .ok_or_else(|| {
                    Error::Config(format!("blogdir '{}' leaves the output directory", blogdir))
                })?;
            if let Some(page) = site.pages.get(&permalink) {
                return Err(Error::PermalinkCollision {
                    permalink,
                    first: page.filepath.clone(),
                    second: site.config_file(),
                });
            }
            let basepath = path::basepath(&permalink);
            Ok(IndexPage {
                folders: path::folder_links(&basepath, &site.folders),
                file_name,
                permalink,
                basepath,
                posts,
            })
        })
        .collect()
}

/// Renders every index page with the configured blog index template.
/// Template errors name the site's `site.yaml`, where the template is
/// configured.
pub fn write_index(
    site: &Site,
    renderer: &Renderer,
    diagnostics: &mut Diagnostics,
) -> Result<Vec<PathBuf>> {
    let template = &site.config.template_blog_index;
    let config_file = site.config_file();
    let pages = index_pages(site, diagnostics)?;
    let pagination_list: Vec<TemplateValue> = if pages.len() > 1 {
        pages
            .iter()
            .map(|p| TemplateValue::String(p.file_name.clone()))
            .collect()
    } else {
        Vec::new()
    };

    let mut written = Vec::with_capacity(pages.len());
    for index in &pages {
        let fields = vec![
            ("site".to_owned(), renderer.site().clone()),
            ("page".to_owned(), index.to_value(template)),
            (
                "posts".to_owned(),
                TemplateValue::Array(index.posts.iter().map(|p| p.to_value()).collect()),
            ),
            (
                "pagination_list".to_owned(),
                TemplateValue::Array(pagination_list.clone()),
            ),
        ];
        written.push(renderer.render(template, &config_file, &index.permalink, fields)?);
    }
    info!("wrote {} blog index pages", written.len());
    Ok(written)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::frontmatter::FileType;
    use crate::value::{Metadata, Value};

    fn post(name: &str, date: &str, time: &str) -> Page {
        let mut metadata = Metadata::new();
        metadata.insert(page::DATE.to_owned(), Value::from(date));
        metadata.insert(page::TIME.to_owned(), Value::from(time));
        Page {
            filepath: PathBuf::from(format!("/site/_posts/{}.md", name)),
            filetype: FileType::Markdown,
            permalink: format!("blog/{}.html", name),
            basepath: "../".to_owned(),
            folders: BTreeMap::new(),
            metadata,
        }
    }

    fn posts(k: usize) -> Vec<Page> {
        (0..k)
            .map(|i| post(&format!("p{}", i), &format!("2020-01-{:02}", i + 1), "9:00"))
            .collect()
    }

    fn sizes(k: usize) -> Vec<usize> {
        let owned = posts(k);
        let refs: Vec<&Page> = owned.iter().collect();
        paginate(&refs).iter().map(|p| p.len()).collect()
    }

    #[test]
    fn test_partition_sizes() {
        assert_eq!(sizes(0), vec![0]);
        assert_eq!(sizes(3), vec![3]);
        assert_eq!(sizes(5), vec![5]);
        assert_eq!(sizes(6), vec![6, 0]);
        assert_eq!(sizes(7), vec![6, 1]);
        assert_eq!(sizes(13), vec![6, 6, 1]);
    }

    #[test]
    fn test_first_page_holds_min_k_6() {
        for k in 0..20 {
            assert_eq!(sizes(k)[0], k.min(MAX_POSTS + 1));
        }
    }

    #[test]
    fn test_sort_newest_first() {
        let a = post("a", "2021-03-01", "9:00");
        let b = post("b", "2021-03-01", "17:45");
        let c = post("c", "2020-12-31", "23:59");
        let d = post("d", "not a date", "9:00");
        let mut diagnostics = Diagnostics::new();
        let sorted = sort_posts(vec![&d, &c, &a, &b].into_iter(), &mut diagnostics);
        let names: Vec<&str> = sorted.iter().map(|p| p.permalink.as_str()).collect();
        assert_eq!(
            names,
            vec!["blog/b.html", "blog/a.html", "blog/c.html", "blog/d.html"]
        );
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_published_single_digit_hour() {
        let p = post("x", "2024-01-01", "9:05");
        let instant = published(&p).unwrap();
        assert_eq!(instant.to_string(), "2024-01-01 09:05:00");
    }

    #[test]
    fn test_index_file_names() {
        assert_eq!(index_file_name(0), "index.html");
        assert_eq!(index_file_name(1), "index1.html");
        assert_eq!(index_file_name(12), "index12.html");
    }
}
