//! The template registry ([`Templates`]) and the page [`Renderer`].
//!
//! A page is rendered in two passes. The body (converted from Markdown if
//! needed) is itself evaluated as a template with `.site` and `.page` bound,
//! so content can use site and page variables inline. The result is bound as
//! `.body` when the page's own template runs.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::frontmatter::{self, FileType};
use crate::markdown;
use crate::page::Page;
use crate::path;
use crate::value::object;
use gtmpl::{Context, Template};
use gtmpl_value::Value as TemplateValue;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The directory under the site root that holds the templates.
pub const TEMPLATES_DIR: &str = "_templates";

/// Parsed templates keyed by file name without extension.
pub struct Templates {
    templates: HashMap<String, Template>,
}

impl Templates {
    /// Parses every file in `dir`. A missing directory gives an empty
    /// registry; a template that doesn't parse is an error.
    pub fn load(dir: &Path) -> Result<Templates> {
        let mut templates = HashMap::new();
        if !dir.is_dir() {
            warn!("no template directory at {}", dir.display());
            return Ok(Templates { templates });
        }

        let mut paths = Vec::new();
        for result in fs::read_dir(dir).map_err(|e| Error::io(dir, e))? {
            let entry = result.map_err(|e| Error::io(dir, e))?;
            if entry.path().is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        for path in paths {
            let name = match path.file_stem().and_then(|s| s.to_str()) {
                Some(name) => name.to_owned(),
                None => continue,
            };
            let contents = fs::read_to_string(&path).map_err(|e| Error::io(&path, e))?;
            let template = parse(&contents).map_err(|message| Error::Template {
                path: path.clone(),
                message,
            })?;
            if templates.insert(name.clone(), template).is_some() {
                warn!("template '{}' defined twice, using {}", name, path.display());
            }
        }
        debug!("found templates: {:?}", templates.keys().collect::<Vec<_>>());
        Ok(Templates { templates })
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

/// Renders pages into the output directory.
pub struct Renderer<'a> {
    templates: &'a Templates,
    output_dir: &'a Path,

    /// `.site`, converted once.
    site: TemplateValue,
}

impl<'a> Renderer<'a> {
    pub fn new(config: &Config, templates: &'a Templates, output_dir: &'a Path) -> Renderer<'a> {
        Renderer {
            templates,
            output_dir,
            site: config.to_value(),
        }
    }

    /// Renders one page and writes it to its permalink. The body is read
    /// again from the source file. Returns the written path.
    pub fn render_page(&self, page: &Page) -> Result<PathBuf> {
        let document = match frontmatter::parse_file(&page.filepath) {
            Ok(Some(document)) => document,
            Ok(None) => {
                return Err(Error::FrontMatter {
                    path: page.filepath.clone(),
                    message: "front matter is gone".to_owned(),
                })
            }
            Err(frontmatter::Error::Read(err)) => return Err(Error::io(&page.filepath, err)),
            Err(err) => {
                return Err(Error::FrontMatter {
                    path: page.filepath.clone(),
                    message: err.to_string(),
                })
            }
        };

        let body = match page.filetype {
            FileType::Markdown => markdown::to_html(&document.body),
            _ => document.body,
        };

        let page_value = page.to_value();
        let body = parse(&body)
            .and_then(|body_template| {
                execute(
                    &body_template,
                    object(vec![
                        ("site".to_owned(), self.site.clone()),
                        ("page".to_owned(), page_value.clone()),
                    ]),
                )
            })
            .map_err(|message| Error::Template {
                path: page.filepath.clone(),
                message,
            })?;

        self.render(
            page.template().unwrap_or(""),
            &page.filepath,
            &page.permalink,
            vec![
                ("site".to_owned(), self.site.clone()),
                ("page".to_owned(), page_value),
                ("body".to_owned(), TemplateValue::String(body)),
            ],
        )
    }

    /// Renders the template `name` with `fields` bound and writes the result
    /// to `permalink`. `source` names the page in errors.
    pub fn render(
        &self,
        name: &str,
        source: &Path,
        permalink: &str,
        fields: Vec<(String, TemplateValue)>,
    ) -> Result<PathBuf> {
        let template = self.templates.get(name).ok_or_else(|| Error::UnknownTemplate {
            page: source.to_owned(),
            template: name.to_owned(),
        })?;
        let html = execute(template, object(fields)).map_err(|message| Error::Template {
            path: source.to_owned(),
            message,
        })?;

        let path = self.output_path(permalink)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&path, html).map_err(|e| Error::io(&path, e))?;
        debug!("rendered {} with '{}'", path.display(), name);
        Ok(path)
    }

    /// The `.site` value every template sees.
    pub fn site(&self) -> &TemplateValue {
        &self.site
    }

    /// Maps a permalink onto the output directory.
    pub fn output_path(&self, permalink: &str) -> Result<PathBuf> {
        let normalized = path::normalize(permalink).ok_or_else(|| {
            Error::Config(format!(
                "permalink '{}' doesn't name a file in the output directory",
                permalink
            ))
        })?;
        let mut path = self.output_dir.to_owned();
        path.extend(normalized.split('/'));
        Ok(path)
    }
}

fn parse(text: &str) -> std::result::Result<Template, String> {
    let mut template = Template::default();
    template.parse(text).map_err(|e| e.to_string())?;
    Ok(template)
}

fn execute(template: &Template, value: TemplateValue) -> std::result::Result<String, String> {
    let context = Context::from(value).map_err(|e| e.to_string())?;
    let mut out: Vec<u8> = Vec::new();
    template
        .execute(&mut out, &context)
        .map_err(|e| e.to_string())?;
    String::from_utf8(out).map_err(|e| e.to_string())
}
