//! Defines [`Config`], the typed form of a site's `site.yaml`, and the glob
//! rules ([`Rules`]) compiled from it.

use crate::error::{Error, Result};
use crate::value::{object, strings};
use globset::{Glob, GlobSet, GlobSetBuilder};
use gtmpl_value::Value as TemplateValue;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// The well-known name of the configuration file at the site root.
pub const CONFIG_FILE_NAME: &str = "site.yaml";

/// Site-wide configuration. Every field has a default so partial files
/// load; the list-valued glob fields accept either a scalar or a list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub url: String,

    #[serde(alias = "site title")]
    pub site_title: String,

    #[serde(deserialize_with = "one_or_many")]
    pub filter: Vec<String>,

    /// Patterns matched against file and directory basenames.
    #[serde(deserialize_with = "one_or_many")]
    pub exclude: Vec<String>,

    /// Directories that are walked even when `exclude` matches them.
    #[serde(deserialize_with = "one_or_many")]
    pub render: Vec<String>,

    /// Directories whose interpreted files are blog posts.
    #[serde(deserialize_with = "one_or_many")]
    pub blogposts: Vec<String>,

    /// Output directory for blog index pages. Empty means no blog.
    pub blogdir: String,

    /// Template for blog index pages. Empty means no index is rendered.
    pub template_blog_index: String,

    /// Files that carry front matter and are rendered rather than copied.
    #[serde(deserialize_with = "one_or_many")]
    pub interpret: Vec<String>,

    #[serde(alias = "html extention")]
    pub html_extension: String,

    #[serde(alias = "language modifier")]
    pub language_modifier: BTreeMap<String, String>,

    #[serde(alias = "language default")]
    pub language_default: String,
}

impl Default for Config {
    fn default() -> Self {
        let mut language_modifier = BTreeMap::new();
        language_modifier.insert("de".to_owned(), "_de".to_owned());
        language_modifier.insert("es".to_owned(), "_es".to_owned());
        Config {
            url: String::new(),
            site_title: "My New Edward Website".to_owned(),
            filter: vec!["markdown".to_owned()],
            exclude: vec!["_*".to_owned()],
            render: Vec::new(),
            blogposts: Vec::new(),
            blogdir: String::new(),
            template_blog_index: String::new(),
            interpret: vec!["*.md".to_owned(), "*.html".to_owned()],
            html_extension: ".html".to_owned(),
            language_modifier,
            language_default: "en".to_owned(),
        }
    }
}

impl Config {
    /// Loads the configuration from `{site_dir}/site.yaml`.
    pub fn from_directory(site_dir: &Path) -> Result<Config> {
        Config::from_file(&site_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads the configuration from a file. A missing or malformed file is a
    /// [`Error::Config`].
    pub fn from_file(path: &Path) -> Result<Config> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("reading '{}': {}", path.display(), e))
        })?;
        Config::parse(&contents)
            .map_err(|e| Error::Config(format!("parsing '{}': {}", path.display(), e)))
    }

    /// Parses a configuration document: JSON first, then YAML.
    pub fn parse(contents: &str) -> std::result::Result<Config, serde_yaml::Error> {
        match serde_json::from_str(contents) {
            Ok(config) => Ok(config),
            Err(_) => {
                // An empty YAML document is null; treat it as all defaults.
                if contents.trim().is_empty() {
                    return Ok(Config::default());
                }
                serde_yaml::from_str(contents)
            }
        }
    }

    /// Serializes the configuration as YAML and writes it to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, yaml).map_err(|e| Error::io(path, e))
    }

    /// Whether blog index pages should be rendered.
    pub fn blog_enabled(&self) -> bool {
        !self.blogdir.is_empty() && !self.template_blog_index.is_empty()
    }

    /// Converts the configuration into the `.site` template value.
    pub fn to_value(&self) -> TemplateValue {
        object(vec![
            ("url".to_owned(), TemplateValue::String(self.url.clone())),
            (
                "site_title".to_owned(),
                TemplateValue::String(self.site_title.clone()),
            ),
            ("filter".to_owned(), strings(&self.filter)),
            ("exclude".to_owned(), strings(&self.exclude)),
            ("render".to_owned(), strings(&self.render)),
            ("blogposts".to_owned(), strings(&self.blogposts)),
            ("blogdir".to_owned(), TemplateValue::String(self.blogdir.clone())),
            (
                "template_blog_index".to_owned(),
                TemplateValue::String(self.template_blog_index.clone()),
            ),
            ("interpret".to_owned(), strings(&self.interpret)),
            (
                "html_extension".to_owned(),
                TemplateValue::String(self.html_extension.clone()),
            ),
            (
                "language_modifier".to_owned(),
                object(
                    self.language_modifier
                        .iter()
                        .map(|(k, v)| (k.clone(), TemplateValue::String(v.clone()))),
                ),
            ),
            (
                "language_default".to_owned(),
                TemplateValue::String(self.language_default.clone()),
            ),
        ])
    }
}

/// Accepts `key: pattern`, `key: [a, b]`, `key: ''` or `key: null`, always
/// producing a list. Empty strings are dropped.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
        Nothing(()),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
        OneOrMany::Nothing(()) => Vec::new(),
    }
    .into_iter()
    .filter(|s| !s.is_empty())
    .collect())
}

/// The glob lists of a [`Config`], compiled once per render.
#[derive(Debug)]
pub struct Rules {
    exclude: GlobSet,
    render: GlobSet,
    blogposts: GlobSet,
    interpret: Vec<GlobSet>,
}

impl Rules {
    /// Compiles the glob lists of `config`. An invalid pattern is a
    /// [`Error::Config`].
    pub fn new(config: &Config) -> Result<Rules> {
        Ok(Rules {
            exclude: glob_set(&config.exclude)?,
            render: glob_set(&config.render)?,
            blogposts: glob_set(&config.blogposts)?,
            interpret: config
                .interpret
                .iter()
                .map(|p| glob_set(std::slice::from_ref(p)))
                .collect::<Result<_>>()?,
        })
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        self.exclude.is_match(name)
    }

    pub fn is_blog_dir(&self, name: &str) -> bool {
        self.blogposts.is_match(name)
    }

    /// Whether a subdirectory named `name` is walked. `render` and
    /// `blogposts` matches win over `exclude`.
    pub fn admits_dir(&self, name: &str) -> bool {
        !self.is_excluded(name) || self.render.is_match(name) || self.is_blog_dir(name)
    }

    /// Selects the interpreted files among `file_names`, pattern by pattern
    /// in configuration order. A name matched by several patterns is kept
    /// once, at its first match.
    pub fn interpreted<'a>(&self, file_names: &'a [String]) -> Vec<&'a String> {
        let mut matched: Vec<&String> = Vec::new();
        for pattern in &self.interpret {
            for name in file_names.iter().filter(|n| pattern.is_match(n.as_str())) {
                if !matched.contains(&name) {
                    matched.push(name);
                }
            }
        }
        matched
    }
}

fn glob_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
