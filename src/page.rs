//! Defines [`Page`], a content file's metadata stamped with the fields the
//! pipeline derives for it.

use crate::frontmatter::FileType;
use crate::value::{object, Metadata, Value};
use gtmpl_value::Value as TemplateValue;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Well-known front-matter keys.
pub const TEMPLATE: &str = "template";
pub const PERMALINK: &str = "permalink";
pub const DATE: &str = "date";
pub const TIME: &str = "time";
pub const SUMMARY: &str = "summary";

/// A page to be rendered. Created once during the walk and not modified
/// afterwards; the body is not kept and is re-read at render time.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// The source file.
    pub filepath: PathBuf,

    /// Decides whether the body is rendered as Markdown.
    pub filetype: FileType,

    /// The output path relative to the output root, and the page's key.
    pub permalink: String,

    /// `../` once per path separator in the permalink.
    pub basepath: String,

    /// Root folder name to a basepath-relative link.
    pub folders: BTreeMap<String, String>,

    /// Everything the author wrote in the front matter, plus blog defaults.
    pub metadata: Metadata,
}

impl Page {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// The name of the template this page is rendered with.
    pub fn template(&self) -> Option<&str> {
        self.get(TEMPLATE).and_then(Value::as_str)
    }

    pub fn date(&self) -> Option<String> {
        self.get(DATE).and_then(Value::to_plain_string)
    }

    pub fn time(&self) -> Option<String> {
        self.get(TIME).and_then(Value::to_plain_string)
    }

    /// Converts the page into the `.page` template value: the author's
    /// metadata with the derived fields laid over it.
    pub fn to_value(&self) -> TemplateValue {
        let mut fields: Vec<(String, TemplateValue)> = self
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), v.into()))
            .collect();
        fields.push((
            "filepath".to_owned(),
            TemplateValue::String(self.filepath.display().to_string()),
        ));
        fields.push((
            "filetype".to_owned(),
            TemplateValue::String(self.filetype.as_str().to_owned()),
        ));
        fields.extend(link_fields(&self.permalink, &self.basepath, &self.folders));
        object(fields)
    }
}

/// The `permalink`, `basepath` and `folders` template fields. Shared with
/// blog index pages.
pub fn link_fields(
    permalink: &str,
    basepath: &str,
    folders: &BTreeMap<String, String>,
) -> Vec<(String, TemplateValue)> {
    vec![
        (
            PERMALINK.to_owned(),
            TemplateValue::String(permalink.to_owned()),
        ),
        (
            "basepath".to_owned(),
            TemplateValue::String(basepath.to_owned()),
        ),
        (
            "folders".to_owned(),
            object(
                folders
                    .iter()
                    .map(|(k, v)| (k.clone(), TemplateValue::String(v.clone()))),
            ),
        ),
    ]
}
