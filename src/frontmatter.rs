//! Splits content files into a metadata block and a body, and classifies
//! files by extension ([`FileType`]).
//!
//! A metadata block is fenced by two lines consisting of `---`; the opening
//! fence must be the first non-blank line of the file. The block is decoded
//! as JSON first and as YAML second. Everything after the closing fence is
//! the body, byte-for-byte.

use crate::value::Metadata;
use std::fmt;
use std::io;
use std::path::Path;

const FENCE: &str = "---";

/// The kind of a content file, decided by extension alone. It only decides
/// how the body is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileType {
    Markdown,
    Html,
    Yaml,
    Json,
    Unknown,
}

impl FileType {
    /// Classifies `path` by its (case-insensitive) extension.
    pub fn of(path: &Path) -> FileType {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => ext.to_ascii_lowercase(),
            None => return FileType::Unknown,
        };
        match ext.as_str() {
            "md" => FileType::Markdown,
            "htm" | "html" => FileType::Html,
            "yaml" => FileType::Yaml,
            "json" => FileType::Json,
            _ => FileType::Unknown,
        }
    }

    /// The name templates see as `.page.filetype`.
    pub fn as_str(self) -> &'static str {
        match self {
            FileType::Markdown => "markdown",
            FileType::Html => "html",
            FileType::Yaml => "yaml",
            FileType::Json => "json",
            FileType::Unknown => "",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A content file split into decoded metadata and its raw body.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub metadata: Metadata,
    pub body: String,
}

/// Reads `path` and splits it. Returns `Ok(None)` when the file has no
/// front-matter block.
pub fn parse_file(path: &Path) -> Result<Option<Document>> {
    let contents = std::fs::read_to_string(path).map_err(Error::Read)?;
    Ok(parse_str(&contents)?.map(|(metadata, body)| Document {
        metadata,
        body: body.to_owned(),
    }))
}

/// Splits and decodes `input`. Returns `Ok(None)` when there is no
/// front-matter block.
pub fn parse_str(input: &str) -> Result<Option<(Metadata, &str)>> {
    match split(input) {
        None => Ok(None),
        Some((block, body)) => Ok(Some((decode(block)?, body))),
    }
}

/// Finds the fenced metadata block. Returns `(block, body)`.
pub fn split(input: &str) -> Option<(&str, &str)> {
    let input = input.strip_prefix('\u{feff}').unwrap_or(input);
    let mut block_start: Option<usize> = None;
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        let next = offset + line.len();
        let is_fence = line.trim() == FENCE;
        match block_start {
            None if is_fence => block_start = Some(next),
            None if line.trim().is_empty() => {}
            None => return None,
            Some(start) if is_fence => return Some((&input[start..offset], &input[next..])),
            Some(_) => {}
        }
        offset = next;
    }
    None
}

/// Decodes a metadata block: strict JSON first, then YAML. An empty block is
/// empty metadata.
pub fn decode(block: &str) -> Result<Metadata> {
    let json = match serde_json::from_str::<Metadata>(block) {
        Ok(metadata) => return Ok(metadata),
        Err(err) => err,
    };
    let yaml = match serde_yaml::from_str::<serde_yaml::Value>(block) {
        Ok(serde_yaml::Value::Null) => return Ok(Metadata::new()),
        Ok(value) => serde_yaml::from_value::<Metadata>(value),
        Err(_) if block.trim().is_empty() => return Ok(Metadata::new()),
        Err(err) => Err(err),
    };
    yaml.map_err(|yaml| Error::Malformed { json, yaml })
}

/// The result of a front-matter operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure to read or decode front matter. Both are recovered
/// by the walker, which demotes the file to a passthrough copy.
#[derive(Debug)]
pub enum Error {
    /// Returned when the file can't be read as UTF-8 text.
    Read(io::Error),

    /// Returned when the block is neither JSON nor YAML metadata.
    Malformed {
        json: serde_json::Error,
        yaml: serde_yaml::Error,
    },
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Read(err) => write!(f, "reading file: {}", err),
            Error::Malformed { json, yaml } => write!(
                f,
                "front matter is neither JSON ({}) nor YAML ({})",
                json, yaml
            ),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Read(err) => Some(err),
            Error::Malformed { json: _, yaml } => Some(yaml),
        }
    }
}
