//! Collects the recoverable problems of a render. A [`Diagnostics`] value is
//! handed to every step that can skip an item; each entry is also emitted as
//! a `warn!` event.

use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;

/// What went wrong with an item that was skipped or demoted.
#[derive(Clone, Debug, PartialEq)]
pub enum Kind {
    /// A directory couldn't be listed or walked.
    Walk(String),

    /// A source file couldn't be read as text. An interpreted file is then
    /// treated as a plain file and copied if possible.
    Read(String),

    /// A front-matter block was neither JSON nor YAML. The file was copied
    /// instead of rendered.
    FrontMatter(String),

    /// A blog post's `date`/`time` didn't parse. The post sorts last.
    Date(String),
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Kind::Walk(msg) => write!(f, "skipping directory: {}", msg),
            Kind::Read(msg) => write!(f, "could not read: {}", msg),
            Kind::FrontMatter(msg) => write!(f, "copying without rendering: {}", msg),
            Kind::Date(msg) => write!(f, "undated blog post: {}", msg),
        }
    }
}

/// One reported problem.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    pub path: PathBuf,
    pub kind: Kind,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.kind)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Diagnostics {
        Diagnostics::default()
    }

    /// Records a problem with `path`.
    pub fn report(&mut self, path: &Path, kind: Kind) {
        let diagnostic = Diagnostic {
            path: path.to_owned(),
            kind,
        };
        warn!("{}", diagnostic);
        self.entries.push(diagnostic);
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
