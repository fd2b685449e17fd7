//! Defines the crate-level [`Error`] type. Recoverable problems (unreadable
//! files, malformed front matter) never show up here; they are recorded in
//! [`crate::diagnostics::Diagnostics`] instead. Everything in [`Error`]
//! aborts the render.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The result of a fallible render operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a fatal error while loading, walking, or rendering a site.
#[derive(Debug)]
pub enum Error {
    /// Returned when the configuration is unusable: no output path, a
    /// missing or malformed `site.yaml`, or an invalid glob pattern.
    Config(String),

    /// Returned when a page names a template that isn't in the registry (or
    /// names no template at all).
    UnknownTemplate {
        /// The file that requested the template: a page's source file, or
        /// `site.yaml` for the blog index template.
        page: PathBuf,

        /// The requested template name (empty if none was given).
        template: String,
    },

    /// Returned when a template fails to parse or execute.
    Template {
        /// The file being rendered (page source or template file).
        path: PathBuf,

        /// The template engine's message.
        message: String,
    },

    /// Returned when a page's front matter can't be read back at render
    /// time (the file changed or vanished since the walk).
    FrontMatter { path: PathBuf, message: String },

    /// Returned when a page's explicit permalink is empty or leaves the
    /// output directory.
    InvalidPermalink { page: PathBuf, permalink: String },

    /// Returned when two outputs resolve to the same permalink. A blog index
    /// page is named by the `site.yaml` it is configured in.
    PermalinkCollision {
        permalink: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned for I/O problems on a known path.
    Io { path: PathBuf, err: io::Error },
}

impl Error {
    /// Wraps an [`io::Error`] with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, err: io::Error) -> Error {
        Error::Io {
            path: path.into(),
            err,
        }
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Config(msg) => write!(f, "configuration error: {}", msg),
            Error::UnknownTemplate { page, template } if template.is_empty() => {
                write!(f, "'{}' does not name a template", page.display())
            }
            Error::UnknownTemplate { page, template } => write!(
                f,
                "'{}' requests unknown template '{}'",
                page.display(),
                template
            ),
            Error::Template { path, message } => {
                write!(f, "templating '{}': {}", path.display(), message)
            }
            Error::FrontMatter { path, message } => {
                write!(f, "re-reading '{}': {}", path.display(), message)
            }
            Error::InvalidPermalink { page, permalink } => write!(
                f,
                "page '{}' has unusable permalink '{}'",
                page.display(),
                permalink
            ),
            Error::PermalinkCollision {
                permalink,
                first,
                second,
            } => write!(
                f,
                "permalink '{}' is claimed by both '{}' and '{}'",
                permalink,
                first.display(),
                second.display()
            ),
            Error::Io { path, err } => write!(f, "'{}': {}", path.display(), err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io { path: _, err } => Some(err),
            _ => None,
        }
    }
}

impl From<globset::Error> for Error {
    /// Converts an invalid glob pattern into a configuration [`Error`].
    fn from(err: globset::Error) -> Error {
        Error::Config(err.to_string())
    }
}
