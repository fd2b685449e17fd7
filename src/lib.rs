//! The library code for the `edward` static site generator. A render is a
//! single pass over a source tree followed by a templating step:
//!
//! 1. Walking the site ([`crate::walk`]): directories are admitted or pruned
//!    by the `exclude`/`render`/`blogposts` globs of [`crate::config`], files
//!    matched by `interpret` are split into front matter and body
//!    ([`crate::frontmatter`]) and stamped with their permalink, basepath and
//!    folder links ([`crate::path`]). Everything else is copied verbatim.
//! 2. Rendering every page ([`crate::template`]): the body (Markdown or
//!    HTML) is evaluated as a template with `.site` and `.page` bound, then
//!    wrapped in the page's named template.
//! 3. If blogging is configured, writing paginated blog index pages
//!    ([`crate::blog`]).
//!
//! [`build::render_site`] ties the steps together. Problems with single
//! files don't stop a render; they are collected in
//! [`diagnostics::Diagnostics`].

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod blog;
pub mod build;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod frontmatter;
pub mod markdown;
pub mod page;
pub mod path;
pub mod scaffold;
pub mod serve;
pub mod template;
pub mod value;
pub mod walk;

pub use build::{render_dir, render_site, RenderReport};
pub use config::Config;
pub use error::{Error, Result};
