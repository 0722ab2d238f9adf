//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output site: parsing the posts ([`crate::post`]),
//! loading layouts ([`crate::layout`]), running generators
//! ([`crate::generator`]), and rendering everything to disk
//! ([`crate::write`]).

use crate::config::Config;
use crate::generator::{Error as GenerateError, Generators};
use crate::layout::{load_layouts, Error as LayoutError};
use crate::post::{Error as ParseError, Parser as PostParser};
use crate::site::Site;
use crate::write::{Error as WriteError, Writer};
use std::fmt;
use tracing::info;

/// What a build produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub posts: usize,
    pub categories: usize,
    pub pages: usize,
    pub files: usize,
}

/// Reads the posts and layouts named by `config` into a [`Site`]. No
/// generators have run on the returned site.
pub fn load_site(config: &Config) -> Result<Site> {
    let posts = PostParser::new(&config.posts_source_directory).parse_posts()?;
    info!(
        count = posts.len(),
        directory = %config.posts_source_directory.display(),
        "parsed posts"
    );

    let layouts = load_layouts(&config.layouts_directory)?;
    info!(count = layouts.len(), "loaded layouts");

    Ok(Site::new(
        config.title.clone(),
        config.site_root.clone(),
        posts,
        layouts,
    ))
}

/// Builds the site from a [`Config`] object: loads the site, runs
/// `generators` once, then renders every post and page into the output
/// directory.
pub fn build_site(config: &Config, generators: &Generators) -> Result<Summary> {
    let mut site = load_site(config)?;
    generators.run(&mut site)?;

    let files = Writer {
        output_directory: &config.output_directory,
    }
    .write_site(&site)?;

    let summary = Summary {
        posts: site.posts.len(),
        categories: site.category_names().count(),
        pages: site.pages.len(),
        files,
    };
    info!(
        files = summary.files,
        output = %config.output_directory.display(),
        "built site"
    );
    Ok(summary)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors parsing posts.
    Parse(ParseError),

    /// Returned for errors loading layouts.
    Layout(LayoutError),

    /// Returned for errors raised by generators.
    Generate(GenerateError),

    /// Returned for errors writing pages to disk.
    Write(WriteError),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Parse(err) => err.fmt(f),
            Error::Layout(err) => err.fmt(f),
            Error::Generate(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(err) => Some(err),
            Error::Layout(err) => Some(err),
            Error::Generate(err) => Some(err),
            Error::Write(err) => Some(err),
        }
    }
}

impl From<ParseError> for Error {
    /// Converts [`ParseError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: ParseError) -> Error {
        Error::Parse(err)
    }
}

impl From<LayoutError> for Error {
    fn from(err: LayoutError) -> Error {
        Error::Layout(err)
    }
}

impl From<GenerateError> for Error {
    fn from(err: GenerateError) -> Error {
        Error::Generate(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}
