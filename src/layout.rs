//! Named layouts. A layout lives at `{layouts_directory}/{name}.html` and
//! consists of optional front matter, whose keys become default metadata for
//! pages using the layout, followed by a [`gtmpl`] template. A `layout` key
//! in the front matter names a parent layout that wraps this one's output.

use gtmpl::Template;
use serde_yaml::Mapping;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::frontmatter;

const LAYOUT_EXTENSION: &str = "html";

/// The front matter key naming a layout's parent.
pub const PARENT_KEY: &str = "layout";

/// A parsed layout.
pub struct Layout {
    /// The layout's name, i.e. its file stem.
    pub name: String,

    /// Default metadata for pages rendered with this layout.
    pub data: Mapping,

    /// The template that pages are rendered through.
    pub template: Template,
}

impl Layout {
    /// Parses a layout from its name and source text.
    pub fn parse(name: &str, input: &str) -> Result<Layout> {
        let doc = frontmatter::split_optional(input)?;
        let mut template = Template::default();
        template.parse(doc.body).map_err(Error::ParseTemplate)?;
        Ok(Layout {
            name: name.to_owned(),
            data: doc.data,
            template,
        })
    }

    /// The name of the layout this one is wrapped in, if any.
    pub fn parent(&self) -> Option<&str> {
        self.data
            .get(&serde_yaml::Value::from(PARENT_KEY))
            .and_then(|v| v.as_str())
    }
}

/// Loads every `.html` file directly under `dir` as a layout, keyed by name.
pub fn load_layouts(dir: &Path) -> Result<HashMap<String, Layout>> {
    let mut layouts = HashMap::new();
    let entries = fs::read_dir(dir).map_err(|err| Error::ReadDirectory {
        path: dir.to_owned(),
        err,
    })?;

    for result in entries {
        let path = result?.path();
        if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(LAYOUT_EXTENSION) {
            continue;
        }
        let name = match path.file_stem().and_then(|s| s.to_str()) {
            Some(name) => name.to_owned(),
            None => continue,
        };

        let contents = fs::read_to_string(&path)?;
        let layout = Layout::parse(&name, &contents)
            .map_err(|e| Error::Annotated(format!("loading layout `{}`", path.display()), Box::new(e)))?;
        debug!(layout = %name, "loaded layout");
        layouts.insert(name, layout);
    }

    Ok(layouts)
}

/// The result of a layout operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading a [`Layout`].
#[derive(Debug)]
pub enum Error {
    /// Returned when the layouts directory can't be read.
    ReadDirectory { path: PathBuf, err: std::io::Error },

    /// Returned when the layout's front matter is malformed.
    Frontmatter(frontmatter::Error),

    /// Returned when the layout body isn't a valid template.
    ParseTemplate(String),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ReadDirectory { path, err } => {
                write!(f, "Reading layouts directory '{}': {}", path.display(), err)
            }
            Error::Frontmatter(err) => err.fmt(f),
            Error::ParseTemplate(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::ReadDirectory { path: _, err } => Some(err),
            Error::Frontmatter(err) => Some(err),
            Error::ParseTemplate(_) => None,
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<frontmatter::Error> for Error {
    fn from(err: frontmatter::Error) -> Error {
        Error::Frontmatter(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
