//! Defines the [`Post`], [`Parser`], and [`Error`] types. Also defines the
//! logic for parsing posts from the file system into memory, including how a
//! post's categories are derived from its front matter.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    fs,
    path::{Path, PathBuf},
};

use chrono::NaiveDate;
use pulldown_cmark::{html, Options, Parser as MarkdownParser};
use serde::Deserialize;
use serde_yaml::Value;
use tracing::debug;
use walkdir::WalkDir;

use crate::frontmatter;

const MARKDOWN_EXTENSION: &str = "md";

/// The output directory (relative to the site root) for post pages.
pub const POSTS_OUTPUT_DIR: &str = "posts";

/// A single post, parsed and rendered to HTML.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    /// The slugified file stem, less any `YYYY-MM-DD-` prefix. Unique within
    /// a site.
    pub id: String,

    /// The title of the post.
    pub title: String,

    /// The publication date of the post.
    pub date: NaiveDate,

    /// The post's categories in the order they were declared, without
    /// duplicates.
    pub categories: Vec<String>,

    /// The post body, rendered to HTML.
    pub body: String,

    /// The file the post was read from.
    pub source_path: PathBuf,
}

impl Post {
    /// The output path relative to the site root, e.g. `posts/hello.html`.
    pub fn output_path(&self) -> String {
        format!("{}/{}.html", POSTS_OUTPUT_DIR, self.id)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Categories {
    List(Vec<String>),
    Words(String),
}

impl Default for Categories {
    fn default() -> Self {
        Categories::List(Vec::new())
    }
}

impl Categories {
    fn into_vec(self) -> Vec<String> {
        match self {
            Categories::List(v) => v,
            Categories::Words(s) => s.split_whitespace().map(str::to_owned).collect(),
        }
    }
}

#[derive(Deserialize)]
struct Frontmatter {
    /// The title of the post.
    title: String,

    /// The date of the post. Anything after the first whitespace (a time or
    /// an offset) is ignored.
    date: String,

    /// The categories of the post, either as a list or as a
    /// whitespace-separated string.
    #[serde(default)]
    categories: Categories,

    /// A single category. Merged after `categories`.
    #[serde(default)]
    category: Option<String>,
}

impl Frontmatter {
    fn categories(self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.categories
            .into_vec()
            .into_iter()
            .chain(self.category)
            .filter(|c| !c.is_empty() && seen.insert(c.clone()))
            .collect()
    }
}

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// The directory that post sources are read from.
    source_directory: &'a Path,
}

impl<'a> Parser<'a> {
    pub fn new(source_directory: &'a Path) -> Parser<'a> {
        Parser { source_directory }
    }

    /// Searches the source directory (recursively) for `.md` files and
    /// returns the parsed posts, most recent first. Posts sharing a date are
    /// ordered by ID. Each post file must be structured as follows:
    ///
    /// ```md
    /// ---
    /// title: Hello, world!
    /// date: 2021-04-16
    /// categories: [rust, tutorials]
    /// ---
    /// # Hello
    ///
    /// World
    /// ```
    pub fn parse_posts(&self) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = Vec::new();
        let mut sources: HashMap<String, PathBuf> = HashMap::new();

        let walker =
            WalkDir::new(self.source_directory).sort_by(|a, b| a.file_name().cmp(b.file_name()));
        for result in walker {
            let entry = result?;
            if !entry.file_type().is_file()
                || entry.path().extension().and_then(|e| e.to_str()) != Some(MARKDOWN_EXTENSION)
            {
                continue;
            }

            let post = self.parse_post(entry.path())?;
            if let Some(first) = sources.get(&post.id) {
                return Err(Error::DuplicateId {
                    id: post.id,
                    first: first.clone(),
                    second: post.source_path,
                });
            }
            sources.insert(post.id.clone(), post.source_path.clone());
            debug!(
                id = %post.id,
                source = %post.source_path.display(),
                categories = ?post.categories,
                "parsed post"
            );
            posts.push(post);
        }

        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.id.cmp(&b.id)));
        Ok(posts)
    }

    fn parse_post(&self, path: &Path) -> Result<Post> {
        let contents = fs::read_to_string(path)?;
        parse_post(path, &contents)
            .map_err(|e| Error::Annotated(format!("parsing post `{}`", path.display()), Box::new(e)))
    }
}

/// Parses a single [`Post`] from its source `path` and `input` text.
pub fn parse_post(path: &Path, input: &str) -> Result<Post> {
    let doc = frontmatter::split(input)?;
    let frontmatter: Frontmatter = serde_yaml::from_value(Value::Mapping(doc.data))?;

    let date_str = frontmatter.date.split_whitespace().next().unwrap_or("");
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|err| {
        Error::InvalidDate {
            value: frontmatter.date.clone(),
            err,
        }
    })?;

    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::InvalidFileName(path.to_owned()))?;
    let id = slug::slugify(strip_date_prefix(stem));
    if id.is_empty() {
        return Err(Error::InvalidFileName(path.to_owned()));
    }

    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    let mut body = String::new();
    html::push_html(&mut body, MarkdownParser::new_ext(doc.body, options));

    Ok(Post {
        id,
        title: frontmatter.title.clone(),
        date,
        categories: frontmatter.categories(),
        body,
        source_path: path.to_owned(),
    })
}

/// Strips a leading `YYYY-MM-DD-` from a file stem, if present.
fn strip_date_prefix(stem: &str) -> &str {
    match (stem.get(..10), stem.get(10..11)) {
        (Some(date), Some("-")) if NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok() => {
            &stem[11..]
        }
        _ => stem,
    }
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when the front matter fences are missing or the front matter
    /// isn't a YAML mapping.
    Frontmatter(frontmatter::Error),

    /// Returned when the front matter doesn't have the expected fields.
    DeserializeYaml(serde_yaml::Error),

    /// Returned when the `date` field isn't a `YYYY-MM-DD` date.
    InvalidDate {
        value: String,
        err: chrono::ParseError,
    },

    /// Returned when a file name can't be turned into a post ID.
    InvalidFileName(PathBuf),

    /// Returned when two source files produce the same post ID.
    DuplicateId {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// Returned for WalkDir I/O errors.
    WalkDir(walkdir::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Frontmatter(err) => err.fmt(f),
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::InvalidDate { value, err } => {
                write!(f, "invalid date `{}`: {}", value, err)
            }
            Error::InvalidFileName(path) => {
                write!(f, "invalid file name: {:?}", path)
            }
            Error::DuplicateId { id, first, second } => write!(
                f,
                "'{}' and '{}' both have the post ID `{}`",
                first.display(),
                second.display(),
                id
            ),
            Error::Io(err) => err.fmt(f),
            Error::WalkDir(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Frontmatter(err) => Some(err),
            Error::DeserializeYaml(err) => Some(err),
            Error::InvalidDate { value: _, err } => Some(err),
            Error::InvalidFileName(_) => None,
            Error::DuplicateId { .. } => None,
            Error::Io(err) => Some(err),
            Error::WalkDir(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<frontmatter::Error> for Error {
    fn from(err: frontmatter::Error) -> Error {
        Error::Frontmatter(err)
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Error {
        Error::WalkDir(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
