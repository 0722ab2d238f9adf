//! Loads the project file, `catindex.yaml`, and resolves the paths it names.

use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use url::Url;

/// The name of the project file.
pub const PROJECT_FILE: &str = "catindex.yaml";

fn default_posts_directory() -> PathBuf {
    PathBuf::from("posts")
}

fn default_layouts_directory() -> PathBuf {
    PathBuf::from("_layouts")
}

#[derive(Deserialize)]
struct Project {
    pub site_root: Url,

    #[serde(default)]
    pub title: String,

    #[serde(default = "default_posts_directory")]
    pub posts_directory: PathBuf,

    #[serde(default = "default_layouts_directory")]
    pub layouts_directory: PathBuf,
}

/// Resolved build configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// The site title.
    pub title: String,

    /// The root URL of the site, always with a trailing slash.
    pub site_root: Url,

    /// The directory containing the `catindex.yaml` file.
    pub project_root: PathBuf,

    /// The directory posts are read from.
    pub posts_source_directory: PathBuf,

    /// The directory layouts are read from.
    pub layouts_directory: PathBuf,

    /// The directory the site is written to.
    pub output_directory: PathBuf,
}

impl Config {
    /// Searches `dir` and then each of its ancestors for `catindex.yaml` and
    /// loads the first one found.
    pub fn from_directory(dir: &Path, output_directory: &Path) -> Result<Config> {
        let path = dir.join(PROJECT_FILE);
        if path.exists() {
            Config::from_project_file(&path, output_directory)
        } else {
            match dir.parent() {
                Some(parent) => Config::from_directory(parent, output_directory),
                None => Err(Error::NotFound),
            }
        }
    }

    /// Loads the project file at `path`. Relative directories in the file
    /// are resolved against the file's directory. A relative
    /// `output_directory` is kept as given.
    pub fn from_project_file(path: &Path, output_directory: &Path) -> Result<Config> {
        let file = File::open(path).map_err(|err| Error::Open {
            path: path.to_owned(),
            err,
        })?;
        let project: Project = serde_yaml::from_reader(file).map_err(|err| Error::Parse {
            path: path.to_owned(),
            err,
        })?;
        let project_root = path
            .parent()
            .ok_or_else(|| Error::NoParent(path.to_owned()))?
            .to_owned();

        let mut site_root = project.site_root;
        if !site_root.path().ends_with('/') {
            let with_slash = format!("{}/", site_root.path());
            site_root.set_path(&with_slash);
        }

        Ok(Config {
            title: project.title,
            site_root,
            posts_source_directory: project_root.join(project.posts_directory),
            layouts_directory: project_root.join(project.layouts_directory),
            output_directory: output_directory.to_owned(),
            project_root,
        })
    }
}

/// The result of loading configuration.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error loading the project file.
#[derive(Debug)]
pub enum Error {
    /// Returned when no project file exists in the directory or any
    /// ancestor.
    NotFound,

    /// Returned when the project file can't be opened.
    Open { path: PathBuf, err: std::io::Error },

    /// Returned when the project file isn't valid.
    Parse {
        path: PathBuf,
        err: serde_yaml::Error,
    },

    /// Returned when the project file path has no parent directory.
    NoParent(PathBuf),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::NotFound => write!(
                f,
                "Could not find `{}` in any parent directory",
                PROJECT_FILE
            ),
            Error::Open { path, err } => {
                write!(f, "Opening project file '{}': {}", path.display(), err)
            }
            Error::Parse { path, err } => {
                write!(f, "Loading configuration '{}': {}", path.display(), err)
            }
            Error::NoParent(path) => write!(
                f,
                "Can't get parent directory for project file '{}'",
                path.display()
            ),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::NotFound => None,
            Error::Open { path: _, err } => Some(err),
            Error::Parse { path: _, err } => Some(err),
            Error::NoParent(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_from_directory_searches_ancestors() -> std::io::Result<()> {
        let root = tempfile::tempdir()?;
        fs::write(
            root.path().join(PROJECT_FILE),
            "site_root: https://example.com/blog\ntitle: Notes\n",
        )?;
        let nested = root.path().join("posts").join("drafts");
        fs::create_dir_all(&nested)?;

        let config = Config::from_directory(&nested, Path::new("public")).unwrap();
        assert_eq!(
            config,
            Config {
                title: "Notes".to_owned(),
                site_root: Url::parse("https://example.com/blog/").unwrap(),
                project_root: root.path().to_owned(),
                posts_source_directory: root.path().join("posts"),
                layouts_directory: root.path().join("_layouts"),
                output_directory: PathBuf::from("public"),
            }
        );
        Ok(())
    }

    #[test]
    fn test_custom_directories() -> std::io::Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join(PROJECT_FILE);
        fs::write(
            &path,
            "site_root: https://example.com/\nposts_directory: content\nlayouts_directory: theme\n",
        )?;

        let config = Config::from_project_file(&path, Path::new("out")).unwrap();
        assert_eq!(config.posts_source_directory, root.path().join("content"));
        assert_eq!(config.layouts_directory, root.path().join("theme"));
        assert_eq!(config.site_root.as_str(), "https://example.com/");
        assert_eq!(config.title, "");
        Ok(())
    }

    #[test]
    fn test_invalid_project_file() -> std::io::Result<()> {
        let root = tempfile::tempdir()?;
        let path = root.path().join(PROJECT_FILE);
        fs::write(&path, "title: missing site root\n")?;

        let result = Config::from_project_file(&path, Path::new("out"));
        assert!(matches!(result, Err(Error::Parse { .. })));
        Ok(())
    }
}
