//! Splits `---`-fenced YAML front matter from the document that follows it.
//! Posts must carry front matter; layouts may omit it.

use serde_yaml::Mapping;
use std::fmt;

const FENCE: &str = "---";

/// A document split into its parsed front matter and the remaining body.
#[derive(Debug)]
pub struct Document<'a> {
    /// The parsed YAML between the fences. Empty when there was no front
    /// matter (or when it was blank).
    pub data: Mapping,

    /// Everything after the closing fence.
    pub body: &'a str,
}

/// Returns the byte offsets `(yaml_start, yaml_stop, body_start)` for a
/// document that begins with a front matter fence. Fences must sit on a line
/// of their own; `---` inside a YAML value doesn't close the front matter.
fn indices(input: &str) -> Result<(usize, usize, usize)> {
    let mut lines = input.split_inclusive('\n');
    let first = lines
        .next()
        .filter(|line| is_fence(line))
        .ok_or(Error::MissingStartFence)?;

    let mut offset = first.len();
    for line in lines {
        if is_fence(line) {
            return Ok((first.len(), offset, offset + line.len()));
        }
        offset += line.len();
    }
    Err(Error::MissingEndFence)
}

fn is_fence(line: &str) -> bool {
    line.trim_end_matches(&['\r', '\n'][..]) == FENCE
}

fn parse_mapping(yaml: &str) -> Result<Mapping> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    Ok(serde_yaml::from_str(yaml)?)
}

/// Parses a document which must start with front matter.
pub fn split(input: &str) -> Result<Document> {
    let (yaml_start, yaml_stop, body_start) = indices(input)?;
    Ok(Document {
        data: parse_mapping(&input[yaml_start..yaml_stop])?,
        body: &input[body_start..],
    })
}

/// Parses a document whose front matter is optional. Documents that don't
/// begin with a `---` line are returned whole with empty data.
pub fn split_optional(input: &str) -> Result<Document> {
    if input.lines().next().map_or(false, is_fence) {
        split(input)
    } else {
        Ok(Document {
            data: Mapping::new(),
            body: input,
        })
    }
}

/// The result of a front matter operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error splitting or parsing front matter.
#[derive(Debug)]
pub enum Error {
    /// Returned when a document is missing its starting fence (`---`).
    MissingStartFence,

    /// Returned when the starting fence was found but the closing one was
    /// missing.
    MissingEndFence,

    /// Returned when the front matter isn't a valid YAML mapping.
    DeserializeYaml(serde_yaml::Error),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::MissingStartFence => write!(f, "Document must begin with `---`"),
            Error::MissingEndFence => write!(f, "Missing closing `---`"),
            Error::DeserializeYaml(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MissingStartFence => None,
            Error::MissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_yaml::Value;

    #[test]
    fn test_split() -> Result<()> {
        let doc = split("---\ntitle: Hello\n---\n# Body\n")?;
        assert_eq!(
            doc.data.get(&Value::from("title")),
            Some(&Value::from("Hello"))
        );
        assert_eq!(doc.body, "# Body\n");
        Ok(())
    }

    #[test]
    fn test_split_ignores_dashes_inside_values() -> Result<()> {
        let doc = split("---\ntitle: Before --- after\n---\r\nBody\n---\nmore\n")?;
        assert_eq!(
            doc.data.get(&Value::from("title")),
            Some(&Value::from("Before --- after"))
        );
        assert_eq!(doc.body, "Body\n---\nmore\n");
        Ok(())
    }

    #[test]
    fn test_split_missing_fences() {
        assert!(matches!(split("title: x\n"), Err(Error::MissingStartFence)));
        assert!(matches!(
            split("---\ntitle: x\n"),
            Err(Error::MissingEndFence)
        ));
        assert!(matches!(
            split("----\ntitle: x\n---\n"),
            Err(Error::MissingStartFence)
        ));
    }

    #[test]
    fn test_split_optional_without_front_matter() -> Result<()> {
        let doc = split_optional("<html>{{ .page.category }}</html>")?;
        assert!(doc.data.is_empty());
        assert_eq!(doc.body, "<html>{{ .page.category }}</html>");
        Ok(())
    }

    #[test]
    fn test_split_empty_front_matter() -> Result<()> {
        let doc = split("---\n---\nbody")?;
        assert!(doc.data.is_empty());
        assert_eq!(doc.body, "body");
        Ok(())
    }
}
