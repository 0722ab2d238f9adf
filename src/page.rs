//! Defines [`Page`], the descriptor for a generated output page.

use serde_yaml::{Mapping, Value};

/// The file name given to index pages.
pub const INDEX_FILE_NAME: &str = "index.html";

/// A page to be rendered: where it goes, which layout renders it, and the
/// metadata the layout sees. Pages carry no behavior beyond their shape; the
/// site's writer turns them into files.
#[derive(Clone, Debug, PartialEq)]
pub struct Page {
    /// The output directory relative to the site root, using `/` separators.
    pub dir: String,

    /// The output file name.
    pub name: String,

    /// The name of the layout the page is rendered with.
    pub layout: String,

    /// Arbitrary metadata made available to the layout as `.page`.
    pub data: Mapping,
}

impl Page {
    pub fn new(dir: impl Into<String>, name: impl Into<String>, layout: impl Into<String>) -> Page {
        Page {
            dir: dir.into(),
            name: name.into(),
            layout: layout.into(),
            data: Mapping::new(),
        }
    }

    /// The output path relative to the site root, e.g.
    /// `category/rust/index.html`.
    pub fn output_path(&self) -> String {
        if self.dir.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", self.dir, self.name)
        }
    }

    /// Looks up a metadata value by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(&Value::from(key))
    }

    /// Looks up a string metadata value by key.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    /// Sets a metadata value, replacing any previous value for `key`.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.data.insert(Value::from(key), value.into());
    }
}
