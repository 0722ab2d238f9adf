//! Renders posts and generated pages through their layouts and writes the
//! results beneath the output directory. A layout with a parent is rendered
//! first and its output handed to the parent as `.content`, repeating up the
//! chain.

use gtmpl::Context;
use gtmpl_value::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::generator::CATEGORY_KEY;
use crate::layout::Layout;
use crate::page::Page;
use crate::site::Site;
use crate::value;

/// The layout every post page is rendered with.
pub const POST_LAYOUT: &str = "post";

/// The context key a parent layout receives its child's output under.
pub const CONTENT_KEY: &str = "content";

/// Responsible for templating and writing HTML pages to disk.
pub struct Writer<'a> {
    /// The directory in which output files are written. Page and post output
    /// paths are relative to this directory.
    pub output_directory: &'a Path,
}

impl Writer<'_> {
    /// Renders every post and every page on `site`, returning the number of
    /// files written.
    pub fn write_site(&self, site: &Site) -> Result<usize> {
        let site_value = value::site(site);
        let mut seen_dirs: HashSet<PathBuf> = HashSet::new();
        let mut written = 0;

        if !site.posts.is_empty() {
            let layout = layout(site, POST_LAYOUT)?;
            for post in &site.posts {
                let mut context = base_context(&site_value);
                context.insert("post".to_owned(), value::post(site, post));
                self.write_file(&mut seen_dirs, site, layout, context, &post.output_path())?;
                written += 1;
            }
        }

        for page in &site.pages {
            self.write_page(&mut seen_dirs, site, &site_value, page)?;
            written += 1;
        }

        Ok(written)
    }

    fn write_page(
        &self,
        seen_dirs: &mut HashSet<PathBuf>,
        site: &Site,
        site_value: &Value,
        page: &Page,
    ) -> Result<()> {
        let layout = layout(site, &page.layout)?;
        let mut context = base_context(site_value);
        context.insert("page".to_owned(), value::page(site, page));
        if let Some(category) = page.get_str(CATEGORY_KEY) {
            context.insert(
                "posts".to_owned(),
                Value::Array(
                    site.category_posts(category)
                        .into_iter()
                        .map(|p| value::post(site, p))
                        .collect(),
                ),
            );
        }
        self.write_file(seen_dirs, site, layout, context, &page.output_path())
    }

    /// Executes `layout` and each of its parents against `context` and
    /// writes the result to `relative_path` beneath the output directory.
    fn write_file(
        &self,
        seen_dirs: &mut HashSet<PathBuf>,
        site: &Site,
        layout: &Layout,
        context: HashMap<String, Value>,
        relative_path: &str,
    ) -> Result<()> {
        let file_path = self.output_directory.join(relative_path);
        if let Some(dir) = file_path.parent() {
            if seen_dirs.insert(dir.to_owned()) {
                std::fs::create_dir_all(dir)?;
            }
        }

        let rendered = render_chain(site, layout, context).map_err(|err| {
            Error::Annotated(format!("rendering `{}`", relative_path), Box::new(err))
        })?;
        std::fs::write(&file_path, rendered)?;
        debug!(path = %file_path.display(), layout = %layout.name, "wrote page");
        Ok(())
    }
}

/// Renders `layout`, then wraps the output in each parent layout in turn.
/// Every layout in the chain sees the same context; parents also get the
/// output so far as `.content`.
fn render_chain(
    site: &Site,
    layout: &Layout,
    context: HashMap<String, Value>,
) -> Result<String> {
    let parents = parents(site, layout)?;
    let mut rendered = render(layout, context.clone())?;
    for parent in parents {
        let mut parent_context = context.clone();
        parent_context.insert(CONTENT_KEY.to_owned(), Value::String(rendered));
        rendered = render(parent, parent_context)?;
    }
    Ok(rendered)
}

/// Resolves the parents of `layout`, innermost first.
fn parents<'s>(site: &'s Site, layout: &Layout) -> Result<Vec<&'s Layout>> {
    let mut chain = vec![layout.name.clone()];
    let mut parents = Vec::new();
    let mut next = layout.parent().map(str::to_owned);
    while let Some(name) = next {
        let repeated = chain.contains(&name);
        chain.push(name.clone());
        if repeated {
            return Err(Error::LayoutCycle(chain));
        }
        let parent = self::layout(site, &name)?;
        next = parent.parent().map(str::to_owned);
        parents.push(parent);
    }
    Ok(parents)
}

fn render(layout: &Layout, context: HashMap<String, Value>) -> Result<String> {
    let context = Context::from(Value::Object(context))?;
    let mut rendered: Vec<u8> = Vec::new();
    layout.template.execute(&mut rendered, &context)?;
    Ok(String::from_utf8_lossy(&rendered).into_owned())
}

fn layout<'s>(site: &'s Site, name: &str) -> Result<&'s Layout> {
    site.layout(name).ok_or_else(|| Error::LayoutNotFound(name.to_owned()))
}

fn base_context(site_value: &Value) -> HashMap<String, Value> {
    let mut m = HashMap::new();
    m.insert("site".to_owned(), site_value.clone());
    m
}

/// The result of a fallible page-writing operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// Returned when a page names a layout the site doesn't have.
    LayoutNotFound(String),

    /// Returned when a layout's chain of parents leads back to itself. Holds
    /// the chain, ending with the repeated name.
    LayoutCycle(Vec<String>),

    /// An error during templating.
    Template(String),

    /// An error writing the output files.
    Io(io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LayoutNotFound(name) => write!(f, "layout `{}` not found", name),
            Error::LayoutCycle(chain) => {
                write!(f, "layouts wrap each other: {}", chain.join(" -> "))
            }
            Error::Template(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => write!(f, "{}: {}", annotation, err),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LayoutNotFound(_) => None,
            Error::LayoutCycle(_) => None,
            Error::Template(_) => None,
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::generator::category_pages;
    use crate::site::test::{post, site};
    use std::fs;

    fn with_layouts(mut s: Site) -> Site {
        s.layouts.insert(
            POST_LAYOUT.to_owned(),
            Layout::parse(POST_LAYOUT, "<h1>{{ .post.title }}</h1>").unwrap(),
        );
        s.layouts.insert(
            "posts".to_owned(),
            Layout::parse(
                "posts",
                "<h1>{{ .page.category }}</h1>{{ range .posts }}<li>{{ .title }}</li>{{ end }}",
            )
            .unwrap(),
        );
        s
    }

    #[test]
    fn test_write_site() -> Result<()> {
        let mut s = with_layouts(site(vec![
            post("b", (2021, 2, 1), &["go"]),
            post("a", (2021, 1, 1), &["go", "rust"]),
        ]));
        let pages = category_pages(&s).map_err(|e| Error::Template(e.to_string()))?;
        s.pages.extend(pages);

        let out = tempfile::tempdir()?;
        let written = Writer {
            output_directory: out.path(),
        }
        .write_site(&s)?;
        assert_eq!(written, 4);

        let go = fs::read_to_string(out.path().join("category/go/index.html"))?;
        assert_eq!(go, "<h1>go</h1><li>Title of b</li><li>Title of a</li>");
        let rust = fs::read_to_string(out.path().join("category/rust/index.html"))?;
        assert_eq!(rust, "<h1>rust</h1><li>Title of a</li>");
        let a = fs::read_to_string(out.path().join("posts/a.html"))?;
        assert_eq!(a, "<h1>Title of a</h1>");
        Ok(())
    }

    fn write_single_page(s: &mut Site, layout: &str) -> Result<tempfile::TempDir> {
        s.pages.push(Page::new("", "about.html", layout));
        let out = tempfile::tempdir()?;
        Writer {
            output_directory: out.path(),
        }
        .write_site(s)?;
        Ok(out)
    }

    fn add_layout(s: &mut Site, name: &str, source: &str) {
        s.layouts
            .insert(name.to_owned(), Layout::parse(name, source).unwrap());
    }

    #[test]
    fn test_category_page_wrapped_in_parent_layouts() -> Result<()> {
        let mut s = with_layouts(site(vec![post("a", (2021, 1, 1), &["go"])]));
        add_layout(
            &mut s,
            "posts",
            "---\nlayout: default\n---\n<h1>{{ .page.category }}</h1>",
        );
        add_layout(
            &mut s,
            "default",
            "---\nlayout: base\n---\n<main>{{ .content }}</main>",
        );
        add_layout(&mut s, "base", "<title>{{ .site.title }}</title>{{ .content }}");
        let pages = category_pages(&s).map_err(|e| Error::Template(e.to_string()))?;
        s.pages.extend(pages);

        let out = tempfile::tempdir()?;
        Writer {
            output_directory: out.path(),
        }
        .write_site(&s)?;

        let go = fs::read_to_string(out.path().join("category/go/index.html"))?;
        assert_eq!(go, "<title>Test</title><main><h1>go</h1></main>");
        let a = fs::read_to_string(out.path().join("posts/a.html"))?;
        assert_eq!(a, "<h1>Title of a</h1>");
        Ok(())
    }

    #[test]
    fn test_layout_cycle() {
        let mut s = site(Vec::new());
        add_layout(&mut s, "a", "---\nlayout: b\n---\nA");
        add_layout(&mut s, "b", "---\nlayout: a\n---\nB");

        match write_single_page(&mut s, "a") {
            Err(Error::Annotated(_, err)) => match *err {
                Error::LayoutCycle(chain) => assert_eq!(chain, vec!["a", "b", "a"]),
                other => panic!("expected a layout cycle, got {}", other),
            },
            other => panic!("expected a layout cycle, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_parent_layout() {
        let mut s = site(Vec::new());
        add_layout(&mut s, "about", "---\nlayout: default\n---\nAbout");

        match write_single_page(&mut s, "about") {
            Err(Error::Annotated(_, err)) => {
                assert!(matches!(*err, Error::LayoutNotFound(name) if name == "default"))
            }
            other => panic!("expected a missing layout, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_missing_page_layout() -> Result<()> {
        let mut s = site(Vec::new());
        s.pages.push(Page::new("", "about.html", "about"));
        let out = tempfile::tempdir()?;
        let result = Writer {
            output_directory: out.path(),
        }
        .write_site(&s);
        assert!(matches!(result, Err(Error::LayoutNotFound(name)) if name == "about"));
        Ok(())
    }
}
