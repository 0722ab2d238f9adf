//! Generators run once per build, after posts and layouts are loaded and
//! before anything is rendered. They read the [`Site`] and append [`Page`]s
//! to it.
//!
//! The one generator shipped here builds category indices: for every
//! category on the site it adds a page at `category/{name}/index.html`,
//! rendered with the shared [`CATEGORY_LAYOUT`], whose metadata binds
//! `category` to the category name.

use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::page::{Page, INDEX_FILE_NAME};
use crate::site::Site;

/// The directory (relative to the site root) that category indices live
/// under.
pub const CATEGORY_DIR: &str = "category";

/// The layout every category index is rendered with.
pub const CATEGORY_LAYOUT: &str = "posts";

/// The metadata key bound to the category name.
pub const CATEGORY_KEY: &str = "category";

/// An extension point invoked once per build with the whole site.
pub trait Generator {
    /// A short name used in logs.
    fn name(&self) -> &str;

    /// Reads `site` and appends any generated pages to `site.pages`.
    fn generate(&self, site: &mut Site) -> Result<()>;
}

/// An explicit, ordered list of generators.
pub struct Generators(Vec<Box<dyn Generator>>);

impl Generators {
    /// An empty registry.
    pub fn empty() -> Generators {
        Generators(Vec::new())
    }

    /// Registers a generator. Generators run in registration order.
    pub fn register(mut self, generator: impl Generator + 'static) -> Generators {
        self.0.push(Box::new(generator));
        self
    }

    /// The names of the registered generators, in order.
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|g| g.name()).collect()
    }

    /// Runs every generator against `site`, stopping at the first error.
    /// Generators may add or remove pages.
    pub fn run(&self, site: &mut Site) -> Result<()> {
        for generator in &self.0 {
            let before = site.pages.len();
            generator.generate(site)?;
            info!(
                generator = generator.name(),
                before,
                after = site.pages.len(),
                "ran generator"
            );
        }
        Ok(())
    }
}

impl Default for Generators {
    /// The default registry, containing only [`CategoryPageGenerator`].
    fn default() -> Generators {
        Generators::empty().register(CategoryPageGenerator)
    }
}

/// Adds one index page per category to the site.
pub struct CategoryPageGenerator;

impl Generator for CategoryPageGenerator {
    fn name(&self) -> &str {
        "categories"
    }

    fn generate(&self, site: &mut Site) -> Result<()> {
        for issue in category_issues(site) {
            warn!("{}", issue);
        }
        let pages = category_pages(site)?;
        site.pages.extend(pages);
        Ok(())
    }
}

/// Builds the index page for a single category. The page starts from the
/// layout's front matter defaults, then binds `category`.
pub fn category_page(site: &Site, category: &str) -> Result<Page> {
    let layout = site
        .layout(CATEGORY_LAYOUT)
        .ok_or_else(|| Error::LayoutNotFound(CATEGORY_LAYOUT.to_owned()))?;

    let mut page = Page::new(
        format!("{}/{}", CATEGORY_DIR, category),
        INDEX_FILE_NAME,
        CATEGORY_LAYOUT,
    );
    page.data = layout.data.clone();
    page.set(CATEGORY_KEY, category);
    debug!(category, path = %page.output_path(), "built category page");
    Ok(page)
}

/// Builds one index page per category, in the site's category order. Sites
/// without categories yield no pages.
pub fn category_pages(site: &Site) -> Result<Vec<Page>> {
    site.category_names()
        .map(|category| category_page(site, category))
        .collect()
}

/// A category name that may not produce the page its author expects. These
/// are reported, never corrected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CategoryIssue {
    /// The name contains a path separator, so its index won't sit directly
    /// under the category directory.
    PathSeparator(String),

    /// The name is empty, `.` or `..`, so its index escapes or collapses onto
    /// another directory.
    DotSegment(String),

    /// The name contains `#` or `?`. The page is written, but links to it
    /// read the rest of the name as a URL fragment or query.
    UrlDelimiter(String),

    /// These names differ only by case and collide on case-insensitive file
    /// systems.
    CaseCollision(Vec<String>),
}

impl fmt::Display for CategoryIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CategoryIssue::PathSeparator(name) => {
                write!(f, "category `{}` contains a path separator", name)
            }
            CategoryIssue::DotSegment(name) => {
                write!(f, "category `{}` is not a usable directory name", name)
            }
            CategoryIssue::UrlDelimiter(name) => {
                write!(f, "category `{}` contains `#` or `?` and can't be linked", name)
            }
            CategoryIssue::CaseCollision(names) => {
                write!(f, "categories differ only by case: {}", names.join(", "))
            }
        }
    }
}

/// Reports category names that are unsafe as directory names or that collide
/// case-insensitively. Per-name issues come first, in category order,
/// followed by case collisions in order of first appearance.
pub fn category_issues(site: &Site) -> Vec<CategoryIssue> {
    let mut issues = Vec::new();
    let mut folded: HashMap<String, Vec<String>> = HashMap::new();
    let mut fold_order = Vec::new();

    for name in site.category_names() {
        if name.contains('/') || name.contains('\\') {
            issues.push(CategoryIssue::PathSeparator(name.to_owned()));
        } else if name.is_empty() || name == "." || name == ".." {
            issues.push(CategoryIssue::DotSegment(name.to_owned()));
        } else if name.contains('#') || name.contains('?') {
            issues.push(CategoryIssue::UrlDelimiter(name.to_owned()));
        }

        let key = name.to_lowercase();
        let group = folded.entry(key.clone()).or_insert_with(|| {
            fold_order.push(key);
            Vec::new()
        });
        group.push(name.to_owned());
    }

    for key in fold_order {
        if let Some(names) = folded.remove(&key) {
            if names.len() > 1 {
                issues.push(CategoryIssue::CaseCollision(names));
            }
        }
    }

    issues
}

/// The result of running a generator.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents a failure surfaced while generating pages.
#[derive(Debug)]
pub enum Error {
    /// Returned when a page needs a layout the site doesn't have.
    LayoutNotFound(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::LayoutNotFound(name) => write!(f, "layout `{}` not found", name),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod test {
    use super::*;
    use crate::layout::Layout;
    use crate::post::Post;
    use crate::site::test::{post, site};
    use pretty_assertions::assert_eq;
    use serde_yaml::Value;

    fn site_with_layout(posts: Vec<Post>, layout: &str) -> Site {
        let mut site = site(posts);
        site.layouts.insert(
            CATEGORY_LAYOUT.to_owned(),
            Layout::parse(CATEGORY_LAYOUT, layout).unwrap(),
        );
        site
    }

    fn go_and_rust() -> Site {
        site_with_layout(
            vec![
                post("b", (2021, 2, 1), &["go"]),
                post("a", (2021, 1, 1), &["rust", "go"]),
            ],
            "{{ .page.category }}",
        )
    }

    #[test]
    fn test_one_page_per_category() -> Result<()> {
        let site = go_and_rust();
        let pages = category_pages(&site)?;

        let paths: Vec<String> = pages.iter().map(Page::output_path).collect();
        assert_eq!(paths, vec!["category/go/index.html", "category/rust/index.html"]);

        for (page, category) in pages.iter().zip(&["go", "rust"]) {
            assert_eq!(page.get_str(CATEGORY_KEY), Some(*category));
            assert_eq!(page.layout, CATEGORY_LAYOUT);
        }
        Ok(())
    }

    #[test]
    fn test_generate_appends_to_site_pages() -> Result<()> {
        let mut site = go_and_rust();
        site.pages.push(Page::new("", "about.html", "default"));

        CategoryPageGenerator.generate(&mut site)?;
        assert_eq!(site.pages.len(), 3);
        assert_eq!(site.pages[0].output_path(), "about.html");
        assert_eq!(site.pages[1].output_path(), "category/go/index.html");
        assert_eq!(site.pages[2].output_path(), "category/rust/index.html");
        Ok(())
    }

    #[test]
    fn test_no_categories_no_pages() -> Result<()> {
        let mut site = site_with_layout(vec![post("a", (2021, 1, 1), &[])], "x");
        assert!(category_pages(&site)?.is_empty());
        CategoryPageGenerator.generate(&mut site)?;
        assert!(site.pages.is_empty());
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<()> {
        let site = go_and_rust();
        assert_eq!(category_pages(&site)?, category_pages(&site)?);
        Ok(())
    }

    #[test]
    fn test_layout_defaults_and_category_override() -> Result<()> {
        let site = site_with_layout(
            vec![post("a", (2021, 1, 1), &["tutorials"])],
            "---\ntitle: Archive\ncategory: placeholder\n---\n{{ .page.title }}",
        );
        let pages = category_pages(&site)?;
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].output_path(), "category/tutorials/index.html");
        assert_eq!(pages[0].get_str("title"), Some("Archive"));
        assert_eq!(pages[0].get(CATEGORY_KEY), Some(&Value::from("tutorials")));
        Ok(())
    }

    #[test]
    fn test_missing_layout_propagates() {
        let mut site = site(vec![post("a", (2021, 1, 1), &["go"])]);
        let result = CategoryPageGenerator.generate(&mut site);
        assert!(matches!(result, Err(Error::LayoutNotFound(name)) if name == "posts"));
        assert!(site.pages.is_empty());
    }

    #[test]
    fn test_missing_layout_without_categories_is_fine() -> Result<()> {
        let site = site(vec![post("a", (2021, 1, 1), &[])]);
        assert!(category_pages(&site)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_category_issues_are_flagged_not_fixed() -> Result<()> {
        let site = site_with_layout(
            vec![post("a", (2021, 1, 1), &["Rust", "a/b", "rust", "..", "go"])],
            "x",
        );
        assert_eq!(
            category_issues(&site),
            vec![
                CategoryIssue::PathSeparator("a/b".to_owned()),
                CategoryIssue::DotSegment("..".to_owned()),
                CategoryIssue::CaseCollision(vec!["Rust".to_owned(), "rust".to_owned()]),
            ]
        );

        let paths: Vec<String> = category_pages(&site)?.iter().map(Page::output_path).collect();
        assert_eq!(
            paths,
            vec![
                "category/Rust/index.html",
                "category/a/b/index.html",
                "category/rust/index.html",
                "category/../index.html",
                "category/go/index.html",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_url_delimiters_are_flagged() -> Result<()> {
        let site = site_with_layout(
            vec![post("a", (2021, 1, 1), &["c#", "why?", "go"])],
            "x",
        );
        assert_eq!(
            category_issues(&site),
            vec![
                CategoryIssue::UrlDelimiter("c#".to_owned()),
                CategoryIssue::UrlDelimiter("why?".to_owned()),
            ]
        );
        assert_eq!(
            category_pages(&site)?[0].output_path(),
            "category/c#/index.html"
        );
        Ok(())
    }

    struct ClearPages;

    impl Generator for ClearPages {
        fn name(&self) -> &str {
            "clear"
        }

        fn generate(&self, site: &mut Site) -> Result<()> {
            site.pages.clear();
            Ok(())
        }
    }

    #[test]
    fn test_generators_may_remove_pages() -> Result<()> {
        let generators = Generators::default().register(ClearPages);
        assert_eq!(generators.names(), vec!["categories", "clear"]);

        let mut site = go_and_rust();
        generators.run(&mut site)?;
        assert!(site.pages.is_empty());
        Ok(())
    }

    #[test]
    fn test_registry() -> Result<()> {
        let generators = Generators::default();
        assert_eq!(generators.names(), vec!["categories"]);

        let mut site = go_and_rust();
        generators.run(&mut site)?;
        assert_eq!(site.pages.len(), 2);

        let mut site = go_and_rust();
        Generators::empty().run(&mut site)?;
        assert!(site.pages.is_empty());
        Ok(())
    }
}
