//! Defines [`Site`], the in-memory model that generators read from and append
//! pages to.

use indexmap::IndexMap;
use std::collections::HashMap;
use url::Url;

use crate::layout::Layout;
use crate::page::Page;
use crate::post::Post;

/// The site being built.
pub struct Site {
    /// The site title, made available to every template.
    pub title: String,

    /// The root URL of the site. Should end in a trailing slash.
    pub url: Url,

    /// All posts, most recent first.
    pub posts: Vec<Post>,

    /// Layouts keyed by name.
    pub layouts: HashMap<String, Layout>,

    /// Generated pages. Generators append to this; the writer renders it.
    pub pages: Vec<Page>,

    /// Maps each category name to the indices (into `posts`) of its posts.
    categories: IndexMap<String, Vec<usize>>,
}

impl Site {
    /// Builds a site from its posts and layouts. Categories are collected in
    /// the order they are first seen while walking `posts`.
    pub fn new(title: String, url: Url, posts: Vec<Post>, layouts: HashMap<String, Layout>) -> Site {
        let mut categories: IndexMap<String, Vec<usize>> = IndexMap::new();
        for (i, post) in posts.iter().enumerate() {
            for category in &post.categories {
                categories.entry(category.clone()).or_default().push(i);
            }
        }

        Site {
            title,
            url,
            posts,
            layouts,
            pages: Vec::new(),
            categories,
        }
    }

    /// Returns the category names in iteration order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    /// Returns each category with its posts, in iteration order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, Vec<&Post>)> {
        self.categories.iter().map(move |(name, indices)| {
            (name.as_str(), indices.iter().map(|&i| &self.posts[i]).collect())
        })
    }

    /// Returns the posts in `category`, most recent first. Unknown categories
    /// have no posts.
    pub fn category_posts(&self, category: &str) -> Vec<&Post> {
        match self.categories.get(category) {
            Some(indices) => indices.iter().map(|&i| &self.posts[i]).collect(),
            None => Vec::new(),
        }
    }

    /// Looks up a layout by name.
    pub fn layout(&self, name: &str) -> Option<&Layout> {
        self.layouts.get(name)
    }

    /// Resolves a site-relative output path against the site URL.
    pub fn url_for(&self, path: &str) -> Result<Url, url::ParseError> {
        self.url.join(path)
    }
}
