//! The library code for the `catindex` static site generator. A build is a
//! single pass:
//!
//! 1. Parsing posts and layouts from disk into a [`site::Site`]
//!    ([`crate::post`], [`crate::layout`])
//! 2. Running generators, which append pages to the site
//!    ([`crate::generator`])
//! 3. Rendering posts and pages to disk ([`crate::write`])
//!
//! The interesting step is the second. The category generator walks the
//! site's categories (collected from each post's `categories` and `category`
//! front matter) and adds one page per category at
//! `category/{name}/index.html`. Every such page uses the shared `posts`
//! layout and has its `category` metadata bound to the category name; when
//! rendered, the layout also receives that category's posts as `.posts`.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod frontmatter;
pub mod generator;
pub mod layout;
pub mod logging;
pub mod page;
pub mod post;
pub mod site;
pub mod value;
pub mod write;
