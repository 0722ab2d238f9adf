//! Conversions from site data into [`Value`]s for templating.

use gtmpl_value::Value;
use std::collections::HashMap;
use url::Url;

use crate::generator::CATEGORY_DIR;
use crate::page::{Page, INDEX_FILE_NAME};
use crate::post::Post;
use crate::site::Site;

/// Converts a YAML value (front matter) into a template value. Non-string
/// mapping keys are stringified.
pub fn from_yaml(value: &serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;
    match value {
        Yaml::Null => Value::Nil,
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                Value::from(n.as_f64().unwrap_or_default())
            }
        }
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(seq) => Value::Array(seq.iter().map(from_yaml).collect()),
        Yaml::Mapping(m) => Value::Object(
            m.iter()
                .map(|(k, v)| (yaml_key(k), from_yaml(v)))
                .collect(),
        ),
    }
}

fn yaml_key(key: &serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_start_matches("---").trim().to_owned())
            .unwrap_or_default(),
    }
}

fn url_value(url: &Url) -> Value {
    Value::String(url.to_string())
}

/// Converts a [`Post`] into a template value with fields `id`, `title`,
/// `date`, `url`, `categories`, and `body`.
pub fn post(site: &Site, post: &Post) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("id".to_owned(), Value::String(post.id.clone()));
    m.insert("title".to_owned(), Value::String(post.title.clone()));
    m.insert(
        "date".to_owned(),
        Value::String(post.date.format("%Y-%m-%d").to_string()),
    );
    if let Ok(u) = site.url_for(&post.output_path()) {
        m.insert("url".to_owned(), url_value(&u));
    }
    m.insert(
        "categories".to_owned(),
        Value::Array(post.categories.iter().map(|c| category_link(site, c)).collect()),
    );
    m.insert("body".to_owned(), Value::String(post.body.clone()));
    Value::Object(m)
}

/// A `{name, url}` object pointing at a category's index page.
fn category_link(site: &Site, category: &str) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("name".to_owned(), Value::String(category.to_owned()));
    let path = format!("{}/{}/{}", CATEGORY_DIR, category, INDEX_FILE_NAME);
    if let Ok(u) = site.url_for(&path) {
        m.insert("url".to_owned(), url_value(&u));
    }
    Value::Object(m)
}

/// Converts the site-wide fields into a template value: `title`, `url`, and
/// `categories` (each `{name, url, count}`).
pub fn site(site: &Site) -> Value {
    let mut m: HashMap<String, Value> = HashMap::new();
    m.insert("title".to_owned(), Value::String(site.title.clone()));
    m.insert("url".to_owned(), url_value(&site.url));
    m.insert(
        "categories".to_owned(),
        Value::Array(
            site.categories()
                .map(|(name, posts)| {
                    let mut link = category_link(site, name);
                    if let Value::Object(obj) = &mut link {
                        obj.insert("count".to_owned(), Value::from(posts.len() as u64));
                    }
                    link
                })
                .collect(),
        ),
    );
    Value::Object(m)
}

/// Converts a [`Page`] into a template value: its metadata plus `path` and
/// `url`. Metadata keys named `path` or `url` are shadowed.
pub fn page(site: &Site, page: &Page) -> Value {
    let mut m: HashMap<String, Value> = page
        .data
        .iter()
        .map(|(k, v)| (yaml_key(k), from_yaml(v)))
        .collect();
    let path = page.output_path();
    if let Ok(u) = site.url_for(&path) {
        m.insert("url".to_owned(), url_value(&u));
    }
    m.insert("path".to_owned(), Value::String(path));
    Value::Object(m)
}
