//! OpenGraph / Twitter Card meta tag lookup
//!
//! Only the tags the product pipeline reads: social preview images and the
//! standard meta description.

use scraper::{Html, Selector};

/// Preview image tags, in priority order
pub const PREVIEW_IMAGE_TAGS: &[&str] = &[
    "og:image",
    "og:image:url",
    "og:image:secure_url",
    "twitter:image",
];

/// Non-empty `content` of every meta tag whose `property` or `name` is one
/// of `keys`, in document order
pub fn meta_contents(document: &Html, keys: &[&str]) -> Vec<String> {
    let selector = match Selector::parse("meta") {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    let mut values = Vec::new();
    for element in document.select(&selector) {
        let el = element.value();
        let key = el.attr("property").or_else(|| el.attr("name"));
        let content = el.attr("content").unwrap_or("").trim();

        if content.is_empty() {
            continue;
        }
        if key.is_some_and(|k| keys.contains(&k)) {
            values.push(content.to_string());
        }
    }
    values
}

/// Social preview image URLs (`og:image`, `twitter:image`, ...)
pub fn preview_images(document: &Html) -> Vec<String> {
    meta_contents(document, PREVIEW_IMAGE_TAGS)
}

/// `<meta name="description">` content
pub fn meta_description(document: &Html) -> Option<String> {
    meta_contents(document, &["description"]).into_iter().next()
}
