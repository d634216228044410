//! Image URL canonicalization and per-record deduplication
//!
//! Marketplace CDNs serve the same picture under many names: thumbnails
//! (`_300x300`), recompressed variants (`_Q90.jpg`), format conversions
//! (`.jpg_.webp`) and tracking query strings. [`normalize_image_url`] maps
//! every variant back to the full-size original or rejects the candidate.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Substrings marking a degraded variant, matched case-insensitively
const LOW_QUALITY_MARKERS: &[&str] = &[
    "_50x50", "_100x100", "_200x200", "search", "summ", "_q60", "_q50", "_q40", "_q30",
];

/// Keys holding the URL when the candidate is a JSON object literal
const JSON_URL_KEYS: &[&str] = &[
    "url",
    "image",
    "imageUrl",
    "imageURL",
    "imgUrl",
    "img",
    "fullPathImageURI",
];

/// Format-conversion suffixes; everything from the marker on is dropped
const FORMAT_SUFFIXES: &[(&str, &str)] = &[
    ("_.webp", ".webp"),
    ("_.jpg", ".jpg"),
    ("_.jpeg", ".jpeg"),
    ("_.png", ".png"),
];

/// Size tokens removed verbatim before the generic size regex runs
const SIZE_TOKENS: &[&str] = &[
    "_2000x2000", "_1000x1000", "_800x800", "_600x600", "_500x500", "_400x400", "_300x300",
    "_200x200", "_100x100", "_50x50", ".220x220", ".310x310",
];

/// Recompression markers; everything from the marker on is dropped
const QUALITY_SUFFIXES: &[&str] = &["_Q90", "_Q75", "_q90", "_q75"];

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".webp", ".gif"];

static EMBEDDED_HTTP_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s"'\\]+"#).unwrap());

static SIZE_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[_-]\d{2,4}x\d{2,4}").unwrap());

static DOUBLE_EXTENSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\.(?:jpe?g|png|webp|gif))\.(?:jpe?g|png|webp|gif)$").unwrap()
});

fn has_image_extension(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Cut `url` at the first `marker`, keeping an extension on what remains
fn truncate_at_marker(url: &mut String, marker: &str, fallback_ext: &str) {
    if let Some(pos) = url.find(marker) {
        let prefix = url[..pos].trim_end_matches(['_', '.']).to_string();
        *url = if has_image_extension(&prefix) {
            prefix
        } else {
            format!("{prefix}{fallback_ext}")
        };
    }
}

/// Pull a URL out of a JSON object literal candidate
fn url_from_json_literal(raw: &str) -> Option<String> {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(raw) {
        let found = JSON_URL_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str));
        if let Some(url) = found {
            return Some(url.to_string());
        }
    }
    EMBEDDED_HTTP_URL
        .find(raw)
        .map(|m| m.as_str().to_string())
}

/// Canonicalize a raw candidate, or `None` if it is not a usable image URL
pub fn normalize_image_url(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    let lower = raw.to_ascii_lowercase();
    if let Some(marker) = LOW_QUALITY_MARKERS.iter().find(|m| lower.contains(*m)) {
        debug!("Rejected low-quality image variant ({marker}): {raw}");
        return None;
    }

    let mut url = if raw.starts_with('{') {
        url_from_json_literal(raw)?
    } else {
        raw.to_string()
    };
    url = url.replace("\\/", "/");

    if let Some(pos) = url.find("ImageURI:") {
        url = url[pos + "ImageURI:".len()..]
            .trim_matches(|c: char| c == '"' || c == '\'' || c.is_whitespace())
            .to_string();
    }

    if url.starts_with("//") {
        url = format!("https:{url}");
    }

    if let Some(pos) = url.find(['?', '#']) {
        url.truncate(pos);
    }
    let trimmed_len = url.trim_end_matches([',', ';', '/']).len();
    url.truncate(trimmed_len);

    if !(url.starts_with("http://") || url.starts_with("https://")) {
        debug!("Rejected image candidate without http(s) scheme: {raw}");
        return None;
    }
    if url.chars().any(char::is_whitespace) {
        return None;
    }

    for (marker, ext) in FORMAT_SUFFIXES {
        truncate_at_marker(&mut url, marker, ext);
    }
    for token in SIZE_TOKENS {
        url = url.replace(token, "");
    }
    for marker in QUALITY_SUFFIXES {
        truncate_at_marker(&mut url, marker, ".jpg");
    }
    url = SIZE_SUFFIX.replace_all(&url, "").into_owned();
    url = DOUBLE_EXTENSION.replace(&url, "$1").into_owned();

    let trimmed_len = url.trim_end_matches('.').len();
    url.truncate(trimmed_len);

    if !has_image_extension(&url) {
        debug!("Rejected image candidate without image extension: {raw}");
        return None;
    }
    Some(url)
}

/// Ordered set of canonical image URLs for one record
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    urls: Vec<String>,
    seen: HashSet<String>,
}

impl ImageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize and insert a candidate. Returns true if it was accepted
    /// as a new URL.
    pub fn offer(&mut self, raw: &str) -> bool {
        match normalize_image_url(raw) {
            Some(url) if self.seen.insert(url.clone()) => {
                self.urls.push(url);
                true
            }
            _ => false,
        }
    }

    /// Offer every candidate, returning how many were accepted
    pub fn extend_from<I, S>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        candidates
            .into_iter()
            .filter(|c| self.offer(c.as_ref()))
            .count()
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn into_urls(self) -> Vec<String> {
        self.urls
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_strip_size_suffix() {
        assert_eq!(
            normalize_image_url("https://cdn.example.com/img/a_300x300.jpg").as_deref(),
            Some("https://cdn.example.com/img/a.jpg")
        );
        assert_eq!(
            normalize_image_url("https://cbu01.alicdn.com/img/ibank/O1CN01ab.310x310.jpg").as_deref(),
            Some("https://cbu01.alicdn.com/img/ibank/O1CN01ab.jpg")
        );
        assert_eq!(
            normalize_image_url("https://cdn.example.com/x.jpg_640x640.jpg").as_deref(),
            Some("https://cdn.example.com/x.jpg")
        );
    }

    #[test]
    fn test_format_and_quality_suffixes() {
        assert_eq!(
            normalize_image_url("https://cdn.example.com/x.jpg_.webp").as_deref(),
            Some("https://cdn.example.com/x.jpg")
        );
        assert_eq!(
            normalize_image_url("https://cdn.example.com/x_.webp").as_deref(),
            Some("https://cdn.example.com/x.webp")
        );
        assert_eq!(
            normalize_image_url("https://cdn.example.com/x.png_Q90.jpg_.webp").as_deref(),
            Some("https://cdn.example.com/x.png")
        );
    }

    #[test]
    fn test_protocol_relative_and_query() {
        assert_eq!(
            normalize_image_url("  //cdn.example.com/y.png?x-oss-process=resize,w_100  ").as_deref(),
            Some("https://cdn.example.com/y.png")
        );
    }

    #[test]
    fn test_json_literal_candidate() {
        assert_eq!(
            normalize_image_url(r#"{"fullPathImageURI":"https://cdn.example.com/z_800x800.jpg","size":1}"#)
                .as_deref(),
            Some("https://cdn.example.com/z.jpg")
        );
        // not valid JSON, first URL substring is used
        assert_eq!(
            normalize_image_url(r#"{imageUrl: 'https://cdn.example.com/w.gif', }"#).as_deref(),
            Some("https://cdn.example.com/w.gif")
        );
    }

    #[test]
    fn test_rejections() {
        assert_eq!(normalize_image_url(""), None);
        assert_eq!(normalize_image_url("   "), None);
        assert_eq!(normalize_image_url("https://cdn.example.com/a_100x100.jpg"), None);
        assert_eq!(normalize_image_url("https://cdn.example.com/search/a.jpg"), None);
        assert_eq!(normalize_image_url("https://cdn.example.com/a.jpg_q50.jpg"), None);
        assert_eq!(normalize_image_url("ftp://cdn.example.com/a.jpg"), None);
        assert_eq!(normalize_image_url("https://cdn.example.com/page.html"), None);
        assert_eq!(normalize_image_url("/relative/a.jpg"), None);
    }

    #[test]
    fn test_size_variants_dedup() {
        let mut set = ImageSet::new();
        let accepted = set.extend_from([
            "https://cdn.example.com/x.jpg",
            "https://cdn.example.com/x_800x800.jpg",
        ]);
        assert_eq!(accepted, 1);
        assert_eq!(set.into_urls(), vec!["https://cdn.example.com/x.jpg".to_string()]);
    }

    #[test]
    fn test_insertion_order_kept() {
        let mut set = ImageSet::new();
        assert!(set.offer("https://cdn.example.com/b.jpg"));
        assert!(set.offer("https://cdn.example.com/a.jpg"));
        assert!(!set.offer("https://cdn.example.com/b.jpg?spm=1"));
        assert_eq!(set.urls()[0], "https://cdn.example.com/b.jpg");
        assert_eq!(set.len(), 2);
    }

    proptest! {
        #[test]
        fn canonical_urls_are_fixed_points(
            host in "[a-z]{3,8}",
            dir in "[a-z]{1,8}",
            file in "[a-z]{1,12}",
            ext in prop::sample::select(vec!["jpg", "jpeg", "png", "webp", "gif"]),
        ) {
            let url = format!("https://{host}.example.com/{dir}/{file}.{ext}");
            prop_assume!(!url.contains("search") && !url.contains("summ"));

            let once = normalize_image_url(&url);
            prop_assert_eq!(once.as_deref(), Some(url.as_str()));
            let twice = normalize_image_url(&url).and_then(|u| normalize_image_url(&u));
            prop_assert_eq!(twice, once);
        }
    }
}
