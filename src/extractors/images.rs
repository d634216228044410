//! Product image collection
//!
//! Unlike the scalar fields, images run every strategy and merge the
//! results through one [`ImageSet`], so the order of first discovery is
//! kept and size variants collapse to a single canonical URL.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::ScrapeConfig;
use crate::events::{EventSink, PipelineEvent};
use crate::image_url::ImageSet;

use super::{
    balanced_block, first_attr, parse_js_value, preview_images, select_all, PageDocument,
};

static IMAGE_LIST_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(offerImgList|mainImageList|imageList)"\s*:\s*\["#).unwrap()
});

static FULL_PATH_URI: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""fullPathImageURI"\s*:\s*"([^"]+)""#).unwrap());

/// URI keys of image list items, most complete first
const ITEM_URI_KEYS: &[&str] = &[
    "fullPathImageURI",
    "originalImageURI",
    "imageURI",
    "imageUrl",
    "url",
    "src",
];

/// Selectors scanned for image tags, most specific first
const IMAGE_SELECTORS: &[&str] = &[
    "img[data-lazy-src]",
    "img[data-original]",
    ".image-view img",
    ".offer-img img",
    "[class*=\"image\"] img",
    "div.od-gallery-turn-item-wrapper img.od-gallery-img",
    "img.ant-image-img.preview-img",
    "img",
];

const IMAGE_ATTRS: &[&str] = &["data-lazy-src", "data-original", "data-src", "src"];

/// Decorative images skipped by the tag scan
const DECORATION_WORDS: &[&str] = &["logo", "icon", "placeholder", "spacer", "pixel"];

/// Prefix CDN-relative URIs (`img/ibank/...`) with the first CDN host
fn absolutize_uri(uri: &str, config: &ScrapeConfig) -> String {
    let uri = uri.trim();
    if uri.starts_with("http") || uri.starts_with("//") || uri.starts_with('{') {
        return uri.to_string();
    }
    match config.cdn_hosts.first() {
        Some(host) => format!("https://{}/{}", host, uri.trim_start_matches('/')),
        None => uri.to_string(),
    }
}

/// URIs from `offerImgList` / `mainImageList` / `imageList` arrays
pub fn embedded_list_images(doc: &PageDocument, config: &ScrapeConfig) -> Vec<String> {
    let raw = doc.raw();
    let mut uris = Vec::new();

    for m in IMAGE_LIST_KEY.find_iter(raw) {
        let Some(block) = balanced_block(raw, m.end() - 1) else {
            continue;
        };

        match parse_js_value(block) {
            Ok(Value::Array(items)) => {
                for item in &items {
                    let uri = match item {
                        Value::String(s) => Some(s.as_str()),
                        Value::Object(map) => ITEM_URI_KEYS
                            .iter()
                            .find_map(|k| map.get(*k).and_then(Value::as_str)),
                        _ => None,
                    };
                    if let Some(uri) = uri {
                        uris.push(absolutize_uri(uri, config));
                    }
                }
            }
            _ => {
                debug!("Image list is not valid JSON, scanning it for fullPathImageURI");
                uris.extend(
                    FULL_PATH_URI
                        .captures_iter(block)
                        .filter_map(|cap| cap.get(1))
                        .map(|m| m.as_str().replace("\\/", "/")),
                );
            }
        }
    }
    uris
}

/// Image tag sources, in selector order, resolved against the page URL
pub fn tag_images(doc: &PageDocument) -> Vec<String> {
    let mut urls = Vec::new();
    for selector in IMAGE_SELECTORS {
        for el in select_all(doc.html(), selector) {
            let Some(src) = first_attr(&el, IMAGE_ATTRS) else {
                continue;
            };
            let lower = src.to_ascii_lowercase();
            let alt = el.value().attr("alt").unwrap_or("").to_ascii_lowercase();
            if DECORATION_WORDS
                .iter()
                .any(|w| lower.contains(w) || alt.contains(w))
            {
                continue;
            }
            if let Some(url) = doc.resolve(&src) {
                urls.push(url);
            }
        }
    }
    urls
}

/// Bare URLs on the configured CDN hosts anywhere in the raw page
pub fn cdn_images(doc: &PageDocument, config: &ScrapeConfig) -> Vec<String> {
    if config.cdn_hosts.is_empty() {
        return vec![];
    }
    let hosts: Vec<String> = config.cdn_hosts.iter().map(|h| regex::escape(h)).collect();
    let pattern = format!(r#"(?:https?:)?//(?:{})/[^\s"'<>()\\]+"#, hosts.join("|"));
    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            debug!("Invalid CDN host pattern: {e}");
            return vec![];
        }
    };

    let unescaped = doc.raw().replace("\\/", "/");
    re.find_iter(&unescaped)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Collect, normalize and deduplicate product images.
///
/// Every strategy runs. The tag scan contributes at most
/// `config.max_tag_images` URLs. If nothing survives normalization the
/// configured placeholder is returned, so the result is never empty.
pub fn collect_images(doc: &PageDocument, config: &ScrapeConfig, events: &dyn EventSink) -> Vec<String> {
    let mut images = ImageSet::new();

    let accepted = images.extend_from(embedded_list_images(doc, config));
    events.emit(PipelineEvent::ImagesCollected {
        method: "embedded image lists",
        accepted,
    });

    let mut accepted = 0;
    for url in tag_images(doc) {
        if accepted >= config.max_tag_images {
            break;
        }
        if images.offer(&url) {
            accepted += 1;
        }
    }
    events.emit(PipelineEvent::ImagesCollected {
        method: "image tags",
        accepted,
    });

    let accepted = images.extend_from(cdn_images(doc, config));
    events.emit(PipelineEvent::ImagesCollected {
        method: "cdn url scan",
        accepted,
    });

    let accepted = images.extend_from(preview_images(doc.html()));
    events.emit(PipelineEvent::ImagesCollected {
        method: "preview meta tags",
        accepted,
    });

    if images.is_empty() {
        events.emit(PipelineEvent::PlaceholderImageUsed {
            url: config.placeholder_image.clone(),
        });
        return vec![config.placeholder_image.clone()];
    }
    images.into_urls()
}
