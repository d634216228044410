//! Text extraction from the auxiliary `detailUrl` document
//!
//! The detail document has no stable layout, so every method runs and the
//! distinct pieces are joined with `" | "`. The raw body text is used only
//! when nothing else produced anything.

use scraper::Selector;

use crate::text::collapse_whitespace;

use super::{element_text, extract_css_first_text, find_string_fields, meta_description, select_all};

const JSON_TEXT_KEYS: &[&str] = &["description", "content", "text", "detail"];

const DETAIL_SELECTORS: &[&str] = &[
    ".detail-content",
    ".product-description",
    ".description-content",
    ".detail-desc",
    "#description",
    ".html-description",
    "div[class*=\"desc\"]",
    "div[class*=\"detail\"]",
    ".content",
    ".text",
    "p",
    "div",
];

const DATA_ATTRS: &[&str] = &["data-content", "data-description", "data-text", "data-detail"];

const MIN_JSON_CHARS: usize = 20;
const MIN_BLOCK_CHARS: usize = 50;
const MIN_ATTR_CHARS: usize = 20;
const MIN_TITLE_CHARS: usize = 10;
const MIN_META_CHARS: usize = 20;
const MIN_BODY_CHARS: usize = 100;
const MAX_BODY_CHARS: usize = 2000;

#[derive(Default)]
struct Parts(Vec<String>);

impl Parts {
    fn push(&mut self, text: String) {
        if !self.0.contains(&text) {
            self.0.push(text);
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Description text from a detail document, or `None` if it has none
pub fn extract_detail_text(html: &str) -> Option<String> {
    let document = scraper::Html::parse_document(html);
    let mut parts = Parts::default();

    for key in JSON_TEXT_KEYS {
        for text in find_string_fields(html, key) {
            if char_len(&text) > MIN_JSON_CHARS {
                parts.push(text);
            }
        }
    }

    for selector in DETAIL_SELECTORS {
        for el in select_all(&document, selector) {
            let text = element_text(&el);
            if char_len(&text) > MIN_BLOCK_CHARS {
                parts.push(text);
            }
        }
    }

    if let Ok(selector) = Selector::parse("div, p, span, section") {
        for el in document.select(&selector) {
            for attr in DATA_ATTRS {
                if let Some(value) = el.value().attr(attr) {
                    let value = value.trim();
                    if char_len(value) > MIN_ATTR_CHARS {
                        parts.push(value.to_string());
                    }
                }
            }
        }
    }

    if let Some(title) = extract_css_first_text(&document, "title") {
        if char_len(&title) > MIN_TITLE_CHARS {
            parts.push(format!("Title: {title}"));
        }
    }
    if let Some(meta) = meta_description(&document) {
        if char_len(&meta) > MIN_META_CHARS {
            parts.push(meta);
        }
    }

    if parts.0.is_empty() {
        let pieces: Vec<&str> = document.root_element().text().collect();
        let body = collapse_whitespace(&pieces.join(" "));
        if char_len(&body) > MIN_BODY_CHARS {
            parts.push(body.chars().take(MAX_BODY_CHARS).collect());
        }
    }

    (!parts.0.is_empty()).then(|| parts.0.join(" | "))
}
