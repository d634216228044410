//! Product description extraction
//!
//! Strategies, most trusted first:
//! 1. tables rendered from embedded JSON (`offerDetail`, `featureAttributes`,
//!    `productPackInfo` and scattered scalar fields)
//! 2. known description containers
//! 3. the auxiliary document behind `detailUrl`
//! 4. the largest content block on the page
//! 5. all paragraph text

use serde_json::{Map, Value};

use crate::events::{EventSink, Field};
use crate::fetch::{fetch_with_retry, PageFetcher, Throttle};
use crate::pipeline::ScrapeContext;
use crate::snapshot::SnapshotStore;
use crate::text::escape_html;

use super::{
    element_text, extract_css, extract_css_text, extract_detail_text, find_json_values, find_number_fields,
    find_string_field, find_string_fields, run_cascade, select_all, value_to_string,
    ExtractionCandidate, PageDocument, Strategy,
};

/// Stored when every strategy fails
pub const NO_DESCRIPTION: &str = "No description available.";

const CONTAINER_SELECTORS: &[&str] = &[
    "#description .html-description",
    "#description .module-od-product-description",
    ".desc-content",
    "#description",
];

/// Containers at or below this many bytes are decorative
const MIN_CONTAINER_BYTES: usize = 100;

const MIN_BLOCK_BYTES: usize = 200;
const MIN_BLOCK_TEXT_CHARS: usize = 100;

const OFFER_DETAIL_FIELDS: &[(&str, &str)] = &[
    ("title", "Title"),
    ("seller", "Seller"),
    ("company", "Company"),
    ("promotion", "Promotion"),
    ("services", "Services"),
];

const PACK_FIELDS: &[(&str, &str)] = &[
    ("uiType", "Packaging Type"),
    ("label", "Packaging Label"),
    ("sku", "SKU Info"),
    ("sku1", "SKU Detail 1"),
    ("sku2", "SKU Detail 2"),
];

const MISC_STRING_FIELDS: &[(&str, &str)] = &[
    ("material", "Material"),
    ("brand", "Brand"),
    ("model", "Model"),
    ("color", "Color"),
    ("size", "Size"),
    ("weight", "Weight"),
    ("origin", "Origin"),
    ("warranty", "Warranty"),
    ("subject", "Product Title"),
    ("companyName", "Company Name"),
    ("sellerLoginId", "Seller"),
    ("leafCategoryName", "Category"),
    ("unit", "Unit"),
];

const MISC_NUMBER_FIELDS: &[(&str, &str)] = &[("saleCount", "Sales Count")];

/// Everything needed to fetch the `detailUrl` document
pub struct DetailFetch<'a> {
    pub fetcher: &'a dyn PageFetcher,
    pub throttle: &'a Throttle,
    pub snapshots: &'a SnapshotStore,
}

type Rows = Vec<(String, String)>;

fn render_table(title: &str, headers: (&str, &str), rows: &[(String, String)]) -> String {
    let mut html = format!(
        "<h3>{}</h3>\n<table border=\"1\" cellpadding=\"5\" cellspacing=\"0\">\n<tr><th>{}</th><th>{}</th></tr>\n",
        escape_html(title),
        escape_html(headers.0),
        escape_html(headers.1)
    );
    for (key, value) in rows {
        html.push_str(&format!(
            "<tr><td><strong>{}</strong></td><td>{}</td></tr>\n",
            escape_html(key),
            escape_html(value)
        ));
    }
    html.push_str("</table>");
    html
}

fn labelled_rows(object: &Map<String, Value>, fields: &[(&str, &str)]) -> Rows {
    fields
        .iter()
        .filter_map(|(key, label)| {
            let value = object.get(*key).and_then(value_to_string)?;
            Some((label.to_string(), value))
        })
        .collect()
}

fn feature_rows(features: &[Value]) -> Rows {
    features
        .iter()
        .filter_map(|item| {
            let name = item.get("name").and_then(value_to_string)?;
            let value = match item.get("value")? {
                Value::Array(values) => {
                    let joined: Vec<String> = values.iter().filter_map(value_to_string).collect();
                    (!joined.is_empty()).then(|| joined.join(", "))?
                }
                other => value_to_string(other)?,
            };
            Some((name, value))
        })
        .collect()
}

fn pack_rows(pack: &Map<String, Value>) -> Rows {
    let mut rows = Rows::new();
    if let Some(weight) = pack.get("unitWeight").and_then(value_to_string) {
        rows.push(("Unit Weight".to_string(), format!("{weight} kg")));
    }
    rows.extend(labelled_rows(pack, PACK_FIELDS));
    rows
}

fn misc_rows(raw: &str) -> Rows {
    let mut rows = Rows::new();
    let mut push = |label: &str, value: String| {
        let row = (label.to_string(), value);
        if !row.1.trim().is_empty() && !rows.contains(&row) {
            rows.push(row);
        }
    };
    for (key, label) in MISC_STRING_FIELDS {
        for value in find_string_fields(raw, key) {
            push(label, value);
        }
    }
    for (key, label) in MISC_NUMBER_FIELDS {
        for value in find_number_fields(raw, key) {
            push(label, value);
        }
    }
    rows
}

/// HTML tables built from the structured data embedded in the page
pub fn structured_tables(raw: &str) -> Option<String> {
    let mut sections = Vec::new();

    for detail in find_json_values(raw, "offerDetail") {
        if let Value::Object(object) = detail {
            let rows = labelled_rows(&object, OFFER_DETAIL_FIELDS);
            if !rows.is_empty() {
                sections.push(render_table("Product Details", ("Item", "Details"), &rows));
            }
        }
    }

    for features in find_json_values(raw, "featureAttributes") {
        if let Value::Array(items) = features {
            let rows = feature_rows(&items);
            if !rows.is_empty() {
                sections.push(render_table("Product Attributes", ("Attribute", "Value"), &rows));
            }
        }
    }

    for pack in find_json_values(raw, "productPackInfo") {
        if let Value::Object(object) = pack {
            let rows = pack_rows(&object);
            if !rows.is_empty() {
                sections.push(render_table(
                    "Packaging Information",
                    ("Packaging Item", "Specification"),
                    &rows,
                ));
            }
        }
    }

    let misc = misc_rows(raw);
    if !misc.is_empty() {
        sections.push(render_table("Additional Information", ("Info Type", "Details"), &misc));
    }

    (!sections.is_empty()).then(|| sections.join("\n"))
}

/// Outer HTML of the description containers, nested duplicates skipped
pub fn container_blocks(doc: &PageDocument) -> Option<String> {
    let mut blocks: Vec<String> = Vec::new();
    for selector in CONTAINER_SELECTORS {
        for html in extract_css(doc.html(), selector) {
            if html.len() <= MIN_CONTAINER_BYTES {
                continue;
            }
            if blocks
                .iter()
                .any(|b| b.contains(html.as_str()) || html.contains(b.as_str()))
            {
                continue;
            }
            blocks.push(html);
        }
    }
    (!blocks.is_empty()).then(|| blocks.join("\n"))
}

/// Largest `div`/`section` holding an image or a real amount of text
pub fn largest_block(doc: &PageDocument) -> Option<String> {
    select_all(doc.html(), "div, section")
        .into_iter()
        .map(|el| (el.html(), el))
        .filter(|(html, el)| {
            html.len() > MIN_BLOCK_BYTES
                && (html.contains("<img") || element_text(el).chars().count() > MIN_BLOCK_TEXT_CHARS)
        })
        .max_by_key(|(html, _)| html.len())
        .map(|(html, _)| html)
}

/// Every non-empty paragraph, one per line
pub fn paragraph_text(doc: &PageDocument) -> Option<String> {
    let paragraphs: Vec<String> = extract_css_text(doc.html(), "p")
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect();
    (!paragraphs.is_empty()).then(|| paragraphs.join("\n"))
}

pub struct DescriptionExtractor<'a> {
    ctx: &'a ScrapeContext,
    detail: Option<&'a DetailFetch<'a>>,
}

impl<'a> DescriptionExtractor<'a> {
    pub fn new(ctx: &'a ScrapeContext, detail: Option<&'a DetailFetch<'a>>) -> Self {
        Self { ctx, detail }
    }

    fn from_detail_url(&self, doc: &PageDocument) -> Option<String> {
        let detail = self.detail?;
        let href = find_string_field(doc.raw(), "detailUrl")?;
        let url = doc.resolve(&href)?;

        fetch_with_retry(
            detail.fetcher,
            detail.throttle,
            &url,
            &self.ctx.config().detail,
            self.ctx.events(),
            |body| {
                detail.snapshots.save_detail(&url, body);
                extract_detail_text(body)
            },
        )
        .ok()
    }

    fn strategies(&self) -> Vec<Strategy<'_, String>> {
        vec![
            Strategy::new("structured json tables", |doc: &PageDocument| structured_tables(doc.raw())),
            Strategy::new("description containers", container_blocks),
            Strategy::new("detailUrl document", move |doc: &PageDocument| self.from_detail_url(doc)),
            Strategy::new("largest content block", largest_block),
            Strategy::new("paragraph text", paragraph_text),
        ]
    }

    /// First description any strategy finds; `None` means the caller
    /// should fall back to [`NO_DESCRIPTION`]
    pub fn extract(&self, doc: &PageDocument) -> Option<ExtractionCandidate<String>> {
        let events: &dyn EventSink = self.ctx.events();
        run_cascade(Field::Description, doc, &self.strategies(), events)
    }
}
