//! Product field extractors
//!
//! Every scalar field is an ordered cascade of [`Strategy`] values tried
//! with early exit; the first strategy returning `Some` wins and the rest
//! are never run. Images instead union the output of all their strategies.
//! Absence is `None`, never an error.

mod attributes;
mod category;
mod css_extractor;
mod description;
mod detail_page;
mod embedded_json;
mod images;
mod name;
mod opengraph_extractor;
mod price;

pub use attributes::*;
pub use category::*;
pub use css_extractor::*;
pub use description::*;
pub use detail_page::*;
pub use embedded_json::*;
pub use images::*;
pub use name::*;
pub use opengraph_extractor::*;
pub use price::*;

use std::collections::BTreeMap;

use scraper::Html;
use url::Url;

use crate::events::{EventSink, Field, PipelineEvent};
use crate::pipeline::ScrapeContext;

/// A fetched page, parsed once and shared by every strategy
pub struct PageDocument {
    raw: String,
    document: Html,
    base_url: Option<Url>,
}

impl PageDocument {
    pub fn parse(raw: impl Into<String>, source_url: &str) -> Self {
        let raw = raw.into();
        let document = Html::parse_document(&raw);
        Self {
            raw,
            document,
            base_url: Url::parse(source_url).ok(),
        }
    }

    /// Raw page text, for regex and embedded JSON scans
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn html(&self) -> &Html {
        &self.document
    }

    /// Resolve `href` against the page URL.
    ///
    /// Returns `None` for `javascript:`, `data:` and anchor links. Without
    /// a base URL the trimmed input is returned as is.
    pub fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty()
            || href.starts_with("javascript:")
            || href.starts_with("data:")
            || href.starts_with('#')
        {
            return None;
        }

        match &self.base_url {
            Some(base) => base.join(href).ok().map(|u| u.to_string()),
            None => Some(href.to_string()),
        }
    }
}

/// A value accepted from one strategy of a cascade
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionCandidate<T> {
    pub value: T,
    /// Name of the strategy that produced the value
    pub method: &'static str,
    /// Position of that strategy in its cascade; 0 is the most trusted
    pub rank: usize,
}

/// One named way of locating a field
pub struct Strategy<'a, T> {
    pub method: &'static str,
    run: Box<dyn Fn(&PageDocument) -> Option<T> + 'a>,
}

impl<'a, T> Strategy<'a, T> {
    pub fn new(method: &'static str, run: impl Fn(&PageDocument) -> Option<T> + 'a) -> Self {
        Self {
            method,
            run: Box::new(run),
        }
    }

    pub fn apply(&self, doc: &PageDocument) -> Option<T> {
        (self.run)(doc)
    }
}

/// Try `strategies` in order and keep the first hit
pub fn run_cascade<T>(
    field: Field,
    doc: &PageDocument,
    strategies: &[Strategy<'_, T>],
    events: &dyn EventSink,
) -> Option<ExtractionCandidate<T>> {
    for (rank, strategy) in strategies.iter().enumerate() {
        if let Some(value) = strategy.apply(doc) {
            events.emit(PipelineEvent::FieldExtracted {
                field,
                method: strategy.method,
            });
            return Some(ExtractionCandidate {
                value,
                method: strategy.method,
                rank,
            });
        }
    }
    events.emit(PipelineEvent::FieldMissing { field });
    None
}

/// Raw, untranslated extraction output for one page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFields {
    pub name: Option<ExtractionCandidate<String>>,
    /// Numeric string, `"0"` when no strategy matched
    pub price: String,
    /// Canonical URLs; never empty
    pub images: Vec<String>,
    /// `None` when every description strategy failed
    pub description: Option<ExtractionCandidate<String>>,
    pub attributes: BTreeMap<String, String>,
    /// Marketplace category in the source language
    pub leaf_category: Option<String>,
}

impl ExtractedFields {
    /// Description text, or the sentinel when none was found
    pub fn description_text(&self) -> &str {
        self.description
            .as_ref()
            .map_or(NO_DESCRIPTION, |c| c.value.as_str())
    }
}

/// Runs every field extractor over one page
pub struct FieldExtractor<'a> {
    ctx: &'a ScrapeContext,
    detail: Option<DetailFetch<'a>>,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(ctx: &'a ScrapeContext) -> Self {
        Self { ctx, detail: None }
    }

    /// Enable the auxiliary `detailUrl` description strategy
    pub fn with_detail_fetch(mut self, detail: DetailFetch<'a>) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn extract(&self, doc: &PageDocument) -> ExtractedFields {
        let events = self.ctx.events();
        let config = self.ctx.config();

        let description = DescriptionExtractor::new(self.ctx, self.detail.as_ref()).extract(doc);

        ExtractedFields {
            name: extract_name(doc, events),
            price: extract_price(doc, events),
            images: collect_images(doc, config, events),
            description,
            attributes: extract_attributes(doc, events),
            leaf_category: extract_leaf_category(doc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    #[test]
    fn test_cascade_stops_at_first_hit() {
        let doc = PageDocument::parse("<html></html>", "https://detail.example.com/offer/1.html");
        let events = RecordingSink::new();
        let strategies = vec![
            Strategy::new("never", |_: &PageDocument| None),
            Strategy::new("second", |_: &PageDocument| Some(2)),
            Strategy::new("third", |_: &PageDocument| -> Option<i32> {
                panic!("must not run after a hit")
            }),
        ];

        let hit = run_cascade(Field::Price, &doc, &strategies, &events).unwrap();
        assert_eq!(hit.value, 2);
        assert_eq!(hit.method, "second");
        assert_eq!(hit.rank, 1);
        assert_eq!(
            events.events(),
            vec![PipelineEvent::FieldExtracted {
                field: Field::Price,
                method: "second"
            }]
        );
    }

    #[test]
    fn test_cascade_miss() {
        let doc = PageDocument::parse("", "not a url");
        let events = RecordingSink::new();
        let strategies: Vec<Strategy<'_, String>> = vec![Strategy::new("none", |_| None)];

        assert!(run_cascade(Field::Name, &doc, &strategies, &events).is_none());
        assert_eq!(
            events.events(),
            vec![PipelineEvent::FieldMissing { field: Field::Name }]
        );
    }

    #[test]
    fn test_resolve() {
        let doc = PageDocument::parse("", "https://detail.example.com/offer/1.html");
        assert_eq!(
            doc.resolve("/img/a.jpg").unwrap(),
            "https://detail.example.com/img/a.jpg"
        );
        assert_eq!(
            doc.resolve("//cdn.example.com/b.jpg").unwrap(),
            "https://cdn.example.com/b.jpg"
        );
        assert!(doc.resolve("javascript:void(0)").is_none());
        assert!(doc.resolve("data:image/png;base64,AAAA").is_none());

        let no_base = PageDocument::parse("", "");
        assert_eq!(no_base.resolve(" img/a.jpg ").unwrap(), "img/a.jpg");
    }
}
