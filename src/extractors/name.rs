//! Product name extraction

use crate::events::{EventSink, Field};

use super::{extract_css_first_text, run_cascade, ExtractionCandidate, PageDocument, Strategy};

const TITLE_CONTAINER: &str = "#productTitle h1";

/// Separator between product and site name in `<title>`
const TITLE_SEPARATOR: char = '-';

fn from_title_container(doc: &PageDocument) -> Option<String> {
    extract_css_first_text(doc.html(), TITLE_CONTAINER)
}

fn from_document_title(doc: &PageDocument) -> Option<String> {
    let title = extract_css_first_text(doc.html(), "title")?;
    let first = title.split(TITLE_SEPARATOR).next()?.trim();
    (!first.is_empty()).then(|| first.to_string())
}

pub fn name_strategies() -> Vec<Strategy<'static, String>> {
    vec![
        Strategy::new("title container", from_title_container),
        Strategy::new("document title", from_document_title),
    ]
}

/// Source-language product name, if any strategy finds one
pub fn extract_name(doc: &PageDocument, events: &dyn EventSink) -> Option<ExtractionCandidate<String>> {
    run_cascade(Field::Name, doc, &name_strategies(), events)
}
