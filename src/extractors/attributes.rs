//! Key/value attribute table extraction

use std::collections::BTreeMap;

use crate::events::{EventSink, Field, PipelineEvent};

use super::{element_text, select_all, PageDocument};

const ATTRIBUTE_ROWS: &str = "#productAttributes table tr";

/// Pair `th` with `td` cells row by row. No table means an empty map.
pub fn extract_attributes(doc: &PageDocument, events: &dyn EventSink) -> BTreeMap<String, String> {
    let mut attributes = BTreeMap::new();

    for row in select_all(doc.html(), ATTRIBUTE_ROWS) {
        let keys = select_all_in(&row, "th");
        let values = select_all_in(&row, "td");
        for (key, value) in keys.into_iter().zip(values) {
            if !key.is_empty() && !value.is_empty() {
                attributes.entry(key).or_insert(value);
            }
        }
    }

    if attributes.is_empty() {
        events.emit(PipelineEvent::FieldMissing {
            field: Field::Attributes,
        });
    } else {
        events.emit(PipelineEvent::FieldExtracted {
            field: Field::Attributes,
            method: "attribute table",
        });
    }
    attributes
}

fn select_all_in(row: &scraper::ElementRef, selector_str: &str) -> Vec<String> {
    match scraper::Selector::parse(selector_str) {
        Ok(selector) => row.select(&selector).map(|el| element_text(&el)).collect(),
        Err(_) => vec![],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    #[test]
    fn test_attribute_table() {
        let html = r#"
        <div id="productAttributes">
            <table>
                <tr><th>材质</th><td>棉</td><th>颜色</th><td>蓝色</td></tr>
                <tr><th>产地</th><td> 浙江 </td></tr>
                <tr><th>空</th><td></td></tr>
            </table>
        </div>
        <table><tr><th>Other</th><td>ignored</td></tr></table>
        "#;
        let doc = PageDocument::parse(html, "https://detail.example.com/offer/1.html");
        let attrs = extract_attributes(&doc, &RecordingSink::new());

        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs["材质"], "棉");
        assert_eq!(attrs["颜色"], "蓝色");
        assert_eq!(attrs["产地"], "浙江");
    }

    #[test]
    fn test_no_table() {
        let doc = PageDocument::parse("<p>nothing</p>", "https://detail.example.com/offer/1.html");
        let events = RecordingSink::new();
        assert!(extract_attributes(&doc, &events).is_empty());
        assert_eq!(
            events.events(),
            vec![PipelineEvent::FieldMissing {
                field: Field::Attributes
            }]
        );
    }
}
