//! CSS selector-based extraction
//!
//! Uses the scraper crate to select elements by CSS selectors on an already
//! parsed document. An invalid selector selects nothing.

use scraper::{ElementRef, Html, Selector};

use crate::text::collapse_whitespace;

/// Whitespace-collapsed text content of an element
pub fn element_text(el: &ElementRef) -> String {
    let pieces: Vec<&str> = el.text().collect();
    collapse_whitespace(&pieces.join(" "))
}

/// Elements matching a CSS selector
pub fn select_all<'a>(document: &'a Html, selector_str: &str) -> Vec<ElementRef<'a>> {
    let selector = match Selector::parse(selector_str) {
        Ok(s) => s,
        Err(_) => return vec![],
    };

    document.select(&selector).collect()
}

/// Extract elements matching a CSS selector
/// Returns outer HTML of matching elements
pub fn extract_css(document: &Html, selector_str: &str) -> Vec<String> {
    select_all(document, selector_str)
        .iter()
        .map(|el| el.html())
        .collect()
}

/// Extract text content from elements matching a CSS selector
pub fn extract_css_text(document: &Html, selector_str: &str) -> Vec<String> {
    select_all(document, selector_str)
        .iter()
        .map(element_text)
        .collect()
}

/// Extract first matching element's text, if non-empty
pub fn extract_css_first_text(document: &Html, selector_str: &str) -> Option<String> {
    let selector = Selector::parse(selector_str).ok()?;

    document
        .select(&selector)
        .next()
        .map(|el| element_text(&el))
        .filter(|text| !text.is_empty())
}

/// First non-empty attribute of `el` in `attrs` priority order
pub fn first_attr(el: &ElementRef, attrs: &[&str]) -> Option<String> {
    attrs
        .iter()
        .filter_map(|name| el.value().attr(name))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_css_extract() {
        let html = Html::parse_document(
            r#"
        <html>
        <body>
            <div class="price">¥19.90</div>
            <div class="price">¥29.90</div>
            <img class="pic" data-src="/lazy.jpg" src="/blank.gif">
            <img class="pic" src="/plain.jpg">
        </body>
        </html>
        "#,
        );

        let prices = extract_css_text(&html, ".price");
        assert_eq!(prices.len(), 2);
        assert_eq!(prices[0], "¥19.90");

        let first_price = extract_css_first_text(&html, ".price");
        assert_eq!(first_price.unwrap(), "¥19.90");

        let srcs: Vec<String> = select_all(&html, "img.pic")
            .iter()
            .filter_map(|el| first_attr(el, &["data-src", "src"]))
            .collect();
        assert_eq!(srcs, vec!["/lazy.jpg", "/plain.jpg"]);
    }

    #[test]
    fn test_complex_selectors() {
        let html = Html::parse_document(
            r#"
        <div id="productTitle">
            <h1>  无线   蓝牙耳机 </h1>
        </div>
        <div id="empty"><span> </span></div>
        "#,
        );

        assert_eq!(
            extract_css_first_text(&html, "#productTitle h1").unwrap(),
            "无线 蓝牙耳机"
        );
        assert!(extract_css_first_text(&html, "#empty span").is_none());
        assert!(extract_css(&html, "div[").is_empty());
    }
}
