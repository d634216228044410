//! Price extraction and normalization

use std::sync::LazyLock;

use regex::Regex;

use crate::events::{EventSink, Field};

use super::{run_cascade, select_all, PageDocument, Strategy};

const PRICE_SELECTOR: &str = "#mainPrice .price-info.currency";

/// Returned when no strategy yields a price
pub const UNKNOWN_PRICE: &str = "0";

const CURRENCY_MARKERS: &[&str] = &["¥", "￥", "$", "€", "£", "元", "RMB", "CNY"];

static EMBEDDED_PRICE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""price"\s*:\s*"([^"]+)""#).unwrap());

static NUMBER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").unwrap());

/// Strip currency symbols and keep the first number.
///
/// Commas are thousands separators, except a single comma followed by
/// one or two digits with no dot, which is a decimal comma. Ranges like
/// `"35.00-48.00"` yield the lower bound.
pub fn normalize_price(raw: &str) -> Option<String> {
    let mut text = raw.to_string();
    for marker in CURRENCY_MARKERS {
        text = text.replace(marker, "");
    }

    let number = NUMBER.find(&text)?.as_str();
    let normalized = match number.rsplit_once(',') {
        Some((int, frac))
            if !number.contains('.') && (1..=2).contains(&frac.len()) && !int.contains(',') =>
        {
            format!("{int}.{frac}")
        }
        _ => number.replace(',', ""),
    };
    Some(normalized)
}

/// Text pieces are joined without a separator: the page splits a price
/// like `¥12.50` across several spans.
fn from_price_selector(doc: &PageDocument) -> Option<String> {
    let container = select_all(doc.html(), PRICE_SELECTOR).into_iter().next()?;
    let text: String = container.text().collect();
    normalize_price(&text)
}

fn from_embedded_price(doc: &PageDocument) -> Option<String> {
    EMBEDDED_PRICE
        .captures_iter(doc.raw())
        .filter_map(|cap| cap.get(1))
        .find_map(|m| normalize_price(m.as_str()))
}

pub fn price_strategies() -> Vec<Strategy<'static, String>> {
    vec![
        Strategy::new("price selector", from_price_selector),
        Strategy::new("embedded price field", from_embedded_price),
    ]
}

/// Numeric price string, `"0"` when unknown
pub fn extract_price(doc: &PageDocument, events: &dyn EventSink) -> String {
    run_cascade(Field::Price, doc, &price_strategies(), events)
        .map(|c| c.value)
        .unwrap_or_else(|| UNKNOWN_PRICE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    fn price_of(html: &str) -> String {
        let doc = PageDocument::parse(html, "https://detail.example.com/offer/1.html");
        extract_price(&doc, &RecordingSink::new())
    }

    #[test]
    fn test_normalize_price() {
        assert_eq!(normalize_price("¥99").as_deref(), Some("99"));
        assert_eq!(normalize_price("￥1,299.50").as_deref(), Some("1299.50"));
        assert_eq!(normalize_price("12,99 €").as_deref(), Some("12.99"));
        assert_eq!(normalize_price("12,5").as_deref(), Some("12.5"));
        assert_eq!(normalize_price("1,234").as_deref(), Some("1234"));
        assert_eq!(normalize_price("12,").as_deref(), Some("12"));
        assert_eq!(normalize_price("RMB 35.00-48.00").as_deref(), Some("35.00"));
        assert_eq!(normalize_price("1,234,567").as_deref(), Some("1234567"));
        assert_eq!(normalize_price("面议"), None);
    }

    #[test]
    fn test_selector_beats_embedded_field() {
        let html = r#"
            <div id="mainPrice"><span class="price-info currency">¥99</span></div>
            <script>var offer = {"price":"50"};</script>
        "#;
        assert_eq!(price_of(html), "99");
    }

    #[test]
    fn test_price_split_across_spans() {
        let html = r#"<div id="mainPrice"><div class="price-info currency"><span>¥</span><span>12</span><span>.50</span></div></div>"#;
        assert_eq!(price_of(html), "12.50");
    }

    #[test]
    fn test_embedded_field_fallback() {
        assert_eq!(price_of(r#"<script>{"price":"¥ 18.80"}</script>"#), "18.80");
        // a non-numeric embedded price is skipped
        assert_eq!(price_of(r#"<script>{"price":"面议"}</script>"#), UNKNOWN_PRICE);
    }

    #[test]
    fn test_unknown_price() {
        assert_eq!(price_of("<html><body>no price</body></html>"), "0");
    }
}
