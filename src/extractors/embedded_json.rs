//! Embedded JSON/JS object extraction
//!
//! Product pages inline their data model as JS object literals inside
//! `<script>` blocks. Rather than parse the scripts, values are located by
//! key in the raw HTML, the enclosing `[...]`/`{...}` is cut out by bracket
//! matching, and the literal is relaxed into JSON.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static TRAILING_COMMA: LazyLock<Regex> = LazyLock::new(|| Regex::new(r",\s*([}\]])").unwrap());

static UNQUOTED_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([{,]\s*)([A-Za-z_$][\w$]*)\s*:"#).unwrap());

/// Parse a JavaScript value string to JSON
/// Handles trailing commas, single quotes, and unquoted keys
pub fn parse_js_value(js_str: &str) -> Result<Value, serde_json::Error> {
    if let Ok(v) = serde_json::from_str(js_str) {
        return Ok(v);
    }

    let mut json_str = js_str.replace('\'', "\"");
    json_str = TRAILING_COMMA.replace_all(&json_str, "$1").to_string();
    json_str = UNQUOTED_KEY.replace_all(&json_str, r#"$1"$2":"#).to_string();

    serde_json::from_str(&json_str)
}

/// Slice from the bracket at byte `open` to its matching closer.
///
/// Brackets inside string literals are ignored. Returns `None` if `open`
/// is not `[` or `{`, or if the block is unterminated.
pub fn balanced_block(text: &str, open: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let (opener, closer) = match bytes.get(open)? {
        b'[' => (b'[', b']'),
        b'{' => (b'{', b'}'),
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string: Option<u8> = None;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == quote {
                in_string = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' => in_string = Some(b),
            b if b == opener => depth += 1,
            b if b == closer => {
                depth -= 1;
                if depth == 0 {
                    return text.get(open..=i);
                }
            }
            _ => {}
        }
    }
    None
}

fn key_pattern(key: &str) -> Option<Regex> {
    Regex::new(&format!(r#"["']{}["']\s*:\s*"#, regex::escape(key))).ok()
}

/// Every object/array value stored under `key`, in document order
pub fn find_json_values(html: &str, key: &str) -> Vec<Value> {
    let Some(re) = key_pattern(key) else {
        return vec![];
    };

    re.find_iter(html)
        .filter_map(|m| balanced_block(html, m.end()))
        .filter_map(|block| parse_js_value(block).ok())
        .collect()
}

/// Every string value stored under `key`, with JSON escapes decoded
pub fn find_string_fields(html: &str, key: &str) -> Vec<String> {
    let pattern = format!(r#""{}"\s*:\s*"((?:[^"\\]|\\.)*)""#, regex::escape(key));
    let Ok(re) = Regex::new(&pattern) else {
        return vec![];
    };

    re.captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| unescape_json_string(m.as_str()))
        .collect()
}

/// First string value stored under `key`
pub fn find_string_field(html: &str, key: &str) -> Option<String> {
    find_string_fields(html, key).into_iter().next()
}

/// Every bare numeric value stored under `key`
pub fn find_number_fields(html: &str, key: &str) -> Vec<String> {
    let pattern = format!(r#""{}"\s*:\s*(-?[0-9]+(?:\.[0-9]+)?)"#, regex::escape(key));
    let Ok(re) = Regex::new(&pattern) else {
        return vec![];
    };

    re.captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

fn unescape_json_string(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.replace("\\/", "/"))
}

/// Render a scalar JSON value as display text
pub fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_js_value() {
        // Standard JSON
        let v1 = parse_js_value(r#"{"name": "test"}"#).unwrap();
        assert_eq!(v1["name"].as_str().unwrap(), "test");

        // Single quotes
        let v2 = parse_js_value(r#"{'name': 'test'}"#).unwrap();
        assert_eq!(v2["name"].as_str().unwrap(), "test");

        // Trailing comma
        let v3 = parse_js_value(r#"{"name": "test",}"#).unwrap();
        assert_eq!(v3["name"].as_str().unwrap(), "test");

        // Unquoted keys
        let v4 = parse_js_value(r#"{name: "test"}"#).unwrap();
        assert_eq!(v4["name"].as_str().unwrap(), "test");
    }

    #[test]
    fn test_balanced_block_ignores_brackets_in_strings() {
        let text = r#"x = {"a":"}]","b":[1,{"c":2}]}; rest"#;
        let open = text.find('{').unwrap();
        assert_eq!(balanced_block(text, open), Some(r#"{"a":"}]","b":[1,{"c":2}]}"#));
        assert_eq!(balanced_block("[1, 2", 0), None);
        assert_eq!(balanced_block("abc", 0), None);
    }

    #[test]
    fn test_find_json_values() {
        let html = r#"
        <script>
            window.__INIT_DATA = {"offerImgList":["https:\/\/cdn.example.com\/a.jpg"],
                "mainImageList":[{"fullPathImageURI":"https://cdn.example.com/b.jpg"}]};
        </script>
        "#;

        let lists = find_json_values(html, "offerImgList");
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0][0].as_str().unwrap(), "https://cdn.example.com/a.jpg");

        let main = &find_json_values(html, "mainImageList")[0];
        assert_eq!(
            main[0]["fullPathImageURI"].as_str().unwrap(),
            "https://cdn.example.com/b.jpg"
        );
        assert!(find_json_values(html, "imageList").is_empty());
    }

    #[test]
    fn test_find_string_and_number_fields() {
        let html = r#"{"detailUrl":"https:\/\/itemcdn.example.com\/desc?id=1","saleCount":1520,"unit":"件"}"#;
        assert_eq!(
            find_string_field(html, "detailUrl").unwrap(),
            "https://itemcdn.example.com/desc?id=1"
        );
        assert_eq!(find_string_field(html, "unit").unwrap(), "件");
        assert_eq!(find_number_fields(html, "saleCount"), vec!["1520".to_string()]);
        assert!(find_string_field(html, "missing").is_none());
    }
}
