//! Plain-text helpers shared by extractors, the translator and the assembler

use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static STYLE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style[^>]*>.*?</style>").unwrap());

static SCRIPT_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());

static MARKETPLACE_DOMAIN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:https?://)?(?:[a-z0-9-]+\.)*(?:1688|alibaba|taobao|tmall|aliexpress)\.com\S*")
        .unwrap()
});

/// Collapse every whitespace run to a single space and trim
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markup, keeping text content separated by whitespace.
///
/// `<style>` and `<script>` bodies are dropped first. Text without a `<`
/// is only whitespace-collapsed.
pub fn html_to_text(html: &str) -> String {
    if !html.contains('<') {
        return collapse_whitespace(html);
    }

    let without_style = STYLE_BLOCK.replace_all(html, " ");
    let without_script = SCRIPT_BLOCK.replace_all(&without_style, " ");
    let fragment = Html::parse_fragment(&without_script);

    let pieces: Vec<&str> = fragment.root_element().text().collect();
    collapse_whitespace(&pieces.join(" "))
}

/// Remove style blocks and marketplace domain mentions from a description
pub fn clean_description(text: &str) -> String {
    let without_style = STYLE_BLOCK.replace_all(text, " ");
    let without_domains = MARKETPLACE_DOMAIN.replace_all(&without_style, "");
    collapse_whitespace(&without_domains)
}

/// Short summary: the first two sentences, capped at 150 characters
pub fn summarize(text: &str) -> String {
    let sentences: Vec<&str> = text
        .split(['.', '!', '?', '。', '！', '？'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(2)
        .collect();

    if sentences.is_empty() {
        return String::new();
    }

    let summary = format!("{}.", sentences.join(". "));
    if summary.chars().count() > 150 {
        let cut: String = summary.chars().take(147).collect();
        format!("{cut}...")
    } else {
        summary
    }
}

/// Escape text for embedding in generated HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
