//! Newline-delimited URL lists

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{ScrapeError, ScrapeResult};

/// One URL per line. Blank lines and `#` comments are skipped; duplicates
/// keep their first position.
pub fn parse_url_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let mut duplicates = 0usize;

    for line in text.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if seen.insert(line) {
            urls.push(line.to_string());
        } else {
            duplicates += 1;
        }
    }

    if duplicates > 0 {
        info!("Removed {} duplicate URLs", duplicates);
    }
    urls
}

pub fn read_url_file(path: &Path) -> ScrapeResult<Vec<String>> {
    let text = fs::read_to_string(path).map_err(|source| ScrapeError::UrlList {
        path: path.display().to_string(),
        source,
    })?;
    Ok(parse_url_list(&text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_list() {
        let text = "
            # batch 1
            https://detail.1688.com/offer/1.html

            https://detail.1688.com/offer/2.html
            https://detail.1688.com/offer/1.html
        ";
        assert_eq!(
            parse_url_list(text),
            vec![
                "https://detail.1688.com/offer/1.html",
                "https://detail.1688.com/offer/2.html"
            ]
        );
    }

    #[test]
    fn test_read_url_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.txt");
        fs::write(&path, "https://a.example.com/1\n#skip\n").unwrap();
        assert_eq!(read_url_file(&path).unwrap(), vec!["https://a.example.com/1"]);

        let missing = read_url_file(&dir.path().join("none.txt")).unwrap_err();
        assert!(matches!(missing, ScrapeError::UrlList { .. }));
    }
}
