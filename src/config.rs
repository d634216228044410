//! Scrape configuration
//!
//! Plain values consumed by the pipeline. Every field has a default so a
//! partial TOML file is enough to override only what differs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::translate::Language;

/// Main scrape configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Language product text is written in on the source site
    pub source_language: Language,

    /// Language of the exported records
    pub target_language: Language,

    /// Cooldown applied before every request, in seconds
    pub request_delay_secs: f64,

    /// Process at most this many URLs
    pub url_limit: Option<usize>,

    /// Main page fetch timeout in seconds
    pub page_timeout_secs: u64,

    /// Auxiliary detail document fetching
    pub detail: DetailFetchConfig,

    /// Per-request timeout for translation backends, in seconds
    pub translate_timeout_secs: u64,

    pub user_agent: String,

    /// Category every record carries
    pub default_category: String,

    /// SKU prefix, followed by a timestamp-derived token
    pub sku_prefix: String,

    /// Image used when no candidate survives normalization
    pub placeholder_image: String,

    /// Hosts scanned for bare image URLs in raw HTML
    pub cdn_hosts: Vec<String>,

    /// Cap on URLs accepted from the per-image-tag scan
    pub max_tag_images: usize,

    /// Text shorter than this (in chars) takes the name translation path
    pub name_length_threshold: usize,

    /// Maximum chunk size (in chars) sent to a backend on the description path
    pub max_chunk_chars: usize,

    /// Keep translated descriptions in the record instead of blanking them
    pub emit_descriptions: bool,

    /// Directory receiving raw HTML snapshots
    pub snapshot_dir: Option<PathBuf>,

    /// Self-hosted LibreTranslate endpoint; the backend is skipped when unset
    pub libretranslate_url: Option<String>,

    pub quality: QualityThresholds,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            source_language: Language::Chinese,
            target_language: Language::English,
            request_delay_secs: 2.0,
            url_limit: None,
            page_timeout_secs: 30,
            detail: DetailFetchConfig::default(),
            translate_timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            default_category: "Imported Products".to_string(),
            sku_prefix: "1688".to_string(),
            placeholder_image: "https://via.placeholder.com/800x800?text=No+Image+Available".to_string(),
            cdn_hosts: vec!["cbu01.alicdn.com".to_string()],
            max_tag_images: 20,
            name_length_threshold: 200,
            max_chunk_chars: 1500,
            emit_descriptions: false,
            snapshot_dir: None,
            libretranslate_url: None,
            quality: QualityThresholds::default(),
        }
    }
}

impl ScrapeConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn request_delay(&self) -> Duration {
        secs_to_duration(self.request_delay_secs)
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_secs(self.detail.timeout_secs)
    }

    pub fn translate_timeout(&self) -> Duration {
        Duration::from_secs(self.translate_timeout_secs)
    }

    pub fn detail_retry_delay(&self) -> Duration {
        self.detail.retry_delay()
    }
}

/// Bounded retry policy for the auxiliary detail document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailFetchConfig {
    pub max_attempts: u32,
    pub timeout_secs: u64,
    pub retry_delay_ms: u64,
    /// Bodies at or below this size count as a failed attempt
    pub min_body_bytes: usize,
}

impl DetailFetchConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

impl Default for DetailFetchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            timeout_secs: 10,
            retry_delay_ms: 1000,
            min_body_bytes: 100,
        }
    }
}

/// Thresholds of the translation quality gate, as ratios in `0.0..=1.0`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    /// Max share of source-script chars in a translated output
    pub max_source_script_ratio: f64,
    /// Min share of target-script chars when the target is right-to-left
    pub min_rtl_script_ratio: f64,
    /// Min share of ASCII letters when the target is Latin-script
    pub min_latin_ratio: f64,
    pub min_length: usize,
    /// Unique-character check applies above this length
    pub unique_chars_min_length: usize,
    pub min_unique_char_ratio: f64,
    /// Unique-word check applies above this word count
    pub unique_words_min_count: usize,
    pub min_unique_word_ratio: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            max_source_script_ratio: 0.3,
            min_rtl_script_ratio: 0.1,
            min_latin_ratio: 0.3,
            min_length: 10,
            unique_chars_min_length: 100,
            min_unique_char_ratio: 0.2,
            unique_words_min_count: 10,
            min_unique_word_ratio: 0.3,
        }
    }
}

/// Negative and NaN delays mean no delay; delays too large for a
/// `Duration` saturate.
fn secs_to_duration(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScrapeConfig::default();
        assert_eq!(config.target_language, Language::English);
        assert_eq!(config.detail.max_attempts, 2);
        assert_eq!(config.max_tag_images, 20);
        assert!(!config.emit_descriptions);
        assert_eq!(config.request_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_toml() {
        let config = ScrapeConfig::from_toml_str(
            r#"
            target_language = "ar"
            request_delay_secs = 0.5

            [quality]
            min_length = 4
            "#,
        )
        .unwrap();

        assert_eq!(config.target_language, Language::Arabic);
        assert_eq!(config.request_delay(), Duration::from_millis(500));
        assert_eq!(config.quality.min_length, 4);
        assert_eq!(config.quality.max_source_script_ratio, 0.3);
        assert_eq!(config.default_category, "Imported Products");
    }

    #[test]
    fn test_negative_delay_is_zero() {
        let config = ScrapeConfig {
            request_delay_secs: -1.0,
            ..ScrapeConfig::default()
        };
        assert_eq!(config.request_delay(), Duration::ZERO);
    }

    #[test]
    fn test_huge_delay_saturates() {
        for secs in [1e20, f64::INFINITY] {
            let config = ScrapeConfig {
                request_delay_secs: secs,
                ..ScrapeConfig::default()
            };
            assert_eq!(config.request_delay(), Duration::MAX);
        }
        let config = ScrapeConfig {
            request_delay_secs: f64::NAN,
            ..ScrapeConfig::default()
        };
        assert_eq!(config.request_delay(), Duration::ZERO);
    }
}
