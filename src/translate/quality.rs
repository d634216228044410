//! Heuristic quality gate for translated text

use std::collections::HashSet;

use thiserror::Error;

use crate::config::QualityThresholds;
use crate::translate::language::{Language, Script};

/// Why a translation was flagged
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QualityIssue {
    #[error("{:.0}% of characters are still in the source script", .ratio * 100.0)]
    SourceContamination { ratio: f64 },

    #[error("only {:.0}% of characters are in the target script", .ratio * 100.0)]
    MissingTargetScript { ratio: f64 },

    #[error("only {:.0}% of characters are Latin letters", .ratio * 100.0)]
    LowLatinRatio { ratio: f64 },

    #[error("output too short ({len} characters)")]
    TooShort { len: usize },

    #[error("repetitive characters ({:.0}% unique)", .ratio * 100.0)]
    RepetitiveChars { ratio: f64 },

    #[error("repetitive words ({:.0}% unique)", .ratio * 100.0)]
    RepetitiveWords { ratio: f64 },
}

impl QualityIssue {
    /// Contamination is the only issue that earns a retry
    pub fn is_contamination(&self) -> bool {
        matches!(self, QualityIssue::SourceContamination { .. })
    }
}

/// Scores translated output for one source/target pair
#[derive(Debug, Clone)]
pub struct QualityGate {
    source: Language,
    target: Language,
    thresholds: QualityThresholds,
}

impl QualityGate {
    pub fn new(source: Language, target: Language, thresholds: QualityThresholds) -> Self {
        Self {
            source,
            target,
            thresholds,
        }
    }

    /// Run every check in order and report the first failure
    pub fn check(&self, text: &str) -> Result<(), QualityIssue> {
        let t = &self.thresholds;
        let chars: Vec<char> = text.trim().chars().collect();
        let len = chars.len();
        if len == 0 {
            return Err(QualityIssue::TooShort { len });
        }

        let ratio_of = |pred: &dyn Fn(char) -> bool| {
            chars.iter().filter(|c| pred(**c)).count() as f64 / len as f64
        };

        let source_script = self.source.script();
        let target_script = self.target.script();

        if self.source != self.target && source_script != target_script {
            let ratio = ratio_of(&|c| source_script.contains(c));
            if ratio > t.max_source_script_ratio {
                return Err(QualityIssue::SourceContamination { ratio });
            }
        }

        if target_script.is_right_to_left() {
            let ratio = ratio_of(&|c| target_script.contains(c));
            if ratio < t.min_rtl_script_ratio {
                return Err(QualityIssue::MissingTargetScript { ratio });
            }
        } else if target_script == Script::Latin {
            let ratio = ratio_of(&|c| c.is_ascii_alphabetic());
            if ratio < t.min_latin_ratio {
                return Err(QualityIssue::LowLatinRatio { ratio });
            }
        }

        if len < t.min_length {
            return Err(QualityIssue::TooShort { len });
        }

        // case-insensitive: "AaAa" is as repetitive as "aaaa"
        if len > t.unique_chars_min_length {
            let unique = chars
                .iter()
                .flat_map(|c| c.to_lowercase())
                .collect::<HashSet<_>>()
                .len();
            let ratio = unique as f64 / len as f64;
            if ratio < t.min_unique_char_ratio {
                return Err(QualityIssue::RepetitiveChars { ratio });
            }
        }

        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() > t.unique_words_min_count {
            let unique = words.iter().collect::<HashSet<_>>().len();
            let ratio = unique as f64 / words.len() as f64;
            if ratio < t.min_unique_word_ratio {
                return Err(QualityIssue::RepetitiveWords { ratio });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(target: Language) -> QualityGate {
        QualityGate::new(Language::Chinese, target, QualityThresholds::default())
    }

    #[test]
    fn test_clean_translation_passes() {
        assert_eq!(gate(Language::English).check("Wireless Bluetooth Headphones"), Ok(()));
    }

    #[test]
    fn test_untranslated_is_contamination() {
        let issue = gate(Language::English).check("这是一个测试产品").unwrap_err();
        assert!(issue.is_contamination());
    }

    #[test]
    fn test_rtl_target_needs_target_script() {
        let issue = gate(Language::Arabic).check("Wireless Bluetooth Headphones").unwrap_err();
        assert!(matches!(issue, QualityIssue::MissingTargetScript { .. }));
        assert_eq!(gate(Language::Arabic).check("سماعات بلوتوث لاسلكية"), Ok(()));
    }

    #[test]
    fn test_latin_ratio() {
        let issue = gate(Language::English).check("1234567890 ---- 99").unwrap_err();
        assert!(matches!(issue, QualityIssue::LowLatinRatio { .. }));
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            gate(Language::English).check("Lamp"),
            Err(QualityIssue::TooShort { len: 4 })
        );
        assert_eq!(gate(Language::English).check("   "), Err(QualityIssue::TooShort { len: 0 }));
    }

    #[test]
    fn test_repetition() {
        let chars = "ab".repeat(60);
        assert!(matches!(
            gate(Language::English).check(&chars),
            Err(QualityIssue::RepetitiveChars { .. })
        ));

        // 52 distinct characters but only 26 ignoring case
        let mixed_case: String = ('a'..='z')
            .flat_map(|c| [c, c.to_ascii_uppercase()])
            .cycle()
            .take(200)
            .collect();
        assert!(matches!(
            gate(Language::English).check(&mixed_case),
            Err(QualityIssue::RepetitiveChars { .. })
        ));

        let words = "good lamp ".repeat(8);
        assert!(matches!(
            gate(Language::English).check(&words),
            Err(QualityIssue::RepetitiveWords { .. })
        ));
    }
}
