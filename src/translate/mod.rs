//! Text translation with backend cascade, quality gate and fallback labels
//!
//! Input is stripped of markup first. Short text (a product name) is sent
//! whole; longer text is split at sentence boundaries into chunks. Each piece
//! walks the backend cascade and the first non-trivial answer wins. When no
//! backend answers, a localized label for the inferred product category is
//! returned instead, so the output is never empty for non-empty input.

pub mod backends;
pub mod category;
pub mod language;
pub mod quality;

pub use backends::*;
pub use category::{infer_category, ProductCategory};
pub use language::{Language, Script};
pub use quality::{QualityGate, QualityIssue};

use crate::config::ScrapeConfig;
use crate::events::{EventSink, PipelineEvent};
use crate::fetch::build_agent;
use crate::text::html_to_text;

/// Backend output at or below this many chars is treated as a failure
const MIN_TRANSLATION_CHARS: usize = 2;

/// A translation together with its quality-gate verdict
#[derive(Debug, Clone, PartialEq)]
pub struct GatedTranslation {
    pub text: String,
    /// Issue still present in `text`, if any. Accepted best-effort.
    pub issue: Option<QualityIssue>,
    /// Whether a contamination retry was made
    pub retried: bool,
}

pub struct Translator {
    backends: Vec<Box<dyn TranslationBackend>>,
    source: Language,
    target: Language,
    gate: QualityGate,
    name_length_threshold: usize,
    max_chunk_chars: usize,
}

impl Translator {
    pub fn new(backends: Vec<Box<dyn TranslationBackend>>, config: &ScrapeConfig) -> Self {
        Self {
            backends,
            source: config.source_language,
            target: config.target_language,
            gate: QualityGate::new(
                config.source_language,
                config.target_language,
                config.quality.clone(),
            ),
            name_length_threshold: config.name_length_threshold,
            max_chunk_chars: config.max_chunk_chars.max(1),
        }
    }

    /// Translator over the public web backends
    pub fn from_config(config: &ScrapeConfig) -> Self {
        let agent = build_agent(&config.user_agent, config.translate_timeout());
        let backends = default_backends(agent, config.libretranslate_url.clone());
        Self::new(backends, config)
    }

    pub fn target(&self) -> Language {
        self.target
    }

    fn is_passthrough(&self, clean: &str) -> bool {
        clean.is_empty() || self.source == self.target
    }

    /// Translate `text`, falling back to a category label when every
    /// backend fails
    pub fn translate(&self, text: &str, events: &dyn EventSink) -> String {
        let clean = html_to_text(text);
        if self.is_passthrough(&clean) {
            return clean;
        }

        let translated = if clean.chars().count() < self.name_length_threshold {
            self.run_backends(&clean, events)
        } else {
            self.translate_chunked(&clean, events)
        };

        translated.unwrap_or_else(|| {
            let label = match infer_category(&clean) {
                Some(category) => self.target.category_label(category),
                None => self.target.generic_product_label(),
            };
            events.emit(PipelineEvent::TranslationFallback {
                label: label.to_string(),
            });
            label.to_string()
        })
    }

    /// Translate and score the result. A contaminated result is retried
    /// exactly once; the retry is kept whatever its score.
    pub fn translate_gated(&self, text: &str, events: &dyn EventSink) -> GatedTranslation {
        let first = self.translate(text, events);
        if self.source == self.target || first.is_empty() {
            return GatedTranslation {
                text: first,
                issue: None,
                retried: false,
            };
        }

        let issue = match self.gate.check(&first) {
            Ok(()) => {
                return GatedTranslation {
                    text: first,
                    issue: None,
                    retried: false,
                }
            }
            Err(issue) => issue,
        };

        events.emit(PipelineEvent::QualityGateFailed {
            reason: issue.to_string(),
        });
        if !issue.is_contamination() {
            return GatedTranslation {
                text: first,
                issue: Some(issue),
                retried: false,
            };
        }

        let second = self.translate(text, events);
        let verdict = self.gate.check(&second).err();
        events.emit(PipelineEvent::TranslationRetried {
            accepted: verdict.is_none(),
        });
        GatedTranslation {
            text: second,
            issue: verdict,
            retried: true,
        }
    }

    /// Backend cascade only; `None` when every backend fails
    pub fn translate_backends_only(&self, text: &str, events: &dyn EventSink) -> Option<String> {
        let clean = html_to_text(text);
        if self.is_passthrough(&clean) {
            return Some(clean).filter(|c| !c.is_empty());
        }
        self.run_backends(&clean, events)
    }

    fn translate_chunked(&self, clean: &str, events: &dyn EventSink) -> Option<String> {
        let chunks = split_into_chunks(clean, self.max_chunk_chars);
        let mut translated_any = false;
        let mut parts = Vec::with_capacity(chunks.len());

        for chunk in &chunks {
            match self.run_backends(chunk, events) {
                Some(t) => {
                    translated_any = true;
                    parts.push(t);
                }
                // keep the source text for chunks no backend could handle
                None => parts.push(chunk.clone()),
            }
        }

        translated_any.then(|| parts.join(" "))
    }

    fn run_backends(&self, text: &str, events: &dyn EventSink) -> Option<String> {
        for backend in &self.backends {
            match backend.translate(text, self.source, self.target) {
                Ok(out) if out.trim().chars().count() > MIN_TRANSLATION_CHARS => {
                    return Some(out.trim().to_string());
                }
                Ok(out) => events.emit(PipelineEvent::BackendFailed {
                    backend: backend.name().to_string(),
                    reason: format!("trivial output '{}'", out.trim()),
                }),
                Err(e) => events.emit(PipelineEvent::BackendFailed {
                    backend: backend.name().to_string(),
                    reason: e.to_string(),
                }),
            }
        }
        None
    }
}

fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?' | '。' | '！' | '？' | '\n')
}

/// Split text into chunks of at most `max_chars` chars, breaking after
/// sentence terminators where possible
pub fn split_into_chunks(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut sentences: Vec<String> = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        current.push(c);
        if is_sentence_end(c) {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }

    let mut chunks = Vec::new();
    let mut chunk = String::new();
    let mut chunk_len = 0;
    for sentence in sentences {
        let len = sentence.chars().count();
        if chunk_len + len > max_chars && !chunk.is_empty() {
            chunks.push(std::mem::take(&mut chunk));
            chunk_len = 0;
        }
        if len > max_chars {
            // a single sentence over the limit is hard-split
            let chars: Vec<char> = sentence.chars().collect();
            for piece in chars.chunks(max_chars) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        chunk.push_str(&sentence);
        chunk_len += len;
    }
    if !chunk.is_empty() {
        chunks.push(chunk);
    }

    chunks
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}
