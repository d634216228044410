//! Remote translation backends
//!
//! Each backend is a thin HTTP call plus a pure response parser, so the
//! parsers can be tested against canned payloads without the network.

use serde_json::Value;

use crate::error::TranslateError;
use crate::translate::language::Language;

/// One translation service in the cascade
pub trait TranslationBackend: Send + Sync {
    fn name(&self) -> &str;

    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslateError>;
}

fn transport(backend: &str, e: impl std::fmt::Display) -> TranslateError {
    TranslateError::Transport {
        backend: backend.to_string(),
        reason: e.to_string(),
    }
}

fn bad_response(backend: &str, reason: impl Into<String>) -> TranslateError {
    TranslateError::Response {
        backend: backend.to_string(),
        reason: reason.into(),
    }
}

fn read_body(backend: &str, resp: ureq::http::Response<ureq::Body>) -> Result<String, TranslateError> {
    resp.into_body()
        .read_to_string()
        .map_err(|e| transport(backend, e))
}

/// Public web endpoint used by the Google Translate widget
pub struct GoogleWebBackend {
    agent: ureq::Agent,
    endpoint: String,
}

impl GoogleWebBackend {
    pub const NAME: &'static str = "google";

    pub fn new(agent: ureq::Agent) -> Self {
        Self {
            agent,
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
        }
    }
}

impl TranslationBackend for GoogleWebBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslateError> {
        let resp = self
            .agent
            .get(&self.endpoint)
            .query("client", "gtx")
            .query("sl", source.web_code())
            .query("tl", target.web_code())
            .query("dt", "t")
            .query("q", text)
            .call()
            .map_err(|e| transport(Self::NAME, e))?;
        let body = read_body(Self::NAME, resp)?;
        parse_google_response(&body)
    }
}

/// Join the translated segments of a `translate_a/single` payload.
///
/// The payload looks like `[[["translated","source",...],...],null,"zh-CN",...]`.
pub fn parse_google_response(body: &str) -> Result<String, TranslateError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| bad_response(GoogleWebBackend::NAME, e.to_string()))?;

    let segments = value
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| bad_response(GoogleWebBackend::NAME, "missing segment list"))?;

    let translated: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();

    if translated.trim().is_empty() {
        return Err(TranslateError::Empty {
            backend: GoogleWebBackend::NAME.to_string(),
        });
    }
    Ok(translated)
}

/// MyMemory public API
pub struct MyMemoryBackend {
    agent: ureq::Agent,
    endpoint: String,
}

impl MyMemoryBackend {
    pub const NAME: &'static str = "mymemory";

    pub fn new(agent: ureq::Agent) -> Self {
        Self {
            agent,
            endpoint: "https://api.mymemory.translated.net/get".to_string(),
        }
    }
}

impl TranslationBackend for MyMemoryBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslateError> {
        let langpair = format!("{}|{}", source.web_code(), target.web_code());
        let resp = self
            .agent
            .get(&self.endpoint)
            .query("q", text)
            .query("langpair", &langpair)
            .call()
            .map_err(|e| transport(Self::NAME, e))?;
        let body = read_body(Self::NAME, resp)?;
        parse_mymemory_response(&body)
    }
}

/// Read `responseData.translatedText`, rejecting quota warnings
pub fn parse_mymemory_response(body: &str) -> Result<String, TranslateError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| bad_response(MyMemoryBackend::NAME, e.to_string()))?;

    if let Some(status) = value.get("responseStatus").and_then(Value::as_u64) {
        if status != 200 {
            return Err(bad_response(
                MyMemoryBackend::NAME,
                format!("responseStatus {status}"),
            ));
        }
    }

    let text = value
        .pointer("/responseData/translatedText")
        .and_then(Value::as_str)
        .ok_or_else(|| bad_response(MyMemoryBackend::NAME, "missing translatedText"))?;

    if text.starts_with("MYMEMORY WARNING") {
        return Err(bad_response(MyMemoryBackend::NAME, text));
    }
    if text.trim().is_empty() {
        return Err(TranslateError::Empty {
            backend: MyMemoryBackend::NAME.to_string(),
        });
    }
    Ok(text.to_string())
}

/// Self-hosted LibreTranslate instance
pub struct LibreTranslateBackend {
    agent: ureq::Agent,
    base_url: Option<String>,
}

impl LibreTranslateBackend {
    pub const NAME: &'static str = "libretranslate";

    pub fn new(agent: ureq::Agent, base_url: Option<String>) -> Self {
        Self { agent, base_url }
    }
}

impl TranslationBackend for LibreTranslateBackend {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn translate(
        &self,
        text: &str,
        source: Language,
        target: Language,
    ) -> Result<String, TranslateError> {
        let base = self
            .base_url
            .as_deref()
            .ok_or_else(|| TranslateError::NotConfigured {
                backend: Self::NAME.to_string(),
            })?;
        let url = format!("{}/translate", base.trim_end_matches('/'));

        let resp = self
            .agent
            .post(&url)
            .send_form([
                ("q", text),
                ("source", source.code()),
                ("target", target.code()),
                ("format", "text"),
            ])
            .map_err(|e| transport(Self::NAME, e))?;
        let body = read_body(Self::NAME, resp)?;
        parse_libretranslate_response(&body)
    }
}

pub fn parse_libretranslate_response(body: &str) -> Result<String, TranslateError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| bad_response(LibreTranslateBackend::NAME, e.to_string()))?;

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(bad_response(LibreTranslateBackend::NAME, error));
    }

    match value.get("translatedText").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        Some(_) => Err(TranslateError::Empty {
            backend: LibreTranslateBackend::NAME.to_string(),
        }),
        None => Err(bad_response(LibreTranslateBackend::NAME, "missing translatedText")),
    }
}

/// The default cascade: Google, MyMemory, then LibreTranslate
pub fn default_backends(
    agent: ureq::Agent,
    libretranslate_url: Option<String>,
) -> Vec<Box<dyn TranslationBackend>> {
    vec![
        Box::new(GoogleWebBackend::new(agent.clone())),
        Box::new(MyMemoryBackend::new(agent.clone())),
        Box::new(LibreTranslateBackend::new(agent, libretranslate_url)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_google_segments() {
        let body = r#"[[["Wireless headphones. ","无线耳机。",null,null,10],["Blue","蓝色",null,null,10]],null,"zh-CN"]"#;
        assert_eq!(
            parse_google_response(body).unwrap(),
            "Wireless headphones. Blue"
        );
    }

    #[test]
    fn test_parse_google_garbage() {
        assert!(matches!(
            parse_google_response("<html>blocked</html>"),
            Err(TranslateError::Response { .. })
        ));
        assert!(matches!(
            parse_google_response(r#"[[],null,"zh-CN"]"#),
            Err(TranslateError::Empty { .. })
        ));
    }

    #[test]
    fn test_parse_mymemory() {
        let body = r#"{"responseData":{"translatedText":"Flagship product","match":0.85},"responseStatus":200}"#;
        assert_eq!(parse_mymemory_response(body).unwrap(), "Flagship product");

        let quota = r#"{"responseData":{"translatedText":"MYMEMORY WARNING: YOU USED ALL AVAILABLE FREE TRANSLATIONS FOR TODAY"},"responseStatus":200}"#;
        assert!(parse_mymemory_response(quota).is_err());

        let failed = r#"{"responseData":{"translatedText":"x"},"responseStatus":403}"#;
        assert!(parse_mymemory_response(failed).is_err());
    }

    #[test]
    fn test_parse_libretranslate() {
        assert_eq!(
            parse_libretranslate_response(r#"{"translatedText":"Desk lamp"}"#).unwrap(),
            "Desk lamp"
        );
        assert!(parse_libretranslate_response(r#"{"error":"Invalid request"}"#).is_err());
    }

    #[test]
    fn test_unconfigured_libretranslate() {
        let backend = LibreTranslateBackend::new(ureq::Agent::new_with_defaults(), None);
        assert!(matches!(
            backend.translate("测试", Language::Chinese, Language::English),
            Err(TranslateError::NotConfigured { .. })
        ));
    }
}
