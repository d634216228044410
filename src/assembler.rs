//! Record assembly
//!
//! Turns raw [`ExtractedFields`] into an immutable [`ProductRecord`]:
//! translation, fallback labels, SKU synthesis and categories happen here.

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::events::PipelineEvent;
use crate::extractors::{normalize_price, ExtractedFields, NO_DESCRIPTION, UNKNOWN_PRICE};
use crate::pipeline::ScrapeContext;
use crate::text::{clean_description, summarize};
use crate::translate::Translator;

/// Canonical output unit for one product page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    name: String,
    description: String,
    short_description: String,
    price: String,
    sku: String,
    images: Vec<String>,
    categories: Vec<String>,
    attributes: BTreeMap<String, String>,
    source_url: String,
}

impl ProductRecord {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn short_description(&self) -> &str {
        &self.short_description
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn sku(&self) -> &str {
        &self.sku
    }

    /// Never empty
    pub fn images(&self) -> &[String] {
        &self.images
    }

    /// Default category first, no duplicates
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }
}

/// Timestamp-derived, strictly increasing SKU tokens
#[derive(Debug)]
pub struct SkuGenerator {
    prefix: String,
    last: Mutex<i64>,
}

impl SkuGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            last: Mutex::new(0),
        }
    }

    pub fn next(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let token = now.max(*last + 1);
        *last = token;
        format!("{}-{}", self.prefix, token)
    }
}

pub struct RecordAssembler<'a> {
    ctx: &'a ScrapeContext,
    translator: &'a Translator,
    skus: &'a SkuGenerator,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(ctx: &'a ScrapeContext, translator: &'a Translator, skus: &'a SkuGenerator) -> Self {
        Self {
            ctx,
            translator,
            skus,
        }
    }

    fn name(&self, fields: &ExtractedFields) -> String {
        let events = self.ctx.events();
        let generic = self.translator.target().generic_product_label();

        let Some(source) = &fields.name else {
            return generic.to_string();
        };
        let translated = self.translator.translate_gated(&source.value, events).text;
        if translated.trim().is_empty() {
            generic.to_string()
        } else {
            translated
        }
    }

    /// Returns `(description, short_description)`
    fn descriptions(&self, fields: &ExtractedFields) -> (String, String) {
        let events = self.ctx.events();
        let description = match &fields.description {
            Some(found) => {
                let gated = self.translator.translate_gated(&found.value, events);
                clean_description(&gated.text)
            }
            None => NO_DESCRIPTION.to_string(),
        };

        if self.ctx.config().emit_descriptions {
            let short = summarize(&description);
            (description, short)
        } else {
            (String::new(), String::new())
        }
    }

    fn categories(&self, fields: &ExtractedFields) -> Vec<String> {
        let mut categories = vec![self.ctx.config().default_category.clone()];
        let leaf = fields
            .leaf_category
            .as_deref()
            .and_then(|leaf| self.translator.translate_backends_only(leaf, self.ctx.events()));
        if let Some(leaf) = leaf {
            if !categories.contains(&leaf) {
                categories.push(leaf);
            }
        }
        categories
    }

    pub fn assemble(&self, fields: &ExtractedFields, source_url: &str) -> ProductRecord {
        let config = self.ctx.config();

        let price = normalize_price(&fields.price).unwrap_or_else(|| UNKNOWN_PRICE.to_string());
        let images = if fields.images.is_empty() {
            vec![config.placeholder_image.clone()]
        } else {
            fields.images.clone()
        };
        let (description, short_description) = self.descriptions(fields);

        let record = ProductRecord {
            name: self.name(fields),
            description,
            short_description,
            price,
            sku: self.skus.next(),
            images,
            categories: self.categories(fields),
            attributes: fields.attributes.clone(),
            source_url: source_url.to_string(),
        };

        self.ctx.emit(PipelineEvent::RecordAssembled {
            url: record.source_url.clone(),
            sku: record.sku.clone(),
        });
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeConfig;
    use crate::error::TranslateError;
    use crate::events::RecordingSink;
    use crate::extractors::ExtractionCandidate;
    use crate::translate::{Language, TranslationBackend};
    use std::sync::Arc;

    /// Prefixes the input so translated text is recognizable
    struct Tagged;

    impl TranslationBackend for Tagged {
        fn name(&self) -> &str {
            "tagged"
        }

        fn translate(&self, text: &str, _: Language, _: Language) -> Result<String, TranslateError> {
            Ok(match text {
                "旗舰产品" => "Flagship Product".to_string(),
                "耳机" => "Headphones".to_string(),
                other => format!("Translated text of length {}. More detail here.", other.chars().count()),
            })
        }
    }

    fn candidate(value: &str) -> Option<ExtractionCandidate<String>> {
        Some(ExtractionCandidate {
            value: value.to_string(),
            method: "test",
            rank: 0,
        })
    }

    fn fields() -> ExtractedFields {
        ExtractedFields {
            name: candidate("旗舰产品"),
            price: "¥99".to_string(),
            images: vec!["https://cdn.example.com/a.jpg".to_string()],
            description: candidate("<p>很好的产品，质量上乘</p>"),
            attributes: BTreeMap::from([("材质".to_string(), "棉".to_string())]),
            leaf_category: Some("耳机".to_string()),
        }
    }

    fn assemble(config: ScrapeConfig, fields: &ExtractedFields) -> ProductRecord {
        let translator = Translator::new(vec![Box::new(Tagged)], &config);
        let skus = SkuGenerator::new(config.sku_prefix.clone());
        let ctx = ScrapeContext::new(config, Arc::new(RecordingSink::new()));
        RecordAssembler::new(&ctx, &translator, &skus).assemble(fields, "https://detail.example.com/offer/1.html")
    }

    #[test]
    fn test_assemble_blanks_descriptions_by_default() {
        let record = assemble(ScrapeConfig::default(), &fields());

        assert_eq!(record.name(), "Flagship Product");
        assert_eq!(record.price(), "99");
        assert_eq!(record.description(), "");
        assert_eq!(record.short_description(), "");
        assert_eq!(record.categories(), ["Imported Products", "Headphones"]);
        assert_eq!(record.attributes()["材质"], "棉");
        assert!(record.sku().starts_with("1688-"));
        assert_eq!(record.source_url(), "https://detail.example.com/offer/1.html");
    }

    #[test]
    fn test_emit_descriptions_switch() {
        let config = ScrapeConfig {
            emit_descriptions: true,
            ..ScrapeConfig::default()
        };
        let record = assemble(config, &fields());
        assert_eq!(record.description(), "Translated text of length 10. More detail here.");
        assert_eq!(record.short_description(), "Translated text of length 10. More detail here.");
    }

    #[test]
    fn test_fallbacks() {
        let config = ScrapeConfig {
            emit_descriptions: true,
            ..ScrapeConfig::default()
        };
        let empty = ExtractedFields {
            name: None,
            price: "面议".to_string(),
            images: vec![],
            description: None,
            attributes: BTreeMap::new(),
            leaf_category: None,
        };
        let record = assemble(config.clone(), &empty);

        assert_eq!(record.name(), "High-Quality Product");
        assert_eq!(record.price(), "0");
        assert_eq!(record.images(), [config.placeholder_image.clone()]);
        assert_eq!(record.description(), NO_DESCRIPTION);
        assert_eq!(record.categories(), ["Imported Products"]);
    }

    #[test]
    fn test_sku_tokens_increase() {
        let skus = SkuGenerator::new("1688");
        let tokens: Vec<i64> = (0..5)
            .map(|_| {
                let sku = skus.next();
                sku.trim_start_matches("1688-").parse().unwrap()
            })
            .collect();
        assert!(tokens.windows(2).all(|w| w[1] > w[0]));
    }
}
