//! Product catalog extraction for 1688.com offer pages
//!
//! Turns a list of product page URLs into WooCommerce import rows:
//! - field extraction through ordered strategy cascades (name, price,
//!   description) and an image union
//! - image URL canonicalization and deduplication
//! - machine translation over a backend cascade with a quality gate
//! - record assembly with fallback labels and generated SKUs
//! - CSV and JSON batch export

pub mod assembler;
pub mod config;
pub mod error;
pub mod events;
pub mod export;
pub mod extractors;
pub mod fetch;
pub mod image_url;
pub mod pipeline;
pub mod snapshot;
pub mod text;
pub mod translate;
pub mod url_list;

pub use assembler::{ProductRecord, RecordAssembler, SkuGenerator};
pub use config::ScrapeConfig;
pub use error::{ScrapeError, ScrapeResult};
pub use events::{EventSink, PipelineEvent, RecordingSink, TracingSink};
pub use pipeline::{BatchReport, Pipeline, ScrapeContext, StopFlag, UrlFailure};
