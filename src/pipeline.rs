//! Sequential batch pipeline
//!
//! One URL at a time: fetch, extract, translate, assemble. A URL that
//! cannot be fetched is recorded as a failure and skipped; the batch goes
//! on. The stop flag is checked between URLs only.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::assembler::{ProductRecord, RecordAssembler, SkuGenerator};
use crate::config::ScrapeConfig;
use crate::error::FetchError;
use crate::events::{EventSink, PipelineEvent, Stage, TracingSink};
use crate::extractors::{DetailFetch, FieldExtractor, PageDocument};
use crate::fetch::{HttpFetcher, PageFetcher, Throttle};
use crate::snapshot::SnapshotStore;
use crate::translate::Translator;

/// Cooperative cancellation, checked between URLs
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Configuration, event sink and stop flag threaded through every stage
pub struct ScrapeContext {
    config: ScrapeConfig,
    events: Arc<dyn EventSink>,
    stop: StopFlag,
}

impl ScrapeContext {
    pub fn new(config: ScrapeConfig, events: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            events,
            stop: StopFlag::new(),
        }
    }

    /// Context reporting through `tracing`
    pub fn with_tracing(config: ScrapeConfig) -> Self {
        Self::new(config, Arc::new(TracingSink))
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    pub fn events(&self) -> &dyn EventSink {
        self.events.as_ref()
    }

    pub fn emit(&self, event: PipelineEvent) {
        self.events.emit(event);
    }

    pub fn stop_flag(&self) -> &StopFlag {
        &self.stop
    }
}

/// A URL that produced no record
#[derive(Debug, Clone, PartialEq)]
pub struct UrlFailure {
    pub url: String,
    pub stage: Stage,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    /// Assembled records, in input order
    pub records: Vec<ProductRecord>,
    pub failures: Vec<UrlFailure>,
    /// True if the stop flag ended the batch before the last URL
    pub stopped_early: bool,
}

pub struct Pipeline {
    ctx: ScrapeContext,
    fetcher: Box<dyn PageFetcher>,
    translator: Translator,
    throttle: Throttle,
    snapshots: SnapshotStore,
    skus: SkuGenerator,
}

impl Pipeline {
    pub fn new(ctx: ScrapeContext, fetcher: Box<dyn PageFetcher>, translator: Translator) -> Self {
        let config = ctx.config();
        let snapshots = match &config.snapshot_dir {
            Some(dir) => SnapshotStore::in_dir(dir),
            None => SnapshotStore::disabled(),
        };
        let throttle = Throttle::new(config.request_delay());
        let skus = SkuGenerator::new(config.sku_prefix.clone());
        Self {
            throttle,
            skus,
            snapshots,
            ctx,
            fetcher,
            translator,
        }
    }

    /// HTTP fetching, web translation backends and tracing output
    pub fn from_config(config: ScrapeConfig) -> Self {
        let fetcher = Box::new(HttpFetcher::new(&config));
        let translator = Translator::from_config(&config);
        Self::new(ScrapeContext::with_tracing(config), fetcher, translator)
    }

    pub fn context(&self) -> &ScrapeContext {
        &self.ctx
    }

    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        self.throttle.wait();
        let html = self.fetcher.fetch_page(url)?;
        if html.trim().is_empty() {
            return Err(FetchError::TooShort {
                url: url.to_string(),
                len: html.len(),
            });
        }
        Ok(html)
    }

    /// Run one URL through every stage. `index` numbers the page snapshot.
    pub fn process_url(&self, index: usize, url: &str) -> Result<ProductRecord, UrlFailure> {
        let html = self.fetch(url).map_err(|e| {
            self.ctx.emit(PipelineEvent::FetchFailed {
                url: url.to_string(),
                reason: e.to_string(),
            });
            UrlFailure {
                url: url.to_string(),
                stage: Stage::Fetched,
                reason: e.to_string(),
            }
        })?;
        self.snapshots.save_page(index, &html);
        self.enter(url, Stage::Fetched);

        self.enter(url, Stage::Extracting);
        let doc = PageDocument::parse(html.as_str(), url);
        let detail = DetailFetch {
            fetcher: self.fetcher.as_ref(),
            throttle: &self.throttle,
            snapshots: &self.snapshots,
        };
        let fields = FieldExtractor::new(&self.ctx)
            .with_detail_fetch(detail)
            .extract(&doc);
        if fields.description.is_none() {
            self.snapshots.save_failed(url, &html);
        }

        self.enter(url, Stage::Translating);
        let record =
            RecordAssembler::new(&self.ctx, &self.translator, &self.skus).assemble(&fields, url);
        self.enter(url, Stage::Assembled);
        Ok(record)
    }

    fn enter(&self, url: &str, stage: Stage) {
        self.ctx.emit(PipelineEvent::StageEntered {
            url: url.to_string(),
            stage,
        });
    }

    /// Process `urls` in order, honouring the URL limit and stop flag
    pub fn run(&self, urls: &[String]) -> BatchReport {
        let limit = self.ctx.config().url_limit.unwrap_or(usize::MAX);
        let urls: Vec<&String> = urls.iter().take(limit).collect();
        let mut report = BatchReport::default();

        for (index, url) in urls.iter().enumerate() {
            if self.ctx.stop_flag().is_stop_requested() {
                self.ctx.emit(PipelineEvent::StopRequested {
                    remaining: urls.len() - index,
                });
                report.stopped_early = true;
                break;
            }

            match self.process_url(index, url) {
                Ok(record) => report.records.push(record),
                Err(failure) => {
                    self.ctx.emit(PipelineEvent::UrlSkipped {
                        url: failure.url.clone(),
                        stage: failure.stage,
                        reason: failure.reason.clone(),
                    });
                    report.failures.push(failure);
                }
            }
        }
        report
    }
}
