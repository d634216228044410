//! Structured pipeline events
//!
//! Everything the pipeline wants an operator to see goes through an
//! [`EventSink`]. [`TracingSink`] forwards to `tracing`; [`RecordingSink`]
//! keeps events in memory so tests can assert on them.

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Per-URL processing stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Fetched,
    Extracting,
    Translating,
    Assembled,
    Exported,
}

/// Product field an extraction strategy targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Field {
    Name,
    Price,
    Images,
    Description,
    Attributes,
    Category,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Name => "name",
            Field::Price => "price",
            Field::Images => "images",
            Field::Description => "description",
            Field::Attributes => "attributes",
            Field::Category => "category",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PipelineEvent {
    StageEntered {
        url: String,
        stage: Stage,
    },
    FetchFailed {
        url: String,
        reason: String,
    },
    /// A cascade accepted a candidate
    FieldExtracted {
        field: Field,
        method: &'static str,
    },
    /// Every strategy for a field came up empty
    FieldMissing {
        field: Field,
    },
    /// An image strategy contributed URLs to the union
    ImagesCollected {
        method: &'static str,
        accepted: usize,
    },
    PlaceholderImageUsed {
        url: String,
    },
    DetailFetchFailed {
        url: String,
        attempt: u32,
        reason: String,
    },
    BackendFailed {
        backend: String,
        reason: String,
    },
    TranslationFallback {
        label: String,
    },
    QualityGateFailed {
        reason: String,
    },
    TranslationRetried {
        accepted: bool,
    },
    RecordAssembled {
        url: String,
        sku: String,
    },
    UrlSkipped {
        url: String,
        stage: Stage,
        reason: String,
    },
    StopRequested {
        remaining: usize,
    },
}

/// Receiver of pipeline events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

/// Forwards events to `tracing` at a level matching their severity
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: PipelineEvent) {
        match &event {
            PipelineEvent::StageEntered { url, stage } => debug!("{url}: entering {stage:?}"),
            PipelineEvent::FetchFailed { url, reason } => error!("Failed to fetch {url}: {reason}"),
            PipelineEvent::FieldExtracted { field, method } => {
                info!("Extracted {field} using {method}")
            }
            PipelineEvent::FieldMissing { field } => info!("No {field} found by any strategy"),
            PipelineEvent::ImagesCollected { method, accepted } => {
                debug!("{accepted} images accepted from {method}")
            }
            PipelineEvent::PlaceholderImageUsed { url } => {
                warn!("No product images found, using placeholder {url}")
            }
            PipelineEvent::DetailFetchFailed { url, attempt, reason } => {
                warn!("detailUrl fetch attempt {attempt} for {url} failed: {reason}")
            }
            PipelineEvent::BackendFailed { backend, reason } => {
                debug!("Translation backend {backend} failed: {reason}")
            }
            PipelineEvent::TranslationFallback { label } => {
                warn!("All translation backends failed, using label '{label}'")
            }
            PipelineEvent::QualityGateFailed { reason } => {
                warn!("Translation quality issue: {reason}")
            }
            PipelineEvent::TranslationRetried { accepted } => {
                if *accepted {
                    info!("Retranslation passed the quality gate")
                } else {
                    warn!("Retranslation still failed the quality gate, keeping it")
                }
            }
            PipelineEvent::RecordAssembled { url, sku } => info!("Assembled {sku} from {url}"),
            PipelineEvent::UrlSkipped { url, stage, reason } => {
                error!("Skipping {url} at {stage:?}: {reason}")
            }
            PipelineEvent::StopRequested { remaining } => {
                warn!("Stop requested, {remaining} URLs left unprocessed")
            }
        }
    }
}

/// Keeps every event in memory, in emission order
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<PipelineEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PipelineEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Number of recorded events matching `pred`
    pub fn count(&self, pred: impl Fn(&PipelineEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: PipelineEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.emit(PipelineEvent::FieldMissing { field: Field::Price });
        sink.emit(PipelineEvent::FieldExtracted {
            field: Field::Name,
            method: "title tag",
        });

        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0], PipelineEvent::FieldMissing { field: Field::Price });
        assert_eq!(
            sink.count(|e| matches!(e, PipelineEvent::FieldExtracted { .. })),
            1
        );
    }
}
