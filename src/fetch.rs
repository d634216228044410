//! Page fetching (blocking ureq, no async runtime)

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::{DetailFetchConfig, ScrapeConfig};
use crate::error::FetchError;
use crate::events::{EventSink, PipelineEvent};

const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE: &str = "zh-CN,zh;q=0.9,en;q=0.8";

/// Source of raw page bodies
pub trait PageFetcher {
    /// Fetch a product page
    fn fetch_page(&self, url: &str) -> Result<String, FetchError>;

    /// Fetch an auxiliary detail document. Implementations may use a
    /// shorter timeout than for product pages.
    fn fetch_detail(&self, url: &str) -> Result<String, FetchError> {
        self.fetch_page(url)
    }
}

/// Agent with a global per-request timeout
pub fn build_agent(user_agent: &str, timeout: Duration) -> ureq::Agent {
    ureq::Agent::new_with_config(
        ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .user_agent(user_agent)
            .build(),
    )
}

/// `PageFetcher` over HTTP with browser-like headers
pub struct HttpFetcher {
    page_agent: ureq::Agent,
    detail_agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new(config: &ScrapeConfig) -> Self {
        Self {
            page_agent: build_agent(&config.user_agent, config.page_timeout()),
            detail_agent: build_agent(&config.user_agent, config.detail_timeout()),
        }
    }

    fn get(agent: &ureq::Agent, url: &str) -> Result<String, FetchError> {
        let resp = agent
            .get(url)
            .header("Accept", ACCEPT)
            .header("Accept-Language", ACCEPT_LANGUAGE)
            .call()
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => FetchError::Status {
                    url: url.to_string(),
                    status,
                },
                other => FetchError::Transport {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })?;

        if !resp.status().is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }

        resp.into_body()
            .read_to_string()
            .map_err(|e| FetchError::Body {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        Self::get(&self.page_agent, url)
    }

    fn fetch_detail(&self, url: &str) -> Result<String, FetchError> {
        Self::get(&self.detail_agent, url)
    }
}

/// Enforces a minimum gap between consecutive requests
#[derive(Debug)]
pub struct Throttle {
    delay: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last: Mutex::new(None),
        }
    }

    /// Block until `delay` has passed since the previous call
    pub fn wait(&self) {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.delay {
                let remaining = self.delay - elapsed;
                debug!("Cooling down for {:?}", remaining);
                std::thread::sleep(remaining);
            }
        }
        *last = Some(Instant::now());
    }
}

/// Fetch a detail document with bounded retries and pull a value out of it.
///
/// Every attempt waits on the throttle first. A body of `min_body_bytes` or
/// less counts as a failed attempt, and so does a body for which `extract`
/// returns `None`. Returns the last error when all attempts fail.
pub fn fetch_with_retry<T>(
    fetcher: &dyn PageFetcher,
    throttle: &Throttle,
    url: &str,
    policy: &DetailFetchConfig,
    events: &dyn EventSink,
    mut extract: impl FnMut(&str) -> Option<T>,
) -> Result<T, FetchError> {
    let attempts = policy.max_attempts.max(1);
    let retry_delay = policy.retry_delay();
    let mut last_error = None;

    for attempt in 1..=attempts {
        throttle.wait();
        let result = fetcher.fetch_detail(url).and_then(|body| {
            if body.len() <= policy.min_body_bytes {
                return Err(FetchError::TooShort {
                    url: url.to_string(),
                    len: body.len(),
                });
            }
            extract(&body).ok_or_else(|| FetchError::NoContent {
                url: url.to_string(),
            })
        });

        match result {
            Ok(value) => return Ok(value),
            Err(e) => {
                events.emit(PipelineEvent::DetailFetchFailed {
                    url: url.to_string(),
                    attempt,
                    reason: e.to_string(),
                });
                last_error = Some(e);
            }
        }

        if attempt < attempts && !retry_delay.is_zero() {
            std::thread::sleep(retry_delay);
        }
    }

    Err(last_error.unwrap_or_else(|| FetchError::Transport {
        url: url.to_string(),
        reason: "no attempts made".to_string(),
    }))
}
