use std::time::Duration;

use serde::Deserialize;

use crate::config::deserialize_duration;
use crate::elements::cache::ElementCache;
use crate::elements::error::{FetchError, TransportError};
use crate::elements::parsing::parse_catalog;
use crate::elements::transport::CatalogTransport;
use crate::elements::types::{ObjectId, OrbitalElementSet};

const DEFAULT_CATALOG_URL: &str = "https://celestrak.org/NORAD/elements/gp.php?CATNR={id}";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// `{id}` is replaced by the catalog number
    pub catalog_url: String,
    pub max_attempts: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub initial_delay: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub timeout: Duration,
    #[serde(deserialize_with = "deserialize_duration")]
    pub cache_ttl: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(3600),
        }
    }
}

impl FetchConfig {
    pub fn url_for(&self, object: &ObjectId) -> String {
        self.catalog_url
            .replace("{id}", &object.catalog_number.to_string())
    }

    /// Delay before retry number `retry` (1 for the first retry)
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(31);
        self.initial_delay.saturating_mul(factor)
    }
}

/// Receives a notification before every backoff sleep
pub trait RetryReporter: Send + Sync {
    fn on_retry(&self, attempt: u32, max_attempts: u32, delay: Duration, error: &TransportError);
}

pub struct LogReporter;

impl RetryReporter for LogReporter {
    fn on_retry(&self, attempt: u32, max_attempts: u32, delay: Duration, error: &TransportError) {
        log::warn!(
            "Attempt {}/{} failed: {}; retrying in {:?}",
            attempt,
            max_attempts,
            error,
            delay
        );
    }
}

pub struct ElementsFetcher<T, R = LogReporter> {
    transport: T,
    reporter: R,
    config: FetchConfig,
    cache: ElementCache,
}

impl<T: CatalogTransport> ElementsFetcher<T, LogReporter> {
    pub fn new(transport: T, config: FetchConfig) -> Self {
        Self::with_reporter(transport, config, LogReporter)
    }
}

impl<T: CatalogTransport, R: RetryReporter> ElementsFetcher<T, R> {
    pub fn with_reporter(transport: T, config: FetchConfig, reporter: R) -> Self {
        let cache = ElementCache::new(config.cache_ttl);
        Self {
            transport,
            reporter,
            config,
            cache,
        }
    }

    /// Current element set for `object`, served from cache while it is fresh
    pub async fn fetch(&self, object: &ObjectId) -> Result<OrbitalElementSet, FetchError> {
        if let Some(elements) = self.cache.get(object.catalog_number) {
            log::debug!("Using cached elements for {}", object.label());
            return Ok(elements);
        }

        let url = self.config.url_for(object);
        let payload = self.download(&url, object).await?;
        let elements = parse_catalog(&payload, object)?;

        log::info!("Fetched elements for {}", elements.name);
        self.cache.insert(object.catalog_number, elements.clone());
        Ok(elements)
    }

    async fn download(&self, url: &str, object: &ObjectId) -> Result<String, FetchError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.transport.get(url, self.config.timeout).await {
                Ok(payload) => return Ok(payload),
                Err(e) if attempt < max_attempts => {
                    let delay = self.config.backoff_delay(attempt);
                    self.reporter.on_retry(attempt, max_attempts, delay, &e);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    log::error!(
                        "Failed to fetch elements for {} after {} attempts: {}",
                        object.label(),
                        attempt,
                        e
                    );
                    return Err(FetchError::Exhausted {
                        attempts: attempt,
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    const PAYLOAD: &str = "ISS (ZARYA)
1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9005
2 25544  51.6400 208.9163 0006317  69.9862  25.2906 15.49560532 12345
";

    /// Replays scripted responses; repeats the last one when exhausted
    struct ScriptedTransport {
        responses: Mutex<VecDeque<Result<String, TransportError>>>,
        calls: AtomicU32,
        call_times: Mutex<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn failing_then(failures: usize, last: Result<String, TransportError>) -> Self {
            let mut responses: VecDeque<_> = (0..failures)
                .map(|_| Err(TransportError::Connection("connection reset".into())))
                .collect();
            responses.push_back(last);
            Self {
                responses: Mutex::new(responses),
                calls: AtomicU32::new(0),
                call_times: Mutex::new(Vec::new()),
            }
        }

        fn always_failing() -> Self {
            Self::failing_then(0, Err(TransportError::Status(503)))
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl CatalogTransport for ScriptedTransport {
        async fn get(&self, _url: &str, _timeout: Duration) -> Result<String, TransportError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.call_times.lock().unwrap().push(Instant::now());
            let mut responses = self.responses.lock().unwrap();
            if responses.len() > 1 {
                return responses.pop_front().unwrap();
            }
            match responses.front() {
                Some(Ok(payload)) => Ok(payload.clone()),
                _ => Err(TransportError::Status(503)),
            }
        }
    }

    impl CatalogTransport for Arc<ScriptedTransport> {
        async fn get(&self, url: &str, timeout: Duration) -> Result<String, TransportError> {
            self.as_ref().get(url, timeout).await
        }
    }

    #[derive(Default, Clone)]
    struct RecordingReporter {
        delays: Arc<Mutex<Vec<Duration>>>,
    }

    impl RetryReporter for RecordingReporter {
        fn on_retry(&self, _attempt: u32, _max: u32, delay: Duration, _error: &TransportError) {
            self.delays.lock().unwrap().push(delay);
        }
    }

    fn config(max_attempts: u32) -> FetchConfig {
        FetchConfig {
            max_attempts,
            initial_delay: Duration::from_secs(1),
            ..FetchConfig::default()
        }
    }

    #[test]
    fn backoff_doubles_from_initial_delay() {
        let cfg = config(5);
        assert_eq!(cfg.backoff_delay(1), Duration::from_secs(1));
        assert_eq!(cfg.backoff_delay(2), Duration::from_secs(2));
        assert_eq!(cfg.backoff_delay(3), Duration::from_secs(4));
        assert_eq!(cfg.backoff_delay(4), Duration::from_secs(8));
    }

    #[test]
    fn url_substitutes_catalog_number() {
        let url = FetchConfig::default().url_for(&ObjectId::new(33591, None));
        assert_eq!(url, "https://celestrak.org/NORAD/elements/gp.php?CATNR=33591");
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_last_allowed_attempt() {
        let transport = Arc::new(ScriptedTransport::failing_then(3, Ok(PAYLOAD.into())));
        let reporter = RecordingReporter::default();
        let fetcher = ElementsFetcher::with_reporter(transport.clone(), config(4), reporter.clone());

        let elements = fetcher.fetch(&ObjectId::default()).await.unwrap();

        assert_eq!(elements.name, "ISS (ZARYA)");
        assert_eq!(transport.calls(), 4);
        let delays = reporter.delays.lock().unwrap().clone();
        assert_eq!(
            delays,
            vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
        );

        let times = transport.call_times.lock().unwrap().clone();
        let gaps: Vec<_> = times.windows(2).map(|w| w[1] - w[0]).collect();
        assert!(gaps.windows(2).all(|g| g[1] > g[0]));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_reports_attempts_and_last_cause() {
        let transport = Arc::new(ScriptedTransport::always_failing());
        let fetcher = ElementsFetcher::with_reporter(
            transport.clone(),
            config(3),
            RecordingReporter::default(),
        );

        let err = fetcher.fetch(&ObjectId::default()).await.unwrap_err();

        assert_eq!(transport.calls(), 3);
        match err {
            FetchError::Exhausted { attempts, source } => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, TransportError::Status(503)));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn missing_object_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::failing_then(
            0,
            Ok("NOAA 19\n1 33591U\n2 33591\n".into()),
        ));
        let fetcher = ElementsFetcher::with_reporter(
            transport.clone(),
            config(5),
            RecordingReporter::default(),
        );

        let err = fetcher.fetch(&ObjectId::new(25544, Some("ISS"))).await.unwrap_err();

        assert!(matches!(err, FetchError::DataNotFound(_)));
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cached_result_skips_network_until_ttl_expires() {
        let transport = Arc::new(ScriptedTransport::failing_then(0, Ok(PAYLOAD.into())));
        let fetcher = ElementsFetcher::with_reporter(
            transport.clone(),
            config(1),
            RecordingReporter::default(),
        );
        let object = ObjectId::default();

        fetcher.fetch(&object).await.unwrap();
        tokio::time::advance(Duration::from_secs(1800)).await;
        fetcher.fetch(&object).await.unwrap();
        assert_eq!(transport.calls(), 1);

        tokio::time::advance(Duration::from_secs(1800)).await;
        fetcher.fetch(&object).await.unwrap();
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_still_tries_once() {
        let transport = Arc::new(ScriptedTransport::always_failing());
        let fetcher = ElementsFetcher::with_reporter(
            transport.clone(),
            config(0),
            RecordingReporter::default(),
        );
        assert!(fetcher.fetch(&ObjectId::default()).await.is_err());
        assert_eq!(transport.calls(), 1);
    }
}
