use async_trait::async_trait;
use bytes::Bytes;
use http::{Request, Response};
use log::{Level, LevelFilter, Log, Metadata, Record};
use sasvend_azure_blob::{ClientRegistry, Config, RetryPolicy};
use sasvend_core::{Context, HttpSend, Result};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

pub const TEST_KEY_XML: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<UserDelegationKey>
    <SignedOid>oid-1</SignedOid>
    <SignedTid>tid-1</SignedTid>
    <SignedStart>2022-03-01T08:12:34Z</SignedStart>
    <SignedExpiry>2022-03-08T08:12:34Z</SignedExpiry>
    <SignedService>b</SignedService>
    <SignedVersion>2022-11-02</SignedVersion>
    <Value>ZGVsZWdhdGlvbi1rZXk=</Value>
</UserDelegationKey>"#;

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: http::Method,
    pub uri: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Debug, Default)]
struct State {
    probes: AtomicUsize,
    key_requests: AtomicUsize,
    probe_statuses: Mutex<VecDeque<u16>>,
    probe_delay: Mutex<Duration>,
    requests: Mutex<Vec<Recorded>>,
}

/// A fake blob service answering the two control plane calls we make.
#[derive(Debug, Clone, Default)]
pub struct MockBlobService {
    state: Arc<State>,
}

impl MockBlobService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Statuses returned by the next probes, in order. Later probes succeed.
    pub fn with_probe_statuses(self, statuses: &[u16]) -> Self {
        self.state
            .probe_statuses
            .lock()
            .unwrap()
            .extend(statuses.iter().copied());
        self
    }

    pub fn with_probe_delay(self, delay: Duration) -> Self {
        *self.state.probe_delay.lock().unwrap() = delay;
        self
    }

    pub fn probes(&self) -> usize {
        self.state.probes.load(Ordering::SeqCst)
    }

    pub fn key_requests(&self) -> usize {
        self.state.key_requests.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpSend for MockBlobService {
    async fn http_send(&self, req: Request<Bytes>) -> Result<Response<Bytes>> {
        let recorded = Recorded {
            method: req.method().clone(),
            uri: req.uri().to_string(),
            authorization: req
                .headers()
                .get(http::header::AUTHORIZATION)
                .map(|v| v.to_str().unwrap().to_string()),
            body: String::from_utf8_lossy(req.body()).to_string(),
        };
        self.state.requests.lock().unwrap().push(recorded);

        let query = req.uri().query().unwrap_or_default();
        if query.contains("comp=properties") {
            self.state.probes.fetch_add(1, Ordering::SeqCst);
            let delay = *self.state.probe_delay.lock().unwrap();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let status = self
                .state
                .probe_statuses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(200);
            let body = if status == 403 {
                "<?xml version=\"1.0\" encoding=\"utf-8\"?><Error><Code>AuthenticationFailed</Code><Message>Server failed to authenticate the request.</Message></Error>"
            } else {
                ""
            };
            return Ok(Response::builder()
                .status(status)
                .body(Bytes::from(body))
                .unwrap());
        }

        if query.contains("comp=userdelegationkey") {
            self.state.key_requests.fetch_add(1, Ordering::SeqCst);
            return Ok(Response::builder()
                .status(200)
                .body(Bytes::from(TEST_KEY_XML))
                .unwrap());
        }

        Ok(Response::builder().status(404).body(Bytes::new()).unwrap())
    }
}

pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new()
        .with_max_attempts(3)
        .with_delay(Duration::from_millis(1), Duration::from_millis(2))
}

/// Forwards to env_logger and keeps every record at info or above.
pub struct CapturingLogger {
    inner: env_logger::Logger,
    records: Mutex<Vec<String>>,
}

impl CapturingLogger {
    /// Captured messages mentioning `needle`.
    pub fn records_with(&self, needle: &str) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.contains(needle))
            .cloned()
            .collect()
    }
}

impl Log for CapturingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info || self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if record.level() <= Level::Info {
            self.records
                .lock()
                .unwrap()
                .push(record.args().to_string());
        }
        if self.inner.matches(record) {
            self.inner.log(record);
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Install the process wide logger once and return it.
pub fn init_logger() -> &'static CapturingLogger {
    static LOGGER: OnceLock<&'static CapturingLogger> = OnceLock::new();

    LOGGER.get_or_init(|| {
        let logger: &'static CapturingLogger = Box::leak(Box::new(CapturingLogger {
            inner: env_logger::builder().is_test(true).build(),
            records: Mutex::new(Vec::new()),
        }));
        log::set_logger(logger).expect("no other logger is installed");
        log::set_max_level(logger.inner.filter().max(LevelFilter::Info));
        logger
    })
}

pub fn registry(mock: &MockBlobService) -> Arc<ClientRegistry> {
    init_logger();

    let ctx = Context::new().with_http_send(mock.clone());
    Arc::new(ClientRegistry::new(
        ctx,
        Config::default().with_retry(fast_retry()),
    ))
}

pub fn long_token() -> String {
    format!(
        "sv=2022-11-02&ss=b&srt=sco&sp=rl&se=2022-03-08T08%3A12%3A34Z&spr=https&sig={}",
        "A".repeat(64)
    )
}
