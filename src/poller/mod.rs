//! Fixed-interval polling of the backend's `/stats` endpoint.
//!
//! Each tick issues one GET on its own short-lived thread, so a slow
//! backend never delays the schedule and requests may overlap. Every
//! request is numbered; [`SequenceGate`] decides whether a response that
//! completes out of order may still be rendered.

pub mod ticker;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::StalePolicy;
use crate::config::schema::BackendConfig;
use crate::stats::{ParsedStats, StatsPayload};

pub use ticker::{StopHandle, Ticker};

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

/// Something that can produce one `/stats` snapshot.
pub trait StatsSource: Send + Sync + 'static {
    fn fetch(&self) -> Result<ParsedStats>;
}

/// `GET <backend>/stats` over HTTP.
///
/// No query parameters and no extra headers. Non-2xx responses are errors.
pub struct HttpStatsSource {
    url: String,
    agent: ureq::Agent,
}

impl HttpStatsSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.stats_url(), Duration::from_millis(config.timeout_ms))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl StatsSource for HttpStatsSource {
    fn fetch(&self) -> Result<ParsedStats> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .with_context(|| format!("GET {} failed", self.url))?;
        let body = response
            .into_string()
            .with_context(|| format!("failed to read body from {}", self.url))?;
        StatsPayload::parse(&body)
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

/// Outcome of one numbered request.
#[derive(Debug)]
pub struct TickResult {
    pub seq: u64,
    pub outcome: Result<ParsedStats>,
}

pub struct StatsPoller<S: StatsSource> {
    source: Arc<S>,
    next_seq: AtomicU64,
}

impl<S: StatsSource> StatsPoller<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Arc::new(source),
            next_seq: AtomicU64::new(1),
        }
    }

    fn take_seq(&self) -> u64 {
        self.next_seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Fetch synchronously on the calling thread.
    pub fn fetch_now(&self) -> TickResult {
        let seq = self.take_seq();
        TickResult {
            seq,
            outcome: self.source.fetch(),
        }
    }

    /// Start one request in the background and return its sequence number.
    ///
    /// `deliver` runs on the request thread once the request completes.
    pub fn issue<F>(&self, deliver: F) -> u64
    where
        F: FnOnce(TickResult) + Send + 'static,
    {
        let seq = self.take_seq();
        let source = Arc::clone(&self.source);

        let spawned = thread::Builder::new()
            .name(format!("stats-request-{seq}"))
            .spawn(move || {
                deliver(TickResult {
                    seq,
                    outcome: source.fetch(),
                });
            });

        if let Err(e) = spawned {
            crate::logging::error("poller", &format!("could not start request #{seq}: {e}"));
        }
        seq
    }

    /// Issue a request now and then every `interval` until the returned
    /// handle is stopped or dropped.
    pub fn start<F>(poller: &Arc<Self>, interval: Duration, deliver: F) -> Result<StopHandle>
    where
        F: Fn(TickResult) + Send + Sync + 'static,
    {
        let poller = Arc::clone(poller);
        let deliver = Arc::new(deliver);

        Ticker::spawn("stats-poller", interval, move || {
            let deliver = Arc::clone(&deliver);
            poller.issue(move |result| (*deliver)(result));
            std::ops::ControlFlow::Continue(())
        })
        .context("failed to start stats poller thread")
    }
}

// ---------------------------------------------------------------------------
// Ordering
// ---------------------------------------------------------------------------

/// Decides which completed responses may update the display.
#[derive(Debug, Clone)]
pub struct SequenceGate {
    policy: StalePolicy,
    last_applied: Option<u64>,
    dropped: u64,
}

impl SequenceGate {
    pub fn new(policy: StalePolicy) -> Self {
        Self {
            policy,
            last_applied: None,
            dropped: 0,
        }
    }

    /// Record a completed response; returns whether it should be rendered.
    pub fn admit(&mut self, seq: u64) -> bool {
        let stale = self.last_applied.is_some_and(|last| seq < last);
        if stale && self.policy == StalePolicy::DropStale {
            self.dropped += 1;
            return false;
        }
        self.last_applied = Some(seq);
        true
    }

    pub fn last_applied(&self) -> Option<u64> {
        self.last_applied
    }

    /// Number of responses rejected as stale.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::mpsc;

    use super::*;

    struct FixedSource(&'static str);

    impl StatsSource for FixedSource {
        fn fetch(&self) -> Result<ParsedStats> {
            StatsPayload::parse(self.0)
        }
    }

    #[test]
    fn drop_stale_rejects_older_responses() {
        let mut gate = SequenceGate::new(StalePolicy::DropStale);
        assert!(gate.admit(2));
        assert!(!gate.admit(1));
        assert!(gate.admit(3));
        assert!(gate.admit(3));
        assert_eq!(gate.last_applied(), Some(3));
        assert_eq!(gate.dropped(), 1);
    }

    #[test]
    fn last_wins_applies_everything() {
        let mut gate = SequenceGate::new(StalePolicy::LastWins);
        assert!(gate.admit(5));
        assert!(gate.admit(4));
        assert_eq!(gate.last_applied(), Some(4));
        assert_eq!(gate.dropped(), 0);
    }

    #[test]
    fn sequence_numbers_increase() {
        let poller = StatsPoller::new(FixedSource(r#"{"tags_detected": 1}"#));
        let a = poller.fetch_now();
        let b = poller.fetch_now();
        assert!(b.seq > a.seq);
        assert_eq!(a.outcome.unwrap().payload.tags_detected, Some(1));
    }

    #[test]
    fn issue_delivers_on_background_thread() {
        let poller = StatsPoller::new(FixedSource("not json"));
        let (tx, rx) = mpsc::channel();
        let seq = poller.issue(move |result| {
            let _ = tx.send(result);
        });

        let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(result.seq, seq);
        assert!(result.outcome.is_err());
    }

    #[test]
    fn start_ticks_until_stopped() {
        let poller = Arc::new(StatsPoller::new(FixedSource(r#"{"processing_fps": 9.5}"#)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let handle = StatsPoller::start(&poller, Duration::from_millis(10), move |result| {
            sink.lock().unwrap().push(result.seq);
        })
        .unwrap();

        let start = std::time::Instant::now();
        while seen.lock().unwrap().len() < 3 {
            assert!(start.elapsed() < Duration::from_secs(5));
            thread::sleep(Duration::from_millis(5));
        }
        handle.stop();
        assert!(seen.lock().unwrap().contains(&1));
    }

    #[test]
    fn http_source_reports_unreachable_backend() {
        // Port 9 (discard) is essentially never served over HTTP locally.
        let source = HttpStatsSource::new("http://127.0.0.1:9/stats", Duration::from_millis(500));
        let err = source.fetch().unwrap_err();
        assert!(err.to_string().contains("GET http://127.0.0.1:9/stats failed"));
    }
}
