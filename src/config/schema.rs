/// Configuration schema and defaults for tagview.
///
/// Defines the TOML-serializable configuration structure with all sections:
/// `[general]`, `[backend]`, `[poller]`, `[viewport]`, `[stream]`, `[web]`
/// and `[logging]`.
///
/// Every field has a built-in default matching the stock dashboard: poll
/// `/stats` once per second, switch container padding at 768 px.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level tagview configuration.
///
/// Maps directly to `~/.tagview/config.toml` and `.tagview.toml`. All
/// sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagviewConfig {
    pub general: GeneralConfig,
    pub backend: BackendConfig,
    pub poller: PollerConfig,
    pub viewport: ViewportConfig,
    pub stream: StreamConfig,
    pub web: WebConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [general]
// ---------------------------------------------------------------------------

/// Which dashboard layout to render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// Counters, latest-pose summary and one panel per detected tag.
    #[default]
    Full,
    /// Aggregate counters only.
    Simple,
}

impl std::fmt::Display for Variant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Full => write!(f, "full"),
            Self::Simple => write!(f, "simple"),
        }
    }
}

impl std::str::FromStr for Variant {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" | "rich" => Ok(Self::Full),
            "simple" | "basic" => Ok(Self::Simple),
            other => anyhow::bail!("unknown variant '{other}' (expected full or simple)"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Dashboard layout: `full` or `simple`.
    pub variant: Variant,
}

// ---------------------------------------------------------------------------
// [backend]
// ---------------------------------------------------------------------------

/// Where the detection backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the detection backend.
    pub url: String,
    /// Path of the JSON statistics endpoint.
    pub stats_path: String,
    /// Path of the MJPEG video stream.
    pub stream_path: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
}

impl BackendConfig {
    /// Full URL of the statistics endpoint.
    pub fn stats_url(&self) -> String {
        join_url(&self.url, &self.stats_path)
    }

    /// Full URL of the video stream.
    pub fn stream_url(&self) -> String {
        join_url(&self.url, &self.stream_path)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:5000".to_string(),
            stats_path: "/stats".to_string(),
            stream_path: "/video_feed".to_string(),
            timeout_ms: 5000,
        }
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

// ---------------------------------------------------------------------------
// [poller]
// ---------------------------------------------------------------------------

/// What to do with a response that resolves after a newer one was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StalePolicy {
    /// Ignore responses older than the last applied one.
    #[default]
    DropStale,
    /// Apply every response in completion order.
    LastWins,
}

impl std::fmt::Display for StalePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DropStale => write!(f, "drop-stale"),
            Self::LastWins => write!(f, "last-wins"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Fixed tick interval (milliseconds).
    pub interval_ms: u64,
    /// Ordering policy for overlapping requests.
    pub stale_policy: StalePolicy,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            stale_policy: StalePolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// [viewport]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Widths below this value use the narrow padding.
    pub breakpoint: u32,
    pub narrow_padding: String,
    pub wide_padding: String,
    /// Width assumed on load, before any client reports its own.
    pub initial_width: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            breakpoint: 768,
            narrow_padding: "10px".to_string(),
            wide_padding: "20px".to_string(),
            initial_width: 1024,
        }
    }
}

// ---------------------------------------------------------------------------
// [stream]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Whether the video stream is probed at all.
    pub enabled: bool,
    /// Delay between probes while the stream is healthy (milliseconds).
    pub probe_interval_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            probe_interval_ms: 10_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address of the embedded dashboard server.
    pub addr: String,
    /// Page auto-refresh period (seconds). `0` disables the refresh.
    pub refresh_secs: u32,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            refresh_secs: 1,
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether diagnostics are also appended to the JSONL event log.
    pub enabled: bool,
    /// Path to the event log. `~` is expanded to the home directory.
    pub path: String,
    /// Log level: `"error"`, `"warn"`, `"info"`, `"debug"`.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.tagview/events.jsonl".to_string(),
            level: "info".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl TagviewConfig {
    /// Periods and timeouts that must be non-zero, keyed by their dotted name.
    fn durations(&mut self) -> [(&'static str, &mut u64, u64); 3] {
        [
            (
                "poller.interval_ms",
                &mut self.poller.interval_ms,
                PollerConfig::default().interval_ms,
            ),
            (
                "stream.probe_interval_ms",
                &mut self.stream.probe_interval_ms,
                StreamConfig::default().probe_interval_ms,
            ),
            (
                "backend.timeout_ms",
                &mut self.backend.timeout_ms,
                BackendConfig::default().timeout_ms,
            ),
        ]
    }

    /// Reject values the schema accepts but the poller cannot run with.
    ///
    /// A zero poll or probe interval would issue requests back to back, and
    /// a zero timeout would fail every request.
    pub fn validate(&self) -> anyhow::Result<()> {
        let zero: Vec<&str> = self
            .clone()
            .durations()
            .into_iter()
            .filter(|(_, value, _)| **value == 0)
            .map(|(key, _, _)| key)
            .collect();

        if !zero.is_empty() {
            anyhow::bail!("{} must be greater than zero", zero.join(", "));
        }
        Ok(())
    }

    /// Reset invalid values to their defaults; returns the keys that changed.
    pub fn sanitize(&mut self) -> Vec<&'static str> {
        let mut reset = Vec::new();
        for (key, value, default) in self.durations() {
            if *value == 0 {
                *value = default;
                reset.push(key);
            }
        }
        reset
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl TagviewConfig {
    /// The annotated default config written by `tagview config init`.
    pub fn default_toml() -> String {
        r#"# tagview Configuration
# Live dashboard for an AprilTag pose detection backend
#
# Configuration hierarchy (highest precedence wins):
#   1. Command line flags
#   2. Environment variables (TAGVIEW_*)
#   3. Project config (.tagview.toml in current directory)
#   4. User global config (~/.tagview/config.toml)
#   5. Built-in defaults

[general]
variant = "full"          # full | simple

[backend]
url = "http://127.0.0.1:5000"
stats_path = "/stats"
stream_path = "/video_feed"
timeout_ms = 5000

[poller]
interval_ms = 1000
stale_policy = "drop-stale"   # drop-stale | last-wins

[viewport]
breakpoint = 768              # widths below use narrow_padding
narrow_padding = "10px"
wide_padding = "20px"
initial_width = 1024

[stream]
enabled = true
probe_interval_ms = 10000

[web]
addr = "127.0.0.1:8080"
refresh_secs = 1

[logging]
enabled = true
path = "~/.tagview/events.jsonl"
level = "info"                # error | warn | info | debug
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
