//! Diagnostic logging for tagview.
//!
//! Every diagnostic goes to stderr as `[tagview] LEVEL component: message`.
//! When `[logging] enabled = true`, the same record is appended as one JSON
//! line to the event log (default `~/.tagview/events.jsonl`).
//!
//! Logging is best-effort: failures to write the event log are ignored.

use std::fs::{OpenOptions, create_dir_all};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;

/// Severity of a diagnostic, ordered from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl Level {
    /// Parse a level name, falling back to `Info` for unknown names.
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            "warn" | "warning" => Self::Warn,
            "debug" | "trace" => Self::Debug,
            _ => Self::Info,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

/// A single line in the JSONL event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: String,
    pub level: Level,
    pub component: String,
    pub message: String,
}

struct Sink {
    level: Level,
    path: Option<PathBuf>,
}

static SINK: OnceLock<Sink> = OnceLock::new();

/// Install the process-wide logging settings. Only the first call wins;
/// before it, everything at `Info` and above goes to stderr only.
pub fn init(config: &LoggingConfig) {
    let path = if config.enabled {
        crate::config::expand_home(&config.path)
    } else {
        None
    };
    let _ = SINK.set(Sink {
        level: Level::parse(&config.level),
        path,
    });
}

fn max_level() -> Level {
    SINK.get().map(|s| s.level).unwrap_or(Level::Info)
}

/// Emit a diagnostic at the given level.
pub fn log(level: Level, component: &str, message: &str) {
    if level > max_level() {
        return;
    }

    eprintln!("[tagview] {} {component}: {message}", level.label());

    if let Some(path) = SINK.get().and_then(|s| s.path.as_ref()) {
        let record = LogRecord {
            timestamp: Utc::now().to_rfc3339(),
            level,
            component: component.to_string(),
            message: message.to_string(),
        };
        let _ = append_record(path, &record);
    }
}

pub fn error(component: &str, message: &str) {
    log(Level::Error, component, message);
}

pub fn warn(component: &str, message: &str) {
    log(Level::Warn, component, message);
}

pub fn info(component: &str, message: &str) {
    log(Level::Info, component, message);
}

pub fn debug(component: &str, message: &str) {
    log(Level::Debug, component, message);
}

fn append_record(path: &PathBuf, record: &LogRecord) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let json = serde_json::to_string(record)?;
    writeln!(file, "{json}")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_severity() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Warn < Level::Info);
        assert!(Level::Info < Level::Debug);
    }

    #[test]
    fn parse_level_names() {
        assert_eq!(Level::parse("ERROR"), Level::Error);
        assert_eq!(Level::parse("warning"), Level::Warn);
        assert_eq!(Level::parse("debug"), Level::Debug);
        assert_eq!(Level::parse("nonsense"), Level::Info);
    }

    #[test]
    fn record_serializes_lowercase_level() {
        let record = LogRecord {
            timestamp: "2026-01-01T00:00:00+00:00".to_string(),
            level: Level::Warn,
            component: "poller".to_string(),
            message: "skipped".to_string(),
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"level\":\"warn\""));
        assert!(json.contains("\"component\":\"poller\""));
    }

    #[test]
    fn append_record_writes_one_line_per_call() {
        let path = std::env::temp_dir()
            .join(format!("tagview-log-{}", std::process::id()))
            .join("events.jsonl");
        let _ = std::fs::remove_file(&path);

        let record = LogRecord {
            timestamp: Utc::now().to_rfc3339(),
            level: Level::Error,
            component: "test".to_string(),
            message: "one".to_string(),
        };
        append_record(&path, &record).unwrap();
        append_record(&path, &record).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        let parsed: LogRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(parsed.level, Level::Error);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
