//! The dashboard event loop.
//!
//! All page mutation funnels through [`Dashboard::handle`]. Poll results,
//! stream failures and resize events arrive as [`DashboardEvent`]s on one
//! channel and are applied in arrival order by a single loop thread. The
//! web server shares the same `Mutex<Dashboard>`, so the page is never
//! written concurrently.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::{TagviewConfig, Variant};
use crate::logging;
use crate::page::{Page, PageOptions};
use crate::poller::{HttpStatsSource, SequenceGate, StatsPoller, StopHandle, TickResult};
use crate::render;
use crate::stats::StatsPayload;
use crate::stream::{StreamProbe, StreamWatchdog};
use crate::viewport::{ViewportAdapter, WidthClass};

/// Something that happened outside the loop.
#[derive(Debug)]
pub enum DashboardEvent {
    Stats(TickResult),
    StreamFailed(String),
    Resize(u32),
}

/// What handling an event did to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Update {
    /// A payload was rendered.
    Rendered { seq: u64 },
    /// A response arrived after a newer one had been rendered.
    DroppedStale { seq: u64 },
    /// The request failed; the display was left as is.
    FetchFailed { seq: u64 },
    /// The video panel switched to the unavailable notice.
    StreamLost,
    /// Container padding was re-applied.
    Resized(WidthClass),
    /// Nothing changed.
    Unchanged,
}

/// Serializable summary for `GET /api/state`.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardState {
    pub variant: String,
    pub last_applied_seq: Option<u64>,
    pub renders: u64,
    pub stale_dropped: u64,
    pub fetch_failures: u64,
    pub skipped_entries: u64,
    pub last_error: Option<String>,
    pub stream_available: bool,
    pub width_class: WidthClass,
}

pub struct Dashboard {
    page: Page,
    gate: SequenceGate,
    watchdog: StreamWatchdog,
    viewport: ViewportAdapter,
    width_class: WidthClass,
    refresh_secs: u32,
    last_payload: Option<StatsPayload>,
    last_error: Option<String>,
    renders: u64,
    fetch_failures: u64,
    skipped_entries: u64,
}

impl Dashboard {
    /// Wrap a bound page and apply the initial viewport width.
    pub fn new(mut page: Page, config: &TagviewConfig) -> Self {
        let viewport = ViewportAdapter::from_config(&config.viewport);
        let width_class = viewport.apply(&mut page, config.viewport.initial_width);

        Self {
            page,
            gate: SequenceGate::new(config.poller.stale_policy),
            watchdog: StreamWatchdog::new(),
            viewport,
            width_class,
            refresh_secs: config.web.refresh_secs,
            last_payload: None,
            last_error: None,
            renders: 0,
            fetch_failures: 0,
            skipped_entries: 0,
        }
    }

    /// Build the stock page for the configured variant.
    pub fn from_config(config: &TagviewConfig) -> Result<Self> {
        let options = PageOptions {
            stream_url: config.backend.stream_url(),
            ..PageOptions::default()
        };
        let page = Page::dashboard(config.general.variant, &options)?;
        Ok(Self::new(page, config))
    }

    pub fn handle(&mut self, event: DashboardEvent) -> Update {
        match event {
            DashboardEvent::Stats(result) => self.apply_stats(result),
            DashboardEvent::StreamFailed(reason) => self.stream_failed(&reason),
            DashboardEvent::Resize(width) => Update::Resized(self.resize(width)),
        }
    }

    pub fn apply_stats(&mut self, result: TickResult) -> Update {
        let TickResult { seq, outcome } = result;

        let parsed = match outcome {
            Ok(parsed) => parsed,
            Err(e) => {
                self.fetch_failures += 1;
                let message = format!("{e:#}");
                logging::error("poller", &format!("error fetching stats (#{seq}): {message}"));
                self.last_error = Some(message);
                return Update::FetchFailed { seq };
            }
        };

        if !self.gate.admit(seq) {
            logging::debug("poller", &format!("dropping stale response #{seq}"));
            return Update::DroppedStale { seq };
        }

        for skipped in &parsed.skipped {
            logging::warn(
                "render",
                &format!(
                    "skipping malformed pose entry {} in response #{seq}: {}",
                    skipped.index, skipped.reason
                ),
            );
        }
        self.skipped_entries += parsed.skipped.len() as u64;

        let variant = self.page.variant();
        render::render_stats(&mut self.page, variant, &parsed.payload);
        self.renders += 1;
        self.last_error = None;
        self.last_payload = Some(parsed.payload);
        Update::Rendered { seq }
    }

    pub fn stream_failed(&mut self, reason: &str) -> Update {
        if self.watchdog.on_error(&mut self.page, reason) {
            Update::StreamLost
        } else {
            Update::Unchanged
        }
    }

    pub fn resize(&mut self, width: u32) -> WidthClass {
        self.width_class = self.viewport.apply(&mut self.page, width);
        self.width_class
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn variant(&self) -> Variant {
        self.page.variant()
    }

    /// Reload period of the served stats panel.
    pub fn refresh_secs(&self) -> u32 {
        self.refresh_secs
    }

    /// The most recently rendered payload.
    pub fn last_payload(&self) -> Option<&StatsPayload> {
        self.last_payload.as_ref()
    }

    pub fn state(&self) -> DashboardState {
        DashboardState {
            variant: self.variant().to_string(),
            last_applied_seq: self.gate.last_applied(),
            renders: self.renders,
            stale_dropped: self.gate.dropped(),
            fetch_failures: self.fetch_failures,
            skipped_entries: self.skipped_entries,
            last_error: self.last_error.clone(),
            stream_available: self.watchdog.is_available(),
            width_class: self.width_class,
        }
    }
}

// ---------------------------------------------------------------------------
// Running dashboard
// ---------------------------------------------------------------------------

/// Lock the shared dashboard, recovering from a poisoned mutex.
pub fn lock(shared: &Mutex<Dashboard>) -> MutexGuard<'_, Dashboard> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A dashboard with its poller, stream probe and event loop running.
///
/// Dropping it stops the poller and the probe; the loop thread exits once
/// every event sender is gone.
pub struct Running {
    pub dashboard: Arc<Mutex<Dashboard>>,
    events: Sender<DashboardEvent>,
    poller: Option<StopHandle>,
    probe: Option<StopHandle>,
    event_loop: Option<JoinHandle<()>>,
}

impl Running {
    /// Start polling and probing for `config`, applying events to a fresh
    /// dashboard. `on_update` runs on the loop thread after each event.
    pub fn start<F>(config: &TagviewConfig, on_update: F) -> Result<Self>
    where
        F: FnMut(&Dashboard, Update) + Send + 'static,
    {
        let dashboard = Arc::new(Mutex::new(Dashboard::from_config(config)?));
        let (events, rx) = mpsc::channel();

        let event_loop = spawn_event_loop(Arc::clone(&dashboard), rx, on_update)?;

        let poller = Arc::new(StatsPoller::new(HttpStatsSource::from_config(&config.backend)));
        let tx = events.clone();
        let poller_handle = StatsPoller::start(
            &poller,
            Duration::from_millis(config.poller.interval_ms),
            move |result| {
                let _ = tx.send(DashboardEvent::Stats(result));
            },
        )?;

        let probe_handle = if config.stream.enabled {
            let tx = events.clone();
            let probe = StreamProbe::from_config(&config.backend);
            Some(probe.spawn(
                Duration::from_millis(config.stream.probe_interval_ms),
                move |reason| {
                    let _ = tx.send(DashboardEvent::StreamFailed(reason));
                },
            )?)
        } else {
            None
        };

        logging::info(
            "dashboard",
            &format!(
                "polling {} every {} ms ({} variant)",
                config.backend.stats_url(),
                config.poller.interval_ms,
                config.general.variant
            ),
        );

        Ok(Self {
            dashboard,
            events,
            poller: Some(poller_handle),
            probe: probe_handle,
            event_loop: Some(event_loop),
        })
    }

    /// A sender for injecting events (resize notifications, tests).
    pub fn events(&self) -> Sender<DashboardEvent> {
        self.events.clone()
    }

    /// Stop polling and probing and wait for the loop to drain.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(handle) = self.poller.take() {
            handle.stop();
        }
        if let Some(handle) = self.probe.take() {
            handle.stop();
        }
        // In-flight request threads hold sender clones; the loop ends when
        // the last of them has delivered.
        let (closed, _) = mpsc::channel();
        drop(std::mem::replace(&mut self.events, closed));
        if let Some(join) = self.event_loop.take() {
            let _ = join.join();
        }
    }
}

impl Drop for Running {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Apply events from `rx` until every sender is dropped.
pub fn spawn_event_loop<F>(
    dashboard: Arc<Mutex<Dashboard>>,
    rx: Receiver<DashboardEvent>,
    mut on_update: F,
) -> Result<JoinHandle<()>>
where
    F: FnMut(&Dashboard, Update) + Send + 'static,
{
    thread::Builder::new()
        .name("dashboard-loop".to_string())
        .spawn(move || {
            for event in rx {
                let mut guard = lock(&dashboard);
                let update = guard.handle(event);
                on_update(&guard, update);
            }
        })
        .context("failed to start dashboard event loop")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StalePolicy;
    use crate::page::Region;
    use crate::stats::StatsPayload;

    fn ok(seq: u64, body: &str) -> DashboardEvent {
        DashboardEvent::Stats(TickResult {
            seq,
            outcome: StatsPayload::parse(body),
        })
    }

    fn dashboard() -> Dashboard {
        Dashboard::from_config(&TagviewConfig::default()).unwrap()
    }

    #[test]
    fn initial_width_applied_on_load() {
        let mut config = TagviewConfig::default();
        config.viewport.initial_width = 600;
        let dash = Dashboard::from_config(&config).unwrap();
        assert_eq!(dash.state().width_class, WidthClass::Narrow);
        assert_eq!(
            dash.page().element(Region::Container).unwrap().style("padding"),
            Some("10px")
        );
    }

    #[test]
    fn stale_response_does_not_overwrite_newer() {
        let mut dash = dashboard();
        assert_eq!(
            dash.handle(ok(2, r#"{"tags_detected": 2}"#)),
            Update::Rendered { seq: 2 }
        );
        assert_eq!(
            dash.handle(ok(1, r#"{"tags_detected": 1}"#)),
            Update::DroppedStale { seq: 1 }
        );
        assert_eq!(dash.page().text(Region::TagsCount), "2");
        assert_eq!(dash.state().stale_dropped, 1);
    }

    #[test]
    fn last_wins_policy_renders_late_response() {
        let mut config = TagviewConfig::default();
        config.poller.stale_policy = StalePolicy::LastWins;
        let mut dash = Dashboard::from_config(&config).unwrap();

        dash.handle(ok(2, r#"{"tags_detected": 2}"#));
        dash.handle(ok(1, r#"{"tags_detected": 1}"#));
        assert_eq!(dash.page().text(Region::TagsCount), "1");
    }

    #[test]
    fn failed_fetch_leaves_display_untouched() {
        let mut dash = dashboard();
        dash.handle(ok(1, r#"{"tags_detected": 4, "processing_fps": 10.5}"#));
        let update = dash.handle(ok(2, "<html>oops</html>"));

        assert_eq!(update, Update::FetchFailed { seq: 2 });
        assert_eq!(dash.page().text(Region::TagsCount), "4");
        let state = dash.state();
        assert_eq!(state.fetch_failures, 1);
        assert!(state.last_error.unwrap().contains("invalid /stats JSON body"));
        assert_eq!(dash.last_payload().unwrap().tags_detected, Some(4));
    }

    #[test]
    fn failed_fetch_does_not_block_older_in_flight_response() {
        let mut dash = dashboard();
        dash.handle(ok(3, "garbage"));
        assert_eq!(
            dash.handle(ok(2, r#"{"tags_detected": 5}"#)),
            Update::Rendered { seq: 2 }
        );
    }

    #[test]
    fn malformed_entries_are_counted_and_skipped() {
        let mut dash = dashboard();
        dash.handle(ok(
            1,
            r#"{"tags_detected": 2, "pose_data": [
                {"tag_id": 8, "distance": 0.5,
                 "position": {"x": 0, "y": 0, "z": 0.5},
                 "angles": {"roll": 0, "pitch": 0, "yaw": 0},
                 "direction": [0, 0, 1]},
                {"tag_id": 9}
            ]}"#,
        ));

        assert_eq!(dash.state().skipped_entries, 1);
        assert_eq!(dash.page().text(Region::LatestTagId), "8");
        let container = dash.page().element(Region::PoseDataContainer).unwrap();
        assert_eq!(container.child_elements().count(), 1);
    }

    #[test]
    fn stream_failure_is_one_way() {
        let mut dash = dashboard();
        assert_eq!(
            dash.handle(DashboardEvent::StreamFailed("refused".into())),
            Update::StreamLost
        );
        assert_eq!(
            dash.handle(DashboardEvent::StreamFailed("refused".into())),
            Update::Unchanged
        );
        assert!(!dash.state().stream_available);
    }

    #[test]
    fn resize_event_updates_width_class() {
        let mut dash = dashboard();
        assert_eq!(
            dash.handle(DashboardEvent::Resize(767)),
            Update::Resized(WidthClass::Narrow)
        );
        assert_eq!(
            dash.handle(DashboardEvent::Resize(768)),
            Update::Resized(WidthClass::Wide)
        );
    }

    #[test]
    fn event_loop_applies_events_in_order() {
        let shared = Arc::new(Mutex::new(dashboard()));
        let (tx, rx) = mpsc::channel();
        let (updates_tx, updates_rx) = mpsc::channel();
        let join = spawn_event_loop(Arc::clone(&shared), rx, move |_, update| {
            let _ = updates_tx.send(update);
        })
        .unwrap();

        tx.send(ok(1, r#"{"tags_detected": 1}"#)).unwrap();
        tx.send(DashboardEvent::Resize(500)).unwrap();
        drop(tx);
        join.join().unwrap();

        let updates: Vec<Update> = updates_rx.iter().collect();
        assert_eq!(
            updates,
            vec![Update::Rendered { seq: 1 }, Update::Resized(WidthClass::Narrow)]
        );
        assert_eq!(lock(&shared).page().text(Region::TagsCount), "1");
    }
}
