//! Live video stream failure handling.
//!
//! The first failure hides the video element and replaces the video panel
//! with a static notice. The transition is one-way: later failures change
//! nothing and there is no automatic recovery.
//!
//! Failures are detected by probing the backend's MJPEG endpoint at
//! startup and periodically afterwards. A probe only reads the response
//! head; the multipart body is never consumed.

use std::ops::ControlFlow;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::schema::BackendConfig;
use crate::dom::Element;
use crate::page::{Region, Surface};
use crate::poller::{StopHandle, Ticker};

pub const UNAVAILABLE_TITLE: &str = "Video Stream Unavailable";
pub const UNAVAILABLE_DETAIL: &str =
    "The camera stream could not be loaded. Please check your connection and refresh the page.";

// ---------------------------------------------------------------------------
// Watchdog
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct StreamWatchdog {
    failed: bool,
}

impl StreamWatchdog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_available(&self) -> bool {
        !self.failed
    }

    /// Handle a stream failure event. Returns `true` only for the event
    /// that actually switched the panel.
    pub fn on_error<S: Surface + ?Sized>(&mut self, surface: &mut S, reason: &str) -> bool {
        if self.failed {
            crate::logging::debug("stream", &format!("ignoring repeated failure: {reason}"));
            return false;
        }
        self.failed = true;

        crate::logging::error("stream", &format!("error loading video feed: {reason}"));
        surface.set_style(Region::VideoFeed, "display", "none");
        surface.replace_children(Region::VideoContainer, vec![unavailable_panel().into()]);
        true
    }
}

/// The static notice shown in place of the video.
pub fn unavailable_panel() -> Element {
    Element::new("div")
        .with_style("padding", "20px")
        .with_style("text-align", "center")
        .with_child(
            Element::new("h3")
                .with_style("color", "#ff6b6b")
                .with_text(UNAVAILABLE_TITLE),
        )
        .with_child(Element::new("p").with_text(UNAVAILABLE_DETAIL))
}

// ---------------------------------------------------------------------------
// Probe
// ---------------------------------------------------------------------------

/// Checks that the stream endpoint answers with a video content type.
pub struct StreamProbe {
    url: String,
    agent: ureq::Agent,
}

impl StreamProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            agent: ureq::AgentBuilder::new().timeout_connect(timeout).timeout_read(timeout).build(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self::new(config.stream_url(), Duration::from_millis(config.timeout_ms))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn check(&self) -> Result<()> {
        let response = self
            .agent
            .get(&self.url)
            .call()
            .with_context(|| format!("GET {} failed", self.url))?;
        check_content_type(response.content_type())
            .with_context(|| format!("{} is not a video stream", self.url))
    }

    /// Probe now and then every `interval`; call `on_failure` once with the
    /// reason of the first failed probe, after which probing stops.
    pub fn spawn<F>(self, interval: Duration, on_failure: F) -> Result<StopHandle>
    where
        F: FnOnce(String) + Send + 'static,
    {
        let mut on_failure = Some(on_failure);
        Ticker::spawn("stream-probe", interval, move || match self.check() {
            Ok(()) => ControlFlow::Continue(()),
            Err(e) => {
                if let Some(notify) = on_failure.take() {
                    notify(format!("{e:#}"));
                }
                ControlFlow::Break(())
            }
        })
        .context("failed to start stream probe thread")
    }
}

/// Accept MJPEG (`multipart/x-mixed-replace`) and single images.
pub fn check_content_type(content_type: &str) -> Result<()> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    if essence == "multipart/x-mixed-replace" || essence.starts_with("image/") {
        Ok(())
    } else {
        anyhow::bail!("unexpected content type '{content_type}'")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
