//! JSON API handlers for the web dashboard.
//!
//! Each handler takes the locked dashboard and returns a JSON [`Reply`].

use anyhow::{Context, Result};

use crate::dashboard::Dashboard;

use super::Reply;

/// `GET /api/stats` — the last rendered payload, or `null` before the
/// first successful poll.
pub fn get_stats(dashboard: &Dashboard) -> Result<Reply> {
    let body =
        serde_json::to_string(&dashboard.last_payload()).context("failed to serialize stats")?;
    Ok(Reply::json(200, body))
}

/// `GET /api/state` — poll, render and stream status.
pub fn get_state(dashboard: &Dashboard) -> Result<Reply> {
    let body = serde_json::to_string(&dashboard.state()).context("failed to serialize state")?;
    Ok(Reply::json(200, body))
}
