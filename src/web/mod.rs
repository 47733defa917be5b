//! Embedded dashboard server.
//!
//! Serves the live page and a small JSON API over a synchronous
//! `tiny_http` server:
//! - `GET /` — the page shell: header, live video and a frame for `/panel`
//! - `GET /panel` — stats and tag details, reloading every `refresh_secs`
//! - `GET /api/stats` — the last rendered `/stats` payload
//! - `GET /api/state` — poll/render counters and stream status
//!
//! Browsers report their viewport width through client hints (or a
//! `?width=` parameter); each page request counts as a resize event.

mod api;

use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Response, Server, StatusCode};

use crate::dashboard::{self, Dashboard};
use crate::logging;
use crate::viewport;

/// Route of the auto-refreshing stats panel framed by the shell.
const PANEL_PATH: &str = "/panel";

/// Client hints the page asks browsers to send.
const ACCEPT_CH: &str = "Sec-CH-Viewport-Width, Viewport-Width";

/// A response before it is handed to `tiny_http`.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: Vec<u8>,
}

impl Reply {
    fn html(body: String) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            headers: vec![("Accept-CH", ACCEPT_CH), ("Cache-Control", "no-store")],
            body: body.into_bytes(),
        }
    }

    pub(crate) fn json(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            headers: vec![("Cache-Control", "no-store")],
            body: body.into_bytes(),
        }
    }

    fn not_found() -> Self {
        Self::json(404, r#"{"error": "not found"}"#.to_string())
    }

    fn into_response(self) -> Result<Response<std::io::Cursor<Vec<u8>>>> {
        let mut response = Response::from_data(self.body)
            .with_status_code(StatusCode(self.status))
            .with_header(header("Content-Type", self.content_type)?);
        for (name, value) in self.headers {
            response = response.with_header(header(name, value)?);
        }
        Ok(response)
    }
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name, value).map_err(|()| anyhow::anyhow!("invalid header {name}: {value}"))
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Serve the dashboard on `addr`. Blocks the current thread.
///
/// Requests are handled sequentially; errors are answered with a JSON 500
/// and never stop the server.
pub fn serve(addr: &str, dashboard: Arc<Mutex<Dashboard>>, open: bool) -> Result<()> {
    let server = Server::http(addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    logging::info("web", &format!("dashboard running at http://{addr}"));
    if open {
        let _ = open_browser(&format!("http://{addr}"));
    }

    for request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();
        let headers: Vec<(String, String)> = request
            .headers()
            .iter()
            .map(|h| (h.field.as_str().as_str().to_string(), h.value.as_str().to_string()))
            .collect();

        let reply = dispatch(&dashboard, &method, &url, &headers).unwrap_or_else(|e| {
            let body = serde_json::json!({ "error": format!("{e:#}") }).to_string();
            Reply::json(500, body)
        });
        let status = reply.status;

        match reply.into_response() {
            Ok(response) => {
                let _ = request.respond(response);
            }
            Err(e) => logging::error("web", &format!("could not build response: {e:#}")),
        }

        logging::info(
            "web",
            &format!(
                "{method} {url} {status} {}",
                chrono::Local::now().format("%H:%M:%S")
            ),
        );
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Route one request.
pub fn dispatch(
    dashboard: &Mutex<Dashboard>,
    method: &Method,
    url: &str,
    headers: &[(String, String)],
) -> Result<Reply> {
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            let width = viewport::width_from_request(
                headers.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                url,
            );
            let mut guard = dashboard::lock(dashboard);
            if let Some(width) = width {
                guard.resize(width);
            }
            Ok(Reply::html(guard.page().shell_html(PANEL_PATH)))
        }
        (&Method::Get, PANEL_PATH) => {
            let guard = dashboard::lock(dashboard);
            Ok(Reply::html(guard.page().panel_html(guard.refresh_secs())))
        }
        (&Method::Get, "/api/stats") => api::get_stats(&dashboard::lock(dashboard)),
        (&Method::Get, "/api/state") => api::get_state(&dashboard::lock(dashboard)),
        _ => Ok(Reply::not_found()),
    }
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
