//! CLI command implementations.
//!
//! Provides subcommand handlers for:
//! - `tagview serve` — poll the backend and serve the live dashboard page
//! - `tagview watch` — poll the backend and redraw the dashboard in the terminal
//! - `tagview once` — fetch `/stats` a single time and print it
//! - `tagview health` — check config, backend `/stats` and the video stream
//! - `tagview config show|init|set|reset` — configuration management

use std::sync::Arc;
use std::thread;

use anyhow::Result;
use colored::Colorize;

use crate::config::{self, TagviewConfig, Variant};
use crate::dashboard::{Dashboard, Running, Update};
use crate::logging;
use crate::page::Region;
use crate::poller::{HttpStatsSource, StatsPoller, StatsSource};
use crate::stream::StreamProbe;
use crate::web;

/// Output format for one-shot commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Html,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("html") => Self::Html,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// tagview serve
// ---------------------------------------------------------------------------

/// Start polling and serve the page until the process is killed.
pub fn run_serve(config: &TagviewConfig, open: bool) -> Result<()> {
    let running = Running::start(config, |_, update| log_update(update))?;

    println!(
        "{} polling {} every {} ms",
        "tagview".bold().cyan(),
        config.backend.stats_url(),
        config.poller.interval_ms
    );
    println!(
        "  {} http://{}",
        "Dashboard:".bold(),
        config.web.addr
    );

    web::serve(&config.web.addr, Arc::clone(&running.dashboard), open)?;
    running.stop();
    Ok(())
}

fn log_update(update: Update) {
    match update {
        Update::Rendered { seq } => logging::debug("dashboard", &format!("rendered #{seq}")),
        Update::Resized(class) => logging::debug("viewport", &format!("width class {class:?}")),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// tagview watch
// ---------------------------------------------------------------------------

/// Redraw the dashboard in the terminal after every applied update.
pub fn run_watch(config: &TagviewConfig) -> Result<()> {
    let _running = Running::start(config, |dashboard, update| match update {
        Update::Rendered { .. } | Update::StreamLost => {
            // Clear screen and home the cursor.
            print!("\x1B[2J\x1B[H");
            print_dashboard(dashboard);
        }
        Update::FetchFailed { seq } => {
            let detail = dashboard.state().last_error.unwrap_or_default();
            println!("{} request #{seq}: {}", "Error fetching stats:".red().bold(), detail);
        }
        _ => {}
    })?;

    loop {
        thread::park();
    }
}

// ---------------------------------------------------------------------------
// tagview once
// ---------------------------------------------------------------------------

/// Fetch `/stats` once, render it and print the result.
pub fn run_once(config: &TagviewConfig, format: OutputFormat) -> Result<()> {
    let poller = StatsPoller::new(HttpStatsSource::from_config(&config.backend));
    let result = poller.fetch_now();

    let mut dashboard = Dashboard::from_config(config)?;
    if let Update::FetchFailed { .. } = dashboard.apply_stats(result) {
        let detail = dashboard.state().last_error.unwrap_or_default();
        anyhow::bail!("error fetching stats: {detail}");
    }

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&dashboard.last_payload())?);
        }
        OutputFormat::Html => println!("{}", dashboard.page().to_html()),
        OutputFormat::Table => print_dashboard(&dashboard),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Terminal rendering
// ---------------------------------------------------------------------------

fn print_dashboard(dashboard: &Dashboard) {
    println!("{}", "AprilTag 6DOF Detection".bold().cyan());
    println!("{}", "=".repeat(50));
    for (label, value) in dashboard_rows(dashboard) {
        println!("  {} {}", format!("{label:<16}").bold(), value);
    }

    if !dashboard.state().stream_available {
        println!();
        println!("  {}", crate::stream::UNAVAILABLE_TITLE.red().bold());
    }

    if dashboard.variant() == Variant::Full {
        println!();
        println!("{}", "Tag Details".bold().cyan());
        for line in tag_detail_lines(dashboard) {
            if line.starts_with("Tag ID") {
                println!("  {}", line.bold());
            } else {
                println!("    {}", line.dimmed());
            }
        }
    }
}

/// Label and current text of every summary region on the page.
fn dashboard_rows(dashboard: &Dashboard) -> Vec<(&'static str, String)> {
    let page = dashboard.page();
    let mut rows = vec![
        ("Tags Detected:", page.text(Region::TagsCount)),
        ("Processing FPS:", page.text(Region::ProcessingFps)),
        ("Last Detection:", page.text(Region::LastDetection)),
    ];

    if dashboard.variant() == Variant::Full {
        rows.extend([
            ("Tag:", page.text(Region::LatestTagId)),
            ("Distance:", page.text(Region::LatestDistance)),
            ("Position:", page.text(Region::LatestPosition)),
            ("Roll:", page.text(Region::LatestRoll)),
            ("Pitch:", page.text(Region::LatestPitch)),
            ("Yaw:", page.text(Region::LatestYaw)),
        ]);
    }
    rows
}

/// One line per heading or data row in the per-tag region.
fn tag_detail_lines(dashboard: &Dashboard) -> Vec<String> {
    let Some(container) = dashboard.page().element(Region::PoseDataContainer) else {
        return Vec::new();
    };

    let mut lines = Vec::new();
    for panel in container.child_elements() {
        if !panel.has_class("tag-data") {
            lines.push(panel.text_content());
            continue;
        }
        for part in panel.child_elements() {
            if part.has_class("data-row") {
                let cells: Vec<String> = part.child_elements().map(|c| c.text_content()).collect();
                lines.push(cells.join(" "));
            } else {
                lines.push(part.text_content());
            }
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// tagview health
// ---------------------------------------------------------------------------

/// Check config files, backend `/stats` and the video stream.
pub fn run_health(config: &TagviewConfig) -> Result<()> {
    println!("{}", "tagview Health Check".bold().cyan());
    println!("{}", "=".repeat(50));

    // 1. Config files
    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    print_health_item(
        "Global config",
        true,
        if global_exists {
            "~/.tagview/config.toml"
        } else {
            "using defaults (no ~/.tagview/config.toml)"
        },
    );
    print_health_item("Variant", true, &config.general.variant.to_string());

    // 2. Backend /stats
    let source = HttpStatsSource::from_config(&config.backend);
    match source.fetch() {
        Ok(parsed) => {
            let mut detail = format!(
                "{} ({} tags)",
                source.url(),
                parsed.payload.tags_detected.unwrap_or(0)
            );
            if !parsed.skipped.is_empty() {
                detail.push_str(&format!(", {} malformed pose entries", parsed.skipped.len()));
            }
            print_health_item("Backend /stats", true, &detail);
        }
        Err(e) => print_health_item("Backend /stats", false, &format!("{e:#}")),
    }

    // 3. Video stream
    if config.stream.enabled {
        let probe = StreamProbe::from_config(&config.backend);
        match probe.check() {
            Ok(()) => print_health_item("Video stream", true, probe.url()),
            Err(e) => print_health_item("Video stream", false, &format!("{e:#}")),
        }
    } else {
        print_health_item("Video stream", true, "probe disabled");
    }

    // 4. Event log
    let log_path = config::expand_home(&config.logging.path);
    let log_exists = log_path.as_ref().is_some_and(|p| p.exists());
    print_health_item(
        "Event log",
        log_exists || !config.logging.enabled,
        &match (&log_path, config.logging.enabled) {
            (_, false) => "disabled".to_string(),
            (Some(path), true) if log_exists => path.display().to_string(),
            _ => "no log file yet".to_string(),
        },
    );

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<18} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// tagview config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective tagview Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.tagview/config.toml", global_exists);
    print_source(".tagview.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "TAGVIEW_* environment variables".dimmed()
    );
    println!("  {} {}", "·".dimmed(), "command-line flags".dimmed());

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.tagview/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::TickResult;
    use crate::stats::StatsPayload;

    const ONE_TAG: &str = r#"{
        "tags_detected": 1,
        "processing_fps": 14.7,
        "last_detection_time": "12:03:04",
        "pose_data": [{
            "tag_id": 5, "distance": 0.8421,
            "position": {"x": 0.1, "y": -0.2, "z": 1.5},
            "angles": {"roll": 1.0, "pitch": -2.0, "yaw": 90.0},
            "direction": [0, 0, 1]
        }]
    }"#;

    fn rendered(variant: Variant, body: &str) -> Dashboard {
        let mut config = TagviewConfig::default();
        config.general.variant = variant;
        let mut dashboard = Dashboard::from_config(&config).unwrap();
        dashboard.apply_stats(TickResult {
            seq: 1,
            outcome: StatsPayload::parse(body),
        });
        dashboard
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("html")), OutputFormat::Html);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn rows_follow_page_regions() {
        let dashboard = rendered(Variant::Full, ONE_TAG);
        let rows = dashboard_rows(&dashboard);
        assert_eq!(rows.len(), 9);
        assert_eq!(rows[0], ("Tags Detected:", "1".to_string()));
        assert_eq!(rows[3], ("Tag:", "5".to_string()));
        assert_eq!(rows[4], ("Distance:", "0.842 m".to_string()));
    }

    #[test]
    fn simple_variant_has_counters_only() {
        let dashboard = rendered(Variant::Simple, ONE_TAG);
        assert_eq!(dashboard_rows(&dashboard).len(), 3);
        assert!(tag_detail_lines(&dashboard).is_empty());
    }

    #[test]
    fn detail_lines_flatten_tag_panels() {
        let dashboard = rendered(Variant::Full, ONE_TAG);
        let lines = tag_detail_lines(&dashboard);
        assert_eq!(lines[0], "Tag ID: 5");
        assert_eq!(lines[1], "Distance: 0.842 meters");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn detail_lines_show_placeholder_when_empty() {
        let dashboard = rendered(Variant::Full, r#"{"tags_detected": 0}"#);
        assert_eq!(tag_detail_lines(&dashboard), vec!["No tags detected".to_string()]);
    }
}
