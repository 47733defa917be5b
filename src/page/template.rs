//! Stock dashboard markup.

use crate::config::Variant;
use crate::dom::{Document, Element, Node, Selector};

/// Knobs for the generated markup.
#[derive(Debug, Clone)]
pub struct PageOptions {
    pub title: String,
    /// `src` of the live video element.
    pub stream_url: String,
}

impl Default for PageOptions {
    fn default() -> Self {
        Self {
            title: "AprilTag 6DOF Detection".to_string(),
            stream_url: "/video_feed".to_string(),
        }
    }
}

const STYLESHEET: &str = r#"<style>
* { margin: 0; padding: 0; box-sizing: border-box; }
body { background: #0d1117; color: #e6edf3; font-family: -apple-system, 'Segoe UI', Helvetica, Arial, sans-serif; font-size: 14px; }
.container { max-width: 1200px; margin: 0 auto; }
header { padding-bottom: 16px; margin-bottom: 16px; border-bottom: 1px solid #30363d; }
.main { display: grid; grid-template-columns: 2fr 1fr; gap: 16px; }
@media (max-width: 767px) { .main { grid-template-columns: 1fr; } }
.panel { background: #161b22; border: 1px solid #30363d; border-radius: 8px; padding: 16px; }
.panel h2 { font-size: 16px; margin-bottom: 12px; color: #58a6ff; }
.video-container img { width: 100%; border-radius: 6px; }
.stat-row, .data-row { display: flex; justify-content: space-between; padding: 4px 0; }
.stat-label, .data-label { color: #8b949e; }
.stat-value, .data-value { font-family: 'SF Mono', 'Fira Code', monospace; }
.latest-pose { margin-top: 16px; border-top: 1px solid #30363d; padding-top: 12px; }
.tag-data { border: 1px solid #30363d; border-radius: 6px; padding: 10px; margin-bottom: 10px; }
.tag-data h3 { font-size: 14px; margin-bottom: 6px; color: #3fb950; }
.no-tags { color: #8b949e; font-style: italic; }
.live-panel { width: 100%; min-height: 640px; border: 0; }
.panel-frame { background: transparent; }
.panel-stack { display: flex; flex-direction: column; gap: 16px; }
</style>"#;

/// Build the dashboard markup for a variant.
pub fn dashboard(variant: Variant, options: &PageOptions) -> Document {
    let mut doc = Document::new(&options.title);
    doc.head.push(
        Element::new("meta")
            .with_attr("name", "viewport")
            .with_attr("content", "width=device-width, initial-scale=1")
            .into(),
    );
    doc.head.push(Node::Raw(STYLESHEET.to_string()));

    let mut main = Element::new("div")
        .with_class("main")
        .with_child(video_panel(options))
        .with_child(stats_panel(variant));
    if variant == Variant::Full {
        main = main.with_child(
            Element::new("section")
                .with_class("panel")
                .with_child(Element::new("h2").with_text("Tag Details"))
                .with_child(
                    Element::new("div")
                        .with_id("pose-data-container")
                        .with_child(Element::new("p").with_class("no-tags").with_text("No tags detected")),
                ),
        );
    }

    doc.body = Element::new("body").with_child(
        Element::new("div")
            .with_class("container")
            .with_child(
                Element::new("header")
                    .with_child(Element::new("h1").with_text(options.title.clone())),
            )
            .with_child(main),
    );
    doc
}

// ---------------------------------------------------------------------------
// Served views
// ---------------------------------------------------------------------------

/// Whether a `.main` child is the panel holding the video stream.
fn holds_video(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|el| el.find(Selector::Class("video-container")).is_some())
}

/// The page with every panel except the video replaced by a frame that
/// loads `panel_url`.
///
/// The shell carries no refresh meta.
pub fn live_shell(doc: &Document, panel_url: &str) -> Document {
    let mut shell = doc.clone();
    if let Some(main) = shell.query_mut(Selector::Class("main")) {
        main.children.retain(holds_video);
        main.children.push(
            Element::new("iframe")
                .with_class("live-panel")
                .with_attr("src", panel_url)
                .with_attr("title", "Detection statistics")
                .into(),
        );
    }
    shell
}

/// The non-video panels on their own, reloading every `refresh_secs`
/// (`0` disables the reload).
pub fn panel_view(doc: &Document, refresh_secs: u32) -> Document {
    let mut view = Document::new(&doc.title);
    if refresh_secs > 0 {
        view.head.push(
            Element::new("meta")
                .with_attr("http-equiv", "refresh")
                .with_attr("content", &refresh_secs.to_string())
                .into(),
        );
    }
    view.head.push(Node::Raw(STYLESHEET.to_string()));

    let mut stack = Element::new("div").with_class("panel-stack");
    if let Some(main) = doc.query(Selector::Class("main")) {
        stack.children = main
            .children
            .iter()
            .filter(|node| !holds_video(node))
            .cloned()
            .collect();
    }
    view.body = Element::new("body").with_class("panel-frame").with_child(stack);
    view
}

fn video_panel(options: &PageOptions) -> Element {
    Element::new("section")
        .with_class("panel")
        .with_child(Element::new("h2").with_text("Live Feed"))
        .with_child(
            Element::new("div").with_class("video-container").with_child(
                Element::new("img")
                    .with_id("video-feed")
                    .with_attr("src", &options.stream_url)
                    .with_attr("alt", "Live video feed"),
            ),
        )
}

fn stats_panel(variant: Variant) -> Element {
    let mut panel = Element::new("section")
        .with_class("panel")
        .with_child(Element::new("h2").with_text("Detection Statistics"))
        .with_child(stat_row("Tags Detected:", "tags-count", "0"))
        .with_child(stat_row("Processing FPS:", "processing-fps", "0"))
        .with_child(stat_row("Last Detection:", "last-detection", "Never"));

    if variant == Variant::Full {
        panel = panel.with_child(
            Element::new("div")
                .with_id("latest-pose-stats")
                .with_class("latest-pose")
                .with_child(Element::new("h3").with_text("Latest Pose"))
                .with_child(stat_row("Tag:", "latest-tag-id", "-"))
                .with_child(stat_row("Distance:", "latest-distance", "-"))
                .with_child(stat_row("Position:", "latest-position", "-"))
                .with_child(stat_row("Roll:", "latest-roll", "-"))
                .with_child(stat_row("Pitch:", "latest-pitch", "-"))
                .with_child(stat_row("Yaw:", "latest-yaw", "-")),
        );
    }
    panel
}

fn stat_row(label: &str, id: &str, initial: &str) -> Element {
    Element::new("div")
        .with_class("stat-row")
        .with_child(Element::new("span").with_class("stat-label").with_text(label))
        .with_child(
            Element::new("span")
                .with_id(id)
                .with_class("stat-value")
                .with_text(initial),
        )
}
