//! Writes a [`StatsPayload`] into the dashboard regions.
//!
//! Every render overwrites the previous state completely: counters are
//! reset, the summary is rewritten, and the per-tag list is rebuilt from
//! scratch. Nothing is diffed or retained between renders.

pub mod format;

use crate::config::Variant;
use crate::dom::{Element, Node};
use crate::page::{Region, Surface};
use crate::stats::{PoseEntry, StatsPayload};

pub use format::{NEVER, PLACEHOLDER};

/// Text of the empty-list placeholder in the per-tag region.
pub const NO_TAGS: &str = "No tags detected";

/// Render one payload for the given variant.
pub fn render_stats<S: Surface + ?Sized>(surface: &mut S, variant: Variant, payload: &StatsPayload) {
    render_counters(surface, payload);

    if variant == Variant::Full {
        let poses = payload.poses();
        render_latest_pose(surface, poses.first());
        render_pose_list(surface, poses);
    }
}

/// Tag count, processing rate and last-detection time.
pub fn render_counters<S: Surface + ?Sized>(surface: &mut S, payload: &StatsPayload) {
    surface.set_text(Region::TagsCount, &format::tag_count(payload.tags_detected));
    surface.set_text(
        Region::ProcessingFps,
        &format::processing_rate(payload.processing_fps),
    );
    surface.set_text(
        Region::LastDetection,
        &format::last_detection(payload.last_detection_time.as_deref()),
    );
}

/// The summary panel shows the first pose entry, or `-` everywhere.
pub fn render_latest_pose<S: Surface + ?Sized>(surface: &mut S, first: Option<&PoseEntry>) {
    let Some(tag) = first else {
        for region in Region::SUMMARY_FIELDS {
            surface.set_text(region, PLACEHOLDER);
        }
        return;
    };

    surface.set_text(Region::LatestTagId, &tag.tag_id.to_string());
    surface.set_text(Region::LatestDistance, &format::summary_distance(tag.distance));
    surface.set_text(Region::LatestPosition, &format::summary_position(&tag.position));
    surface.set_text(Region::LatestRoll, &format::degrees(tag.angles.roll));
    surface.set_text(Region::LatestPitch, &format::degrees(tag.angles.pitch));
    surface.set_text(Region::LatestYaw, &format::degrees(tag.angles.yaw));
}

/// Rebuild the per-tag list, one panel per entry in input order.
pub fn render_pose_list<S: Surface + ?Sized>(surface: &mut S, poses: &[PoseEntry]) {
    let children = if poses.is_empty() {
        vec![
            Element::new("p")
                .with_class("no-tags")
                .with_text(NO_TAGS)
                .into(),
        ]
    } else {
        poses.iter().map(|tag| tag_panel(tag).into()).collect()
    };

    surface.replace_children(Region::PoseDataContainer, children);
}

/// The detail panel for one tag.
pub fn tag_panel(tag: &PoseEntry) -> Element {
    Element::new("div")
        .with_class("tag-data")
        .with_child(Element::new("h3").with_text(format!("Tag ID: {}", tag.tag_id)))
        .with_child(data_row("Distance:", format::detail_distance(tag.distance)))
        .with_child(data_row("Angles:", format::detail_angles(&tag.angles)))
        .with_child(data_row("Position:", format::detail_position(&tag.position)))
        .with_child(data_row("Direction:", format::detail_direction(&tag.direction)))
}

fn data_row(label: &str, value: String) -> Node {
    Element::new("div")
        .with_class("data-row")
        .with_child(Element::new("span").with_class("data-label").with_text(label))
        .with_child(Element::new("span").with_class("data-value").with_text(value))
        .into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
