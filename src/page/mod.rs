//! The dashboard page and its named display regions.
//!
//! A [`Page`] is a [`Document`] that has been checked, once, to contain
//! every region the chosen [`Variant`] writes to. Renderers never look up
//! elements themselves; they write to a [`Surface`] by [`Region`], which
//! keeps them independent of the markup and testable with a mock surface.

mod template;

use anyhow::Result;

use crate::config::Variant;
use crate::dom::html;
use crate::dom::{Document, Element, Node, Selector};

pub use template::PageOptions;

/// A named display region of the dashboard markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    TagsCount,
    ProcessingFps,
    LastDetection,
    PoseDataContainer,
    LatestTagId,
    LatestDistance,
    LatestPosition,
    LatestRoll,
    LatestPitch,
    LatestYaw,
    LatestPoseStats,
    VideoFeed,
    Container,
    VideoContainer,
}

impl Region {
    pub const ALL: [Region; 14] = [
        Region::TagsCount,
        Region::ProcessingFps,
        Region::LastDetection,
        Region::PoseDataContainer,
        Region::LatestTagId,
        Region::LatestDistance,
        Region::LatestPosition,
        Region::LatestRoll,
        Region::LatestPitch,
        Region::LatestYaw,
        Region::LatestPoseStats,
        Region::VideoFeed,
        Region::Container,
        Region::VideoContainer,
    ];

    /// The six fields of the latest-pose summary.
    pub const SUMMARY_FIELDS: [Region; 6] = [
        Region::LatestTagId,
        Region::LatestDistance,
        Region::LatestPosition,
        Region::LatestRoll,
        Region::LatestPitch,
        Region::LatestYaw,
    ];

    pub fn selector(self) -> Selector {
        match self {
            Region::TagsCount => Selector::Id("tags-count"),
            Region::ProcessingFps => Selector::Id("processing-fps"),
            Region::LastDetection => Selector::Id("last-detection"),
            Region::PoseDataContainer => Selector::Id("pose-data-container"),
            Region::LatestTagId => Selector::Id("latest-tag-id"),
            Region::LatestDistance => Selector::Id("latest-distance"),
            Region::LatestPosition => Selector::Id("latest-position"),
            Region::LatestRoll => Selector::Id("latest-roll"),
            Region::LatestPitch => Selector::Id("latest-pitch"),
            Region::LatestYaw => Selector::Id("latest-yaw"),
            Region::LatestPoseStats => Selector::Id("latest-pose-stats"),
            Region::VideoFeed => Selector::Id("video-feed"),
            Region::Container => Selector::Class("container"),
            Region::VideoContainer => Selector::Class("video-container"),
        }
    }

    /// Whether the region only exists in the full variant.
    pub fn is_pose_region(self) -> bool {
        matches!(self, Region::PoseDataContainer | Region::LatestPoseStats)
            || Self::SUMMARY_FIELDS.contains(&self)
    }

    /// Regions a variant writes to and therefore requires at bind time.
    pub fn required_for(variant: Variant) -> Vec<Region> {
        Self::ALL
            .into_iter()
            .filter(|r| variant == Variant::Full || !r.is_pose_region())
            .collect()
    }
}

/// Anything dashboard regions can be written to.
pub trait Surface {
    /// Replace the region's content with plain text.
    fn set_text(&mut self, region: Region, text: &str);

    /// Replace the region's children wholesale.
    fn replace_children(&mut self, region: Region, children: Vec<Node>);

    /// Set one inline style property on the region.
    fn set_style(&mut self, region: Region, property: &str, value: &str);
}

/// The dashboard document bound to its regions.
#[derive(Debug, Clone)]
pub struct Page {
    doc: Document,
    variant: Variant,
}

impl Page {
    /// Bind a document, failing with the full list of missing regions.
    pub fn bind(doc: Document, variant: Variant) -> Result<Self> {
        let missing: Vec<String> = Region::required_for(variant)
            .into_iter()
            .filter(|region| doc.query(region.selector()).is_none())
            .map(|region| region.selector().to_string())
            .collect();

        if !missing.is_empty() {
            anyhow::bail!(
                "dashboard markup is missing required regions: {}",
                missing.join(", ")
            );
        }

        Ok(Self { doc, variant })
    }

    /// Build and bind the stock dashboard markup.
    pub fn dashboard(variant: Variant, options: &PageOptions) -> Result<Self> {
        Self::bind(template::dashboard(variant, options), variant)
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// The region's element, if it is still present.
    ///
    /// Regions can disappear after binding, e.g. `#video-feed` once the
    /// stream panel has been replaced.
    pub fn element(&self, region: Region) -> Option<&Element> {
        self.doc.query(region.selector())
    }

    /// Text content of a region, empty if the region is gone.
    pub fn text(&self, region: Region) -> String {
        self.element(region)
            .map(Element::text_content)
            .unwrap_or_default()
    }

    pub fn to_html(&self) -> String {
        html::render_document(&self.doc)
    }

    /// The page as served at `/`: video panel plus a frame loading
    /// `panel_url`.
    pub fn shell_html(&self, panel_url: &str) -> String {
        html::render_document(&template::live_shell(&self.doc, panel_url))
    }

    /// Stats and tag details alone, reloading every `refresh_secs`.
    pub fn panel_html(&self, refresh_secs: u32) -> String {
        html::render_document(&template::panel_view(&self.doc, refresh_secs))
    }

    fn element_mut(&mut self, region: Region) -> Option<&mut Element> {
        self.doc.query_mut(region.selector())
    }
}

impl Surface for Page {
    fn set_text(&mut self, region: Region, text: &str) {
        if let Some(el) = self.element_mut(region) {
            el.set_text(text);
        }
    }

    fn replace_children(&mut self, region: Region, children: Vec<Node>) {
        if let Some(el) = self.element_mut(region) {
            el.replace_children(children);
        }
    }

    fn set_style(&mut self, region: Region, property: &str, value: &str) {
        if let Some(el) = self.element_mut(region) {
            el.set_style(property, value);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_markup_binds_for_both_variants() {
        let options = PageOptions::default();
        assert!(Page::dashboard(Variant::Full, &options).is_ok());
        assert!(Page::dashboard(Variant::Simple, &options).is_ok());
    }

    #[test]
    fn simple_markup_has_no_pose_regions() {
        let page = Page::dashboard(Variant::Simple, &PageOptions::default()).unwrap();
        assert!(page.element(Region::PoseDataContainer).is_none());
        assert!(page.element(Region::LatestTagId).is_none());
        assert!(page.element(Region::TagsCount).is_some());
    }

    #[test]
    fn bind_reports_every_missing_region() {
        let mut doc = Document::new("bare");
        doc.body = Element::new("body")
            .with_child(Element::new("div").with_class("container"))
            .with_child(Element::new("span").with_id("tags-count"));

        let err = Page::bind(doc, Variant::Simple).unwrap_err().to_string();
        assert!(err.contains("#processing-fps"));
        assert!(err.contains("#last-detection"));
        assert!(err.contains("#video-feed"));
        assert!(err.contains(".video-container"));
        assert!(!err.contains("#tags-count"));
        assert!(!err.contains("#latest-tag-id"));
    }

    #[test]
    fn full_variant_requires_pose_regions() {
        let simple = Page::dashboard(Variant::Simple, &PageOptions::default()).unwrap();
        let err = Page::bind(simple.document().clone(), Variant::Full)
            .unwrap_err()
            .to_string();
        assert!(err.contains("#pose-data-container"));
        assert!(err.contains("#latest-pose-stats"));
    }

    #[test]
    fn surface_writes_land_in_document() {
        let mut page = Page::dashboard(Variant::Full, &PageOptions::default()).unwrap();
        page.set_text(Region::TagsCount, "7");
        page.set_style(Region::Container, "padding", "10px");
        page.replace_children(Region::PoseDataContainer, vec![Node::text("x")]);

        assert_eq!(page.text(Region::TagsCount), "7");
        assert_eq!(
            page.element(Region::Container).unwrap().style("padding"),
            Some("10px")
        );
        assert_eq!(page.text(Region::PoseDataContainer), "x");
        assert!(page.to_html().contains(r#"<span id="tags-count" class="stat-value">7</span>"#));
    }

    #[test]
    fn writes_to_vanished_region_are_ignored() {
        let mut page = Page::dashboard(Variant::Full, &PageOptions::default()).unwrap();
        page.replace_children(Region::VideoContainer, vec![]);
        page.set_style(Region::VideoFeed, "display", "none");
        assert!(page.element(Region::VideoFeed).is_none());
    }
}
