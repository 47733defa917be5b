//! Breakpoint-driven container padding.
//!
//! Re-applied on load and on every resize event. Applying the same width
//! class twice rewrites the same style value.

use crate::config::schema::ViewportConfig;
use crate::page::{Region, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WidthClass {
    Narrow,
    Wide,
}

#[derive(Debug, Clone)]
pub struct ViewportAdapter {
    breakpoint: u32,
    narrow_padding: String,
    wide_padding: String,
}

impl ViewportAdapter {
    pub fn from_config(config: &ViewportConfig) -> Self {
        Self {
            breakpoint: config.breakpoint,
            narrow_padding: config.narrow_padding.clone(),
            wide_padding: config.wide_padding.clone(),
        }
    }

    pub fn classify(&self, width: u32) -> WidthClass {
        if width < self.breakpoint {
            WidthClass::Narrow
        } else {
            WidthClass::Wide
        }
    }

    pub fn padding(&self, class: WidthClass) -> &str {
        match class {
            WidthClass::Narrow => &self.narrow_padding,
            WidthClass::Wide => &self.wide_padding,
        }
    }

    /// Set the container padding for `width` and return the class used.
    pub fn apply<S: Surface + ?Sized>(&self, surface: &mut S, width: u32) -> WidthClass {
        let class = self.classify(width);
        surface.set_style(Region::Container, "padding", self.padding(class));
        class
    }
}

impl Default for ViewportAdapter {
    fn default() -> Self {
        Self::from_config(&ViewportConfig::default())
    }
}

/// Extract a viewport width reported by a browser request.
///
/// Looks at the `Sec-CH-Viewport-Width` and `Viewport-Width` client hints
/// first, then a `width=N` query parameter.
pub fn width_from_request<'a>(
    headers: impl IntoIterator<Item = (&'a str, &'a str)>,
    url: &str,
) -> Option<u32> {
    let from_headers = headers.into_iter().find_map(|(name, value)| {
        let name = name.to_ascii_lowercase();
        if name == "sec-ch-viewport-width" || name == "viewport-width" {
            parse_width(value)
        } else {
            None
        }
    });

    from_headers.or_else(|| {
        url.split_once('?')?.1.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            if k == "width" { parse_width(v) } else { None }
        })
    })
}

fn parse_width(raw: &str) -> Option<u32> {
    let raw = raw.trim();
    // Client hints may carry a fractional CSS pixel value.
    let value: f64 = raw.parse().ok()?;
    (value.is_finite() && value > 0.0 && value < f64::from(u32::MAX)).then(|| value as u32)
}
