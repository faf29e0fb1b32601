//! Document Page Composition
//!
//! PDF and EPS exports are printed from the host's preview surface. The page
//! is sized to the scaled figure and painted with the chart's captured
//! paper color, since the engine rendered the figure itself transparent.

use serde::Serialize;

use crate::parse::CanonicalRequest;

/// Background used when the engine reported no paper color.
pub const FALLBACK_PAGE_BACKGROUND: &str = "transparent";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintPage {
    pub width_px: f64,
    pub height_px: f64,
    pub background: String,
}

impl PrintPage {
    pub fn for_request(request: &CanonicalRequest, background: Option<&str>) -> Self {
        Self {
            width_px: request.width * request.scale,
            height_px: request.height * request.scale,
            background: background
                .filter(|b| !b.is_empty())
                .unwrap_or(FALLBACK_PAGE_BACKGROUND)
                .to_string(),
        }
    }

    /// Style rule written into the surface's companion style element.
    pub fn to_css(&self) -> String {
        format!(
            "@page {{ size: {}px {}px; }}\nbody {{ margin: 0; padding: 0; background-color: {} }}\n",
            self.width_px, self.height_px, self.background
        )
    }
}
