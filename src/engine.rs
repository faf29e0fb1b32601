//! Collaborator Interfaces
//!
//! The charting engine and the host preview surface live outside this crate.
//! The bridge sees them only through these two traits, so its logic runs
//! against in-process fakes as readily as against a browser-hosted engine.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::constants::ExportFormat;

/// An exception raised by the charting engine; the text is surfaced verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct EngineError(pub String);

/// Format token the engine is asked to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EngineFormat {
    #[serde(rename = "png")]
    Png,
    #[serde(rename = "jpeg")]
    Jpeg,
    #[serde(rename = "webp")]
    Webp,
    #[serde(rename = "svg")]
    Svg,
    #[serde(rename = "full-json")]
    FullJson,
}

impl EngineFormat {
    /// Documents and EMF are converted downstream from a vector rendering.
    pub fn for_export(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Png => EngineFormat::Png,
            ExportFormat::Jpeg => EngineFormat::Jpeg,
            ExportFormat::Webp => EngineFormat::Webp,
            ExportFormat::Svg | ExportFormat::Pdf | ExportFormat::Eps | ExportFormat::Emf => {
                EngineFormat::Svg
            }
            ExportFormat::Json => EngineFormat::FullJson,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EngineFormat::Png => "png",
            EngineFormat::Jpeg => "jpeg",
            EngineFormat::Webp => "webp",
            EngineFormat::Svg => "svg",
            EngineFormat::FullJson => "full-json",
        }
    }
}

/// How the engine treats the chart background while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackgroundMode {
    /// Leave the background alone.
    Keep,
    /// Blend onto an opaque background (targets without transparency).
    Opaque,
    /// Report the paper background color and render it transparent, so the
    /// page underneath can carry it.
    CaptureForPage,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOptions {
    pub format: EngineFormat,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
    /// Return the payload without its data-URI prefix.
    pub image_data_only: bool,
    pub background: BackgroundMode,
}

/// The `{data, layout, config}` triple handed to the engine.
#[derive(Debug, Clone, Serialize)]
pub struct EngineFigure<'a> {
    pub data: &'a [Value],
    pub layout: &'a Map<String, Value>,
    pub config: Map<String, Value>,
}

/// What the engine hands back from one image call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineImage {
    pub data: String,
    /// Paper background captured under [`BackgroundMode::CaptureForPage`].
    pub background_color: Option<String>,
}

impl EngineImage {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            background_color: None,
        }
    }
}

/// The externally supplied charting engine.
#[allow(async_fn_in_trait)]
pub trait ChartingEngine {
    /// Transient display element used by engines that must draw before
    /// producing an image.
    type Element;

    fn version(&self) -> &str;

    /// Produce an image straight from the figure.
    async fn to_image(
        &self,
        figure: &EngineFigure<'_>,
        options: &ImageOptions,
    ) -> Result<EngineImage, EngineError>;

    /// Create an element and draw the figure into it.
    async fn mount(&self, figure: &EngineFigure<'_>) -> Result<Self::Element, EngineError>;

    /// Produce an image from a drawn element.
    async fn element_to_image(
        &self,
        element: &Self::Element,
        options: &ImageOptions,
    ) -> Result<EngineImage, EngineError>;

    /// Tear down an element created by [`ChartingEngine::mount`].
    fn release(&self, element: Self::Element);
}

/// Signal fired by the preview surface once a source has been set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceSignal {
    Loaded,
    Error(String),
}

/// The host's asset-preview element and its companion style element.
///
/// Methods take `&mut self`: one document-path request holds the surface
/// at a time.
#[allow(async_fn_in_trait)]
pub trait PreviewSurface {
    /// Replace the companion style element's content.
    fn set_style(&mut self, css: &str);

    /// Set the preview source and wait for its load or error signal.
    ///
    /// The bridge races this against a timer; dropping the future must
    /// detach any listener it installed.
    async fn load(&mut self, src: &str) -> SurfaceSignal;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_format_mapping() {
        assert_eq!(EngineFormat::for_export(ExportFormat::Pdf), EngineFormat::Svg);
        assert_eq!(EngineFormat::for_export(ExportFormat::Eps), EngineFormat::Svg);
        assert_eq!(EngineFormat::for_export(ExportFormat::Emf), EngineFormat::Svg);
        assert_eq!(EngineFormat::for_export(ExportFormat::Json), EngineFormat::FullJson);
        assert_eq!(EngineFormat::for_export(ExportFormat::Webp), EngineFormat::Webp);
        assert_eq!(EngineFormat::FullJson.as_str(), "full-json");
    }

    #[test]
    fn test_image_options_wire_shape() {
        let opts = ImageOptions {
            format: EngineFormat::FullJson,
            width: 700.0,
            height: 500.0,
            scale: 1.0,
            image_data_only: true,
            background: BackgroundMode::CaptureForPage,
        };
        let v = serde_json::to_value(&opts).unwrap();
        assert_eq!(v["format"], "full-json");
        assert_eq!(v["imageDataOnly"], true);
        assert_eq!(v["background"], "capture-for-page");
    }
}
