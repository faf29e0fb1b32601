//! Rendering Bridge - Single Entry Point
//!
//! Drives the charting engine for one canonical request and adapts what it
//! returns to the stable response contract. Steps run strictly in order:
//! version gate, engine call, then (documents only) the preview-surface load.
//! Nothing is retried; every failure becomes a response with `code != 0`.

use base64::Engine as _;
use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::constants::{strip_base64_prefix, ExportFormat, StatusCode, SVG_PREFIX};
use crate::engine::{
    BackgroundMode, ChartingEngine, EngineError, EngineFigure, EngineFormat, EngineImage,
    ImageOptions, PreviewSurface, SurfaceSignal,
};
use crate::hashing::request_fingerprint;
use crate::parse::{parse, CanonicalRequest, ParseError, ParseResponse};
use crate::print::PrintPage;
use crate::version::{resolve_profile, CapabilityProfile};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExportError {
    #[error("engine version: {0}")]
    UnsupportedEngineVersion(String),

    #[error("engine version: {0}")]
    UnsupportedFormatForVersion(String),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("{0}")]
    Conversion(String),
}

impl ExportError {
    pub fn status(&self) -> StatusCode {
        match self {
            ExportError::UnsupportedEngineVersion(_) => StatusCode::UnsupportedEngineVersion,
            ExportError::UnsupportedFormatForVersion(_) => StatusCode::UnsupportedFormatForVersion,
            ExportError::Engine(_) => StatusCode::EngineError,
            ExportError::Conversion(_) => StatusCode::ConversionError,
        }
    }

    /// Engine errors keep the engine's own text; everything else is
    /// `"<status message> (<detail>)"`.
    pub fn message(&self) -> String {
        match self {
            ExportError::Engine(e) => e.to_string(),
            other => other.status().describe(&other.to_string()),
        }
    }
}

/// Response of one render: `{code, message, pdfBgColor?, format, result, width, height, scale}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderResult {
    pub code: u16,
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_bg_color: Option<String>,
    pub format: ExportFormat,
    pub result: Option<String>,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

impl RenderResult {
    fn success(request: &CanonicalRequest, rendered: Rendered) -> Self {
        Self {
            code: StatusCode::Success.code(),
            message: None,
            pdf_bg_color: rendered.pdf_bg_color,
            format: request.format,
            result: rendered.result,
            width: request.width,
            height: request.height,
            scale: request.scale,
        }
    }

    fn failure(request: &CanonicalRequest, failed: Failed) -> Self {
        Self {
            code: failed.error.status().code(),
            message: Some(failed.error.message()),
            pdf_bg_color: failed.pdf_bg_color,
            format: request.format,
            result: None,
            width: request.width,
            height: request.height,
            scale: request.scale,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == StatusCode::Success.code()
    }

    /// File bytes for the transported payload, decoded by what the engine
    /// was asked to produce. SVG markup (svg and emf) comes back as-is, or
    /// percent-decoded when it arrived as an encoded URI. Raster payloads are
    /// base64. `None` when nothing was transported (document paths).
    pub fn image_bytes(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        let Some(payload) = self.result.as_deref() else {
            return Ok(None);
        };
        let bytes: Vec<u8> = match EngineFormat::for_export(self.format) {
            EngineFormat::Svg => match payload.strip_prefix(SVG_PREFIX) {
                Some(encoded) => percent_decode_str(encoded).collect(),
                None => payload.as_bytes().to_vec(),
            },
            EngineFormat::FullJson => payload.as_bytes().to_vec(),
            EngineFormat::Png | EngineFormat::Jpeg | EngineFormat::Webp => {
                base64::engine::general_purpose::STANDARD.decode(strip_base64_prefix(payload))?
            }
        };
        Ok(Some(bytes))
    }
}

/// Either shape a combined parse-and-render call can answer with.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportResponse {
    Rejected(ParseResponse),
    Rendered(RenderResult),
}

impl ExportResponse {
    pub fn code(&self) -> u16 {
        match self {
            ExportResponse::Rejected(r) => r.code,
            ExportResponse::Rendered(r) => r.code,
        }
    }
}

/// Output of a successful render before it is stamped with request fields.
#[derive(Debug)]
struct Rendered {
    result: Option<String>,
    pdf_bg_color: Option<String>,
}

/// A failed render. The background stays attached once the engine has
/// captured it, so a document page that fails to load still reports it.
#[derive(Debug)]
struct Failed {
    error: ExportError,
    pdf_bg_color: Option<String>,
}

impl From<ExportError> for Failed {
    fn from(error: ExportError) -> Self {
        Self {
            error,
            pdf_bg_color: None,
        }
    }
}

/// The rendering bridge: one engine, one preview surface, one config.
pub struct RenderBridge<E, S> {
    engine: E,
    surface: S,
    config: BridgeConfig,
}

impl<E: ChartingEngine, S: PreviewSurface> RenderBridge<E, S> {
    pub fn new(engine: E, surface: S, config: BridgeConfig) -> Self {
        Self {
            engine,
            surface,
            config,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Parse with this bridge's safe-mode setting.
    pub fn parse(&self, body: &Value, options: &Value) -> Result<CanonicalRequest, ParseError> {
        parse(body, options, self.config.safe_mode)
    }

    /// Parse then render. A rejected request never reaches the engine.
    pub async fn export(&mut self, body: &Value, options: &Value) -> ExportResponse {
        match self.parse(body, options) {
            Ok(request) => ExportResponse::Rendered(self.render(&request).await),
            Err(err) => ExportResponse::Rejected(ParseResponse::from(&err)),
        }
    }

    /// Render one canonical request.
    ///
    /// Document formats bound the preview-surface load with a tokio timer, so
    /// this future must be polled inside a tokio runtime with the `time`
    /// driver enabled.
    pub async fn render(&mut self, request: &CanonicalRequest) -> RenderResult {
        match self.try_render(request).await {
            Ok(rendered) => {
                info!(
                    format = %request.format,
                    width = request.width,
                    height = request.height,
                    scale = request.scale,
                    fingerprint = %request_fingerprint(request).unwrap_or_default(),
                    "export rendered"
                );
                RenderResult::success(request, rendered)
            }
            Err(failed) => {
                warn!(
                    code = failed.error.status().code(),
                    error = %failed.error,
                    format = %request.format,
                    "export failed"
                );
                RenderResult::failure(request, failed)
            }
        }
    }

    async fn try_render(&mut self, request: &CanonicalRequest) -> Result<Rendered, Failed> {
        let reported = self.engine.version().to_string();
        let profile = resolve_profile(&reported);
        debug!(engine_version = %reported, ?profile, "resolved engine capabilities");

        let options = image_options(request);

        if !profile.is_supported() {
            return Err(ExportError::UnsupportedEngineVersion(reported).into());
        }
        if options.format == EngineFormat::FullJson && !profile.supports_full_data() {
            return Err(ExportError::UnsupportedFormatForVersion(reported).into());
        }

        let figure = EngineFigure {
            data: &request.figure.data,
            layout: &request.figure.layout,
            config: self.config.engine_config(request.figure.config.as_ref()),
        };

        let image = self.produce_image(profile, &figure, &options, request).await?;

        if request.format.is_document() {
            if let Err(error) = self.compose_page(request, &image).await {
                return Err(Failed {
                    error,
                    pdf_bg_color: image.background_color,
                });
            }
            return Ok(Rendered {
                result: None,
                pdf_bg_color: image.background_color,
            });
        }

        Ok(Rendered {
            result: Some(image.data),
            pdf_bg_color: None,
        })
    }

    async fn produce_image(
        &self,
        profile: CapabilityProfile,
        figure: &EngineFigure<'_>,
        options: &ImageOptions,
        request: &CanonicalRequest,
    ) -> Result<EngineImage, ExportError> {
        if !profile.needs_mount() {
            return Ok(self.engine.to_image(figure, options).await?);
        }

        let element = self.engine.mount(figure).await?;
        let image = self.engine.element_to_image(&element, options).await;
        self.engine.release(element);

        let mut image = image?;
        image.data = legacy_payload(request.format, request.encoded, image.data)?;
        Ok(image)
    }

    /// Load the vector rendering on the preview surface so the host can
    /// print it, bounded by the configured timeout.
    async fn compose_page(
        &mut self,
        request: &CanonicalRequest,
        image: &EngineImage,
    ) -> Result<(), ExportError> {
        let page = PrintPage::for_request(request, image.background_color.as_deref());
        self.surface.set_style(&page.to_css());

        let timeout = self.config.pdf_load_timeout();
        match tokio::time::timeout(timeout, self.surface.load(&image.data)).await {
            Ok(SurfaceSignal::Loaded) => Ok(()),
            Ok(SurfaceSignal::Error(reason)) => {
                warn!(%reason, "preview surface failed to load document image");
                Err(ExportError::Conversion(reason))
            }
            Err(_) => {
                warn!(?timeout, "preview surface load timed out");
                Err(ExportError::Conversion("too long to load image".to_string()))
            }
        }
    }
}

pub fn image_options(request: &CanonicalRequest) -> ImageOptions {
    let format = request.format;
    let document = format.is_document();
    ImageOptions {
        format: EngineFormat::for_export(format),
        width: request.width,
        height: request.height,
        scale: request.scale,
        image_data_only: format == ExportFormat::Emf || (!document && !request.encoded),
        background: match format {
            ExportFormat::Jpeg | ExportFormat::Emf => BackgroundMode::Opaque,
            _ if document => BackgroundMode::CaptureForPage,
            _ => BackgroundMode::Keep,
        },
    }
}

/// Legacy engines always return a data URI; unwrap it unless the caller
/// asked for the encoded form.
fn legacy_payload(format: ExportFormat, encoded: bool, data: String) -> Result<String, ExportError> {
    match format {
        ExportFormat::Png | ExportFormat::Jpeg | ExportFormat::Webp if !encoded => {
            Ok(strip_base64_prefix(&data).to_string())
        }
        ExportFormat::Svg if !encoded => decode_svg(&data),
        _ => Ok(data),
    }
}

fn decode_svg(data: &str) -> Result<String, ExportError> {
    let stripped = data.strip_prefix(SVG_PREFIX).unwrap_or(data);
    percent_decode_str(stripped)
        .decode_utf8()
        .map(|s| s.into_owned())
        .map_err(|e| EngineError(format!("URI malformed: {e}")).into())
}
