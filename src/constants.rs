//! Constants Table - Formats, Status Codes, Defaults
//!
//! Immutable; safely shared by every request.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Png,
    Jpeg,
    Webp,
    Svg,
    Pdf,
    Eps,
    Emf,
    Json,
}

/// Broad behavior bucket a format belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatFamily {
    Raster,
    Vector,
    Document,
    Data,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 8] = [
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::Webp,
        ExportFormat::Svg,
        ExportFormat::Pdf,
        ExportFormat::Eps,
        ExportFormat::Emf,
        ExportFormat::Json,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Webp => "webp",
            ExportFormat::Svg => "svg",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Eps => "eps",
            ExportFormat::Emf => "emf",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
            ExportFormat::Svg => "image/svg+xml",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Eps => "application/postscript",
            ExportFormat::Emf => "image/emf",
            ExportFormat::Json => "application/json",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == name)
    }

    pub fn from_content_type(content_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.content_type() == content_type)
    }

    pub fn family(self) -> FormatFamily {
        match self {
            ExportFormat::Png | ExportFormat::Jpeg | ExportFormat::Webp => FormatFamily::Raster,
            ExportFormat::Svg | ExportFormat::Emf => FormatFamily::Vector,
            ExportFormat::Pdf | ExportFormat::Eps => FormatFamily::Document,
            ExportFormat::Json => FormatFamily::Data,
        }
    }

    /// PDF and EPS are composed as pages on the preview surface.
    pub fn is_document(self) -> bool {
        self.family() == FormatFamily::Document
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable response status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Success,
    MalformedRequest,
    UnacceptableFormat,
    EngineError,
    UnsupportedEngineVersion,
    UnsupportedFormatForVersion,
    ConversionError,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            StatusCode::Success => 0,
            StatusCode::MalformedRequest => 400,
            StatusCode::UnacceptableFormat => 406,
            StatusCode::EngineError => 525,
            StatusCode::UnsupportedEngineVersion => 526,
            StatusCode::UnsupportedFormatForVersion => 527,
            StatusCode::ConversionError => 530,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            StatusCode::Success => "success",
            StatusCode::MalformedRequest => "invalid or malformed request syntax",
            StatusCode::UnacceptableFormat => "requested format is not acceptable",
            StatusCode::EngineError => "charting engine error",
            StatusCode::UnsupportedEngineVersion => {
                "charting engine version 1.11.0 or up required"
            }
            StatusCode::UnsupportedFormatForVersion => {
                "charting engine version 1.53.0 or up required for exporting to `json`"
            }
            StatusCode::ConversionError => "image conversion error",
        }
    }

    /// `"<status message> (<reason>)"`
    pub fn describe(self, reason: &str) -> String {
        format!("{} ({})", self.message(), reason)
    }
}

pub const DEFAULT_FORMAT: ExportFormat = ExportFormat::Png;
pub const DEFAULT_SCALE: f64 = 1.0;
pub const DEFAULT_WIDTH: f64 = 700.0;
pub const DEFAULT_HEIGHT: f64 = 500.0;

/// Requests with more traces than this are rejected in safe mode.
pub const MAX_TRACES: usize = 200;

/// Default passed to the engine as `plotGlPixelRatio`.
pub const PLOT_GL_PIXEL_RATIO: f64 = 2.5;

/// How long a document page may take to load on the preview surface.
pub const PDF_PAGE_LOAD_TIMEOUT: Duration = Duration::from_millis(2000);

/// Data-URI prefix the legacy engine path puts in front of raster payloads.
static BASE64_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:image/[[:word:]]+;base64,").unwrap());

pub fn strip_base64_prefix(payload: &str) -> &str {
    match BASE64_PREFIX_RE.find(payload) {
        Some(prefix) => &payload[prefix.end()..],
        None => payload,
    }
}

pub const SVG_PREFIX: &str = "data:image/svg+xml,";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_lookup() {
        assert_eq!(ExportFormat::from_name("jpeg"), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_name("jpg"), None);
        assert_eq!(
            ExportFormat::from_content_type("application/postscript"),
            Some(ExportFormat::Eps)
        );
        assert!(ExportFormat::Pdf.is_document());
        assert!(!ExportFormat::Emf.is_document());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(StatusCode::ConversionError.code(), 530);
        assert_eq!(
            StatusCode::MalformedRequest.describe("wrong format"),
            "invalid or malformed request syntax (wrong format)"
        );
    }

    #[test]
    fn test_strip_base64_prefix() {
        assert_eq!(strip_base64_prefix("data:image/png;base64,iVBOR"), "iVBOR");
        assert_eq!(strip_base64_prefix("data:image/jpeg;base64,/9j/"), "/9j/");
        assert_eq!(strip_base64_prefix("iVBOR"), "iVBOR");
        assert_eq!(strip_base64_prefix("data:image/;base64,iVBOR"), "data:image/;base64,iVBOR");
        // anchored at the start
        assert_eq!(strip_base64_prefix("xdata:image/png;base64,iVBOR"), "xdata:image/png;base64,iVBOR");
        // `svg+xml` is not a single word, so the prefix stays
        assert_eq!(
            strip_base64_prefix("data:image/svg+xml;base64,PHN2"),
            "data:image/svg+xml;base64,PHN2"
        );
    }
}
