//! Request Parser
//!
//! Turns an untrusted export request into a [`CanonicalRequest`]. Two input
//! shapes are accepted: `{figure, format, scale, ...}` where the request is
//! its own options record, and the bare `{data, layout}` shorthand paired
//! with a separate options record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::constants::{
    ExportFormat, StatusCode, DEFAULT_FORMAT, DEFAULT_HEIGHT, DEFAULT_SCALE, DEFAULT_WIDTH,
};
use crate::hang;
use crate::validation::{is_non_empty_string, is_plain_object, is_truthy, positive_number};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("wrong format")]
    WrongFormat,

    #[error("non-object figure")]
    NonObjectFigure,

    #[error("no 'data' and no 'layout' in figure")]
    NoDataOrLayout,

    #[error("non-array figure data")]
    NonArrayData,

    #[error("non-object figure layout")]
    NonObjectLayout,

    #[error("figure data is likely to make exporter hang, rejecting request")]
    LikelyToHang,

    #[error("no export format for content type '{0}'")]
    NotAcceptable(String),
}

impl ParseError {
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::NotAcceptable(_) => StatusCode::UnacceptableFormat,
            _ => StatusCode::MalformedRequest,
        }
    }

    /// Response message, e.g. `invalid or malformed request syntax (wrong format)`.
    pub fn message(&self) -> String {
        self.status().describe(&self.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Value>,
    pub layout: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRequest {
    pub figure: Figure,
    pub format: ExportFormat,
    pub scale: f64,
    pub width: f64,
    pub height: f64,
    pub encoded: bool,
    pub fid: Option<String>,
}

/// Wire shape of a parse: `{code, message, result}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    pub code: u16,
    pub message: Option<String>,
    pub result: Option<CanonicalRequest>,
}

impl From<Result<CanonicalRequest, ParseError>> for ParseResponse {
    fn from(outcome: Result<CanonicalRequest, ParseError>) -> Self {
        match outcome {
            Ok(request) => Self {
                code: StatusCode::Success.code(),
                message: None,
                result: Some(request),
            },
            Err(err) => Self::from(&err),
        }
    }
}

impl From<&ParseError> for ParseResponse {
    fn from(err: &ParseError) -> Self {
        Self {
            code: err.status().code(),
            message: Some(err.message()),
            result: None,
        }
    }
}

/// Parse a raw export request.
///
/// `options` is only consulted for the shorthand shape; a request carrying
/// `figure` supplies its own options. `safe_mode` enables the hang-risk guard.
pub fn parse(body: &Value, options: &Value, safe_mode: bool) -> Result<CanonicalRequest, ParseError> {
    let outcome = parse_inner(body, options, safe_mode);
    if let Err(err) = &outcome {
        debug!(reason = %err, "export request rejected");
    }
    outcome
}

fn parse_inner(body: &Value, options: &Value, safe_mode: bool) -> Result<CanonicalRequest, ParseError> {
    let empty = Map::new();

    let (figure, opts) = match body.get("figure") {
        Some(figure) if is_truthy(Some(figure)) => (figure, body.as_object().unwrap_or(&empty)),
        _ => (body, options.as_object().unwrap_or(&empty)),
    };

    let scale = positive_number(opts.get("scale")).unwrap_or(DEFAULT_SCALE);
    let fid = opts
        .get("fid")
        .filter(|v| is_non_empty_string(Some(*v)))
        .and_then(Value::as_str)
        .map(str::to_owned);
    let encoded = is_truthy(opts.get("encoded"));

    let format = if is_non_empty_string(opts.get("format")) {
        opts.get("format")
            .and_then(Value::as_str)
            .and_then(ExportFormat::from_name)
            .ok_or(ParseError::WrongFormat)?
    } else {
        DEFAULT_FORMAT
    };

    let figure = figure.as_object().ok_or(ParseError::NonObjectFigure)?;

    if !is_truthy(figure.get("data")) && !is_truthy(figure.get("layout")) {
        return Err(ParseError::NoDataOrLayout);
    }

    let data = match figure.get("data") {
        Some(Value::Array(data)) => data.clone(),
        Some(_) => return Err(ParseError::NonArrayData),
        None => Vec::new(),
    };

    let layout = match figure.get("layout") {
        Some(Value::Object(layout)) => layout.clone(),
        Some(_) => return Err(ParseError::NonObjectLayout),
        None => Map::new(),
    };

    let config = figure
        .get("config")
        .filter(|c| is_plain_object(Some(*c)))
        .and_then(Value::as_object)
        .cloned();

    let width = resolve_dim(opts, &layout, "width", DEFAULT_WIDTH);
    let height = resolve_dim(opts, &layout, "height", DEFAULT_HEIGHT);

    if safe_mode {
        let risk = hang::estimate(&data);
        if risk.is_likely_to_hang() {
            warn!(
                traces = risk.trace_count,
                budget_used = risk.budget_used,
                "rejecting figure likely to hang the exporter"
            );
            return Err(ParseError::LikelyToHang);
        }
    }

    Ok(CanonicalRequest {
        figure: Figure { data, layout, config },
        format,
        scale,
        width,
        height,
        encoded,
        fid,
    })
}

/// Explicit option, then the layout's value unless it autosizes, then default.
fn resolve_dim(opts: &Map<String, Value>, layout: &Map<String, Value>, dim: &str, default: f64) -> f64 {
    if let Some(explicit) = positive_number(opts.get(dim)) {
        return explicit;
    }
    match positive_number(layout.get(dim)) {
        Some(from_layout) if !is_truthy(layout.get("autosize")) => from_layout,
        _ => default,
    }
}

/// Map a content-type label such as `image/png` to its export format.
pub fn negotiate_format(content_type: &str) -> Result<ExportFormat, ParseError> {
    let label = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    ExportFormat::from_content_type(&label).ok_or_else(|| ParseError::NotAcceptable(content_type.to_string()))
}
