//! Figure Export Core - Request Validation and Rendering Bridge
//!
//! The one place an export job is checked before the charting engine sees it:
//! 1. Untrusted requests are parsed into a canonical form
//! 2. Figures likely to hang the exporter are rejected (safe mode)
//! 3. The engine's reported version picks the rendering path
//! 4. Every outcome maps to a stable status code

pub mod constants;
pub mod validation;
pub mod hang;
pub mod parse;
pub mod version;
pub mod engine;
pub mod print;
pub mod hashing;
pub mod config;
pub mod pipeline;

pub use constants::{ExportFormat, FormatFamily, StatusCode};
pub use parse::{parse, negotiate_format, CanonicalRequest, Figure, ParseError, ParseResponse};
pub use hang::{estimate, HangRiskEstimate};
pub use version::{CapabilityProfile, VersionGate};
pub use engine::{ChartingEngine, EngineError, EngineImage, ImageOptions, PreviewSurface, SurfaceSignal};
pub use hashing::{canonical_json, request_fingerprint};
pub use config::BridgeConfig;
pub use pipeline::{ExportError, ExportResponse, RenderBridge, RenderResult};

pub const BRIDGE_VERSION: &str = env!("CARGO_PKG_VERSION");
