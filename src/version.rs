//! Version Gate - Capability Resolution
//!
//! The charting engine reports a version string once; it is resolved here to
//! a [`CapabilityProfile`] and the rendering bridge dispatches on that
//! profile alone.

use semver::Version;
use serde::Serialize;
use thiserror::Error;

/// Oldest engine the bridge can drive at all.
pub const MIN_SUPPORTED_ENGINE: Version = Version::new(1, 11, 0);
/// First engine that renders images without a mounted element.
pub const DIRECT_RENDER_ENGINE: Version = Version::new(1, 30, 0);
/// First engine with the full-data (`json`) export.
pub const FULL_DATA_ENGINE: Version = Version::new(1, 53, 0);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable engine version '{0}'")]
pub struct VersionError(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CapabilityProfile {
    /// Below 1.11.0.
    Unsupported,
    /// 1.11.0 up to 1.30.0: draw into a transient element first.
    LegacyMount,
    /// 1.30.0 up to 1.53.0.
    Direct,
    /// 1.53.0 and up.
    FullData,
}

impl CapabilityProfile {
    pub fn is_supported(self) -> bool {
        self != CapabilityProfile::Unsupported
    }

    pub fn needs_mount(self) -> bool {
        self == CapabilityProfile::LegacyMount
    }

    pub fn supports_full_data(self) -> bool {
        self == CapabilityProfile::FullData
    }
}

/// Engine version as reported, plus its parsed form.
#[derive(Debug, Clone)]
pub struct VersionGate {
    reported: String,
    version: Version,
}

impl VersionGate {
    pub fn new(reported: &str) -> Result<Self, VersionError> {
        let version = parse_loose(reported).ok_or_else(|| VersionError(reported.to_string()))?;
        Ok(Self {
            reported: reported.to_string(),
            version,
        })
    }

    pub fn reported(&self) -> &str {
        &self.reported
    }

    /// Engine meets `minimum` (inclusive).
    pub fn gte(&self, minimum: &Version) -> bool {
        self.version >= *minimum
    }

    /// Engine is strictly below `minimum`.
    pub fn lt(&self, minimum: &Version) -> bool {
        self.version < *minimum
    }

    pub fn profile(&self) -> CapabilityProfile {
        if self.lt(&MIN_SUPPORTED_ENGINE) {
            CapabilityProfile::Unsupported
        } else if self.lt(&DIRECT_RENDER_ENGINE) {
            CapabilityProfile::LegacyMount
        } else if self.lt(&FULL_DATA_ENGINE) {
            CapabilityProfile::Direct
        } else {
            CapabilityProfile::FullData
        }
    }
}

/// Resolve a reported version string straight to its profile; anything
/// unparseable is treated as unsupported.
pub fn resolve_profile(reported: &str) -> CapabilityProfile {
    VersionGate::new(reported)
        .map(|gate| gate.profile())
        .unwrap_or(CapabilityProfile::Unsupported)
}

/// Strict semver first, then with a leading `v`/`=` removed and missing
/// minor/patch components padded with zeros.
fn parse_loose(reported: &str) -> Option<Version> {
    let trimmed = reported.trim();
    if let Ok(v) = Version::parse(trimmed) {
        return Some(v);
    }
    let bare = trimmed.trim_start_matches(['v', '=']);
    if let Ok(v) = Version::parse(bare) {
        return Some(v);
    }
    let (core, suffix) = match bare.find(['-', '+']) {
        Some(i) => bare.split_at(i),
        None => (bare, ""),
    };
    let parts: Vec<&str> = core.split('.').collect();
    if parts.is_empty() || parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return None;
    }
    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    Version::parse(&padded).ok()
}
