//! Bridge Configuration
//!
//! Component-level options that are not part of any single request.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::constants::{PDF_PAGE_LOAD_TIMEOUT, PLOT_GL_PIXEL_RATIO};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("Invalid config: {0}")]
    Invalid(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfig {
    /// Reject figures the hang-risk estimate flags.
    #[serde(default)]
    pub safe_mode: bool,
    #[serde(default)]
    pub mapbox_access_token: Option<String>,
    #[serde(default, rename = "topojsonURL")]
    pub topojson_url: Option<String>,
    #[serde(default = "default_pixel_ratio")]
    pub plot_gl_pixel_ratio: f64,
    #[serde(default = "default_pdf_timeout_ms")]
    pub pdf_load_timeout_ms: u64,
}

fn default_pixel_ratio() -> f64 {
    PLOT_GL_PIXEL_RATIO
}

fn default_pdf_timeout_ms() -> u64 {
    PDF_PAGE_LOAD_TIMEOUT.as_millis() as u64
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            safe_mode: false,
            mapbox_access_token: None,
            topojson_url: None,
            plot_gl_pixel_ratio: default_pixel_ratio(),
            pdf_load_timeout_ms: default_pdf_timeout_ms(),
        }
    }
}

impl BridgeConfig {
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.display().to_string(), e))?;
        Ok(serde_json::from_str(&content)?)
    }

    pub fn pdf_load_timeout(&self) -> Duration {
        Duration::from_millis(self.pdf_load_timeout_ms)
    }

    /// Engine config: bridge defaults, overridden key by key by the figure's
    /// own `config` record.
    pub fn engine_config(&self, figure_config: Option<&Map<String, Value>>) -> Map<String, Value> {
        let mut config = Map::new();
        config.insert(
            "mapboxAccessToken".to_string(),
            self.mapbox_access_token
                .as_deref()
                .filter(|t| !t.is_empty())
                .map_or(Value::Null, Value::from),
        );
        config.insert("plotGlPixelRatio".to_string(), Value::from(self.plot_gl_pixel_ratio));
        if let Some(url) = self.topojson_url.as_deref().filter(|u| !u.is_empty()) {
            config.insert("topojsonURL".to_string(), Value::from(url));
        }
        if let Some(overrides) = figure_config {
            config.extend(overrides.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert!(!config.safe_mode);
        assert_eq!(config.pdf_load_timeout(), Duration::from_millis(2000));
        assert_eq!(config.plot_gl_pixel_ratio, 2.5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"safeMode": true, "topojsonURL": "https://cdn.example/topo/", "pdfLoadTimeoutMs": 500}}"#).unwrap();

        let config = BridgeConfig::load_from_file(file.path()).unwrap();
        assert!(config.safe_mode);
        assert_eq!(config.topojson_url.as_deref(), Some("https://cdn.example/topo/"));
        assert_eq!(config.pdf_load_timeout(), Duration::from_millis(500));
        assert_eq!(config.plot_gl_pixel_ratio, 2.5);
    }

    #[test]
    fn test_load_errors() {
        let missing = BridgeConfig::load_from_file(Path::new("/nonexistent/bridge.json"));
        assert!(matches!(missing, Err(ConfigError::Io(..))));

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(BridgeConfig::load_from_file(file.path()), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_engine_config_merge() {
        let config = BridgeConfig {
            mapbox_access_token: Some("pk.test".to_string()),
            ..BridgeConfig::default()
        };
        let figure_config = json!({"plotGlPixelRatio": 1, "displayModeBar": false});
        let merged = config.engine_config(figure_config.as_object());
        assert_eq!(merged["mapboxAccessToken"], "pk.test");
        assert_eq!(merged["plotGlPixelRatio"], 1);
        assert_eq!(merged["displayModeBar"], false);
        assert!(!merged.contains_key("topojsonURL"));

        let bare = BridgeConfig::default().engine_config(None);
        assert_eq!(bare["mapboxAccessToken"], Value::Null);
        assert_eq!(bare["plotGlPixelRatio"], 2.5);
    }
}
