//! Built-in pipeline defaults, overridable from the config file.

use serde::Deserialize;

use crate::models::LoadOptions;

/// Defaults applied when the caller does not specify loading or export
/// behavior explicitly.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineDefaults {
    /// Repair saturated pixels automatically while loading
    pub auto_gamma_filter: bool,

    /// Use the threshold-based manual gamma filter instead
    pub manual_gamma_filter: bool,

    /// Manual gamma coefficient, between 0 and 1
    pub manual_gamma_threshold: f32,

    /// Default export format ("tif" or "fits")
    pub export_format: String,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            auto_gamma_filter: true,
            manual_gamma_filter: false,
            manual_gamma_threshold: default_manual_gamma_threshold(),
            export_format: default_export_format(),
        }
    }
}

fn default_manual_gamma_threshold() -> f32 {
    0.1
}

fn default_export_format() -> String {
    "tif".to_string()
}

impl PipelineDefaults {
    /// Clamp out-of-range values back to something usable
    pub fn sanitize(&mut self) {
        self.manual_gamma_threshold = self.manual_gamma_threshold.clamp(0.0, 1.0);
        match self.export_format.as_str() {
            "tif" | "tiff" | "fits" => {}
            _ => self.export_format = default_export_format(),
        }
    }

    /// Loading options derived from these defaults
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            auto_gamma_filter: self.auto_gamma_filter,
            manual_gamma_filter: self.manual_gamma_filter,
            manual_gamma_threshold: self.manual_gamma_threshold,
            check_shape: true,
        }
    }
}
