//! Editor configuration.

use lc_core::model::{AspectRatio, DEFAULT_BACKGROUND, DEFAULT_EXPORT_QUALITY, ExportFormat};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown aspect ratio preset `{0}`")]
    UnknownAspectRatio(String),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Tunables for one editor instance. Every field has a default, so a
/// partial JSON object is a valid config.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Prefix of export filenames (`<app>-export.png`).
    pub app_name: String,
    /// Quiet window before a burst of style edits becomes one history entry.
    pub history_quiet_window_ms: u64,
    /// Oldest snapshots are dropped beyond this many.
    pub max_history: usize,
    pub default_background: String,
    /// Aspect-ratio preset name for new and reset documents.
    pub default_aspect_ratio: String,
    pub default_export_format: ExportFormat,
    pub default_export_quality: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            app_name: "layercraft".into(),
            history_quiet_window_ms: 2000,
            max_history: 200,
            default_background: DEFAULT_BACKGROUND.into(),
            default_aspect_ratio: "1:1".into(),
            default_export_format: ExportFormat::Png,
            default_export_quality: DEFAULT_EXPORT_QUALITY,
        }
    }
}

impl EditorConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if AspectRatio::preset(&self.default_aspect_ratio).is_none() {
            return Err(ConfigError::UnknownAspectRatio(
                self.default_aspect_ratio.clone(),
            ));
        }
        if self.max_history < 1 {
            return Err(ConfigError::Invalid("maxHistory must be at least 1".into()));
        }
        if !(0.1..=1.0).contains(&self.default_export_quality) {
            return Err(ConfigError::Invalid(format!(
                "defaultExportQuality {} is outside 0.1..=1.0",
                self.default_export_quality
            )));
        }
        if self.app_name.trim().is_empty() {
            return Err(ConfigError::Invalid("appName is empty".into()));
        }
        Ok(())
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        AspectRatio::preset(&self.default_aspect_ratio).unwrap_or_default()
    }
}
