use crate::error::{DatasetError, Result as DatasetResult};
use anyhow::{Context as _, Result};
use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`AppSettings::fallback_encoding`].
pub const FALLBACK_ENCODING_ENV: &str = "DATASET_TOOL_FALLBACK_ENCODING";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AppSettings {
    /// WHATWG label of the single-byte encoding tried when CSV input is not UTF-8
    pub fallback_encoding: String,
    /// Turn numeric-looking CSV fields into numbers
    pub infer_numbers: bool,
    /// Prepended to the input file stem to name the converted output
    pub output_prefix: String,
    /// Also write daily-rotated log files under the platform data directory
    pub log_to_file: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            fallback_encoding: "windows-1252".to_owned(),
            infer_numbers: true,
            output_prefix: "converted_".to_owned(),
            log_to_file: false,
        }
    }
}

impl AppSettings {
    /// Resolve the configured fallback encoding label.
    pub fn fallback_encoding(&self) -> DatasetResult<&'static Encoding> {
        Encoding::for_label(self.fallback_encoding.trim().as_bytes()).ok_or_else(|| {
            DatasetError::config_field(
                "fallback_encoding",
                format!("unknown encoding label '{}'", self.fallback_encoding),
            )
        })
    }

    /// Apply an override value read from [`FALLBACK_ENCODING_ENV`].
    #[must_use]
    pub fn with_encoding_override(mut self, label: Option<String>) -> Self {
        if let Some(label) = label.filter(|l| !l.trim().is_empty()) {
            self.fallback_encoding = label;
        }
        self
    }
}

pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dataset-tool").join("config.json"))
}

/// Load settings from the platform config directory.
///
/// A missing or unreadable file yields the defaults. The environment
/// override is applied last.
pub fn load_settings() -> AppSettings {
    let settings = get_config_path()
        .and_then(|path| load_settings_from(&path).ok())
        .unwrap_or_default();
    settings.with_encoding_override(std::env::var(FALLBACK_ENCODING_ENV).ok())
}

pub fn load_settings_from(path: &Path) -> Result<AppSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse settings: {}", path.display()))
}

pub fn save_settings_to(settings: &AppSettings, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn save_settings(settings: &AppSettings) -> Result<()> {
    let path = get_config_path().context("Failed to determine config directory")?;
    save_settings_to(settings, &path)
}
