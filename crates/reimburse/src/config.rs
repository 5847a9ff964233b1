//! Export settings
//!
//! Loaded from an optional JSON file; every field has a default so an empty
//! object `{}` is a complete configuration.

use crate::raster::RasterOptions;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable naming the configuration file
pub const CONFIG_ENV: &str = "REIMBURSE_CONFIG";

/// Environment variable naming the record dataset
pub const STORE_ENV: &str = "REIMBURSE_STORE";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Form template; its extension picks the document format
    pub template: PathBuf,
    /// Document converter executable
    pub soffice: PathBuf,
    /// Rasterizer executable
    pub pdftoppm: PathBuf,
    pub convert_timeout_secs: u64,
    pub raster_timeout_secs: u64,
    pub dpi: u32,
    pub raster_width_px: u32,
    pub page_capacity: usize,
    pub sheet_gap_mm: f64,
    /// Parent of per-request scratch directories; system temp dir if unset
    pub scratch_parent: Option<PathBuf>,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from("assets/expense_a5_template.fodt"),
            soffice: PathBuf::from("soffice"),
            pdftoppm: PathBuf::from("pdftoppm"),
            convert_timeout_secs: 120,
            raster_timeout_secs: 60,
            dpi: 300,
            raster_width_px: 595,
            page_capacity: 5,
            sheet_gap_mm: 1.0,
            scratch_parent: None,
        }
    }
}

impl ExportConfig {
    /// Read and validate a JSON config file
    ///
    /// Relative paths inside the file resolve against the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            config.template = resolve(base, &config.template);
            config.scratch_parent = config.scratch_parent.map(|p| resolve(base, &p));
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_capacity == 0 {
            return Err(ConfigError::Invalid("page_capacity must be at least 1".to_string()));
        }
        if self.convert_timeout_secs == 0 || self.raster_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be positive".to_string()));
        }
        if self.dpi == 0 || self.raster_width_px == 0 {
            return Err(ConfigError::Invalid(
                "dpi and raster_width_px must be positive".to_string(),
            ));
        }
        if !self.sheet_gap_mm.is_finite() || self.sheet_gap_mm < 0.0 || self.sheet_gap_mm >= 100.0 {
            return Err(ConfigError::Invalid(format!(
                "sheet_gap_mm out of range: {}",
                self.sheet_gap_mm
            )));
        }
        Ok(())
    }

    pub fn page_capacity(&self) -> Result<NonZeroUsize, ConfigError> {
        NonZeroUsize::new(self.page_capacity)
            .ok_or_else(|| ConfigError::Invalid("page_capacity must be at least 1".to_string()))
    }

    pub fn convert_timeout(&self) -> Duration {
        Duration::from_secs(self.convert_timeout_secs)
    }

    pub fn raster_options(&self) -> RasterOptions {
        RasterOptions {
            dpi: self.dpi,
            width_px: self.raster_width_px,
            timeout: Duration::from_secs(self.raster_timeout_secs),
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() || base.as_os_str().is_empty() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExportConfig::default();
        config.validate().unwrap();
        assert_eq!(config.page_capacity().unwrap().get(), 5);
        assert_eq!(config.convert_timeout(), Duration::from_secs(120));
        assert_eq!(config.raster_options(), RasterOptions::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reimburse.json");
        std::fs::write(&path, r#"{"dpi": 150, "template": "forms/a5.fodt"}"#).unwrap();

        let config = ExportConfig::load(&path).unwrap();
        assert_eq!(config.dpi, 150);
        assert_eq!(config.template, dir.path().join("forms/a5.fodt"));
        assert_eq!(config.soffice, PathBuf::from("soffice"));
        assert_eq!(config.page_capacity, 5);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reimburse.json");
        std::fs::write(&path, r#"{"dip": 150}"#).unwrap();

        assert!(matches!(
            ExportConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_invalid_values() {
        let zero_capacity = ExportConfig {
            page_capacity: 0,
            ..ExportConfig::default()
        };
        assert!(zero_capacity.validate().is_err());
        assert!(zero_capacity.page_capacity().is_err());

        let zero_timeout = ExportConfig {
            convert_timeout_secs: 0,
            ..ExportConfig::default()
        };
        assert!(zero_timeout.validate().is_err());

        let negative_gap = ExportConfig {
            sheet_gap_mm: -1.0,
            ..ExportConfig::default()
        };
        assert!(negative_gap.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            ExportConfig::load("/nonexistent/reimburse.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
