//! Configuration structures for the extraction pipeline.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::outcome::Dialect;
use crate::error::{Result, RiskscanError};

/// Main configuration for the riskscan pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskscanConfig {
    /// PDF decoding and line reconstruction.
    pub pdf: PdfConfig,

    /// Field extraction.
    pub extraction: ExtractionConfig,

    /// Batch execution.
    pub batch: BatchConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Vertical band (layout units) within which runs share a line.
    pub y_tolerance: f32,

    /// Number of leading lines the format detector inspects.
    pub header_window: usize,

    /// Maximum pages to decode (0 = unlimited).
    pub max_pages: usize,

    /// Below this many reconstructed characters the flat-text fallback is tried.
    pub min_text_length: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            y_tolerance: 3.0,
            header_window: 40,
            max_pages: 0,
            min_text_length: 20,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Preference when header markers of several dialects match, most
    /// specific first. Also breaks ties in the unknown-format race.
    pub dialect_priority: Vec<Dialect>,

    /// Lines the adjacent-line pass scans after a label.
    pub adjacent_window: usize,

    /// Offer fields a dialect left unresolved to the generic keyword extractor.
    pub generic_fallback: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dialect_priority: vec![Dialect::PlanSummary, Dialect::CardTypeSummary],
            adjacent_window: 3,
            generic_fallback: true,
        }
    }
}

/// Batch execution configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Files extracted concurrently.
    pub jobs: usize,

    /// Per-file time budget in seconds.
    pub timeout_secs: u64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 4,
            timeout_secs: 30,
        }
    }
}

impl RiskscanConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| RiskscanError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).map_err(|e| RiskscanError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Dialect priority with any dialect the user list omits appended in
    /// declaration order, so every dialect still takes part in detection.
    pub fn dialect_priority(&self) -> Vec<Dialect> {
        let mut order: Vec<Dialect> = Vec::with_capacity(Dialect::ALL.len());
        for dialect in self.extraction.dialect_priority.iter().chain(Dialect::ALL.iter()) {
            if !order.contains(dialect) {
                order.push(*dialect);
            }
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: RiskscanConfig =
            serde_json::from_str(r#"{"pdf": {"y_tolerance": 5.0}}"#).unwrap();
        assert_eq!(config.pdf.y_tolerance, 5.0);
        assert_eq!(config.pdf.header_window, 40);
        assert_eq!(config.batch.jobs, 4);
    }

    #[test]
    fn test_from_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        assert!(matches!(RiskscanConfig::from_file(&path), Err(RiskscanError::Io(_))));

        std::fs::write(&path, "{ not json").unwrap();
        let err = RiskscanConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, RiskscanError::Config(_)));
        assert!(err.to_string().starts_with("configuration error:"));

        let mut config = RiskscanConfig::default();
        config.batch.jobs = 2;
        config.save(&path).unwrap();
        assert_eq!(RiskscanConfig::from_file(&path).unwrap().batch.jobs, 2);
    }

    #[test]
    fn test_dialect_priority_completes_list() {
        let mut config = RiskscanConfig::default();
        config.extraction.dialect_priority = vec![Dialect::CardTypeSummary];
        assert_eq!(
            config.dialect_priority(),
            vec![Dialect::CardTypeSummary, Dialect::PlanSummary]
        );
    }
}
