//! JSON configuration for the whole pipeline.

use formscan_checkbox::{AnnotationStyle, ClassifierParams, TemplateParams};
use formscan_markers::{CornerOrder, TesseractParams, DEFAULT_MARKER_LABEL};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// OCR text that identifies a corner marker.
    pub label: String,
    pub corner_order: CornerOrder,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            label: DEFAULT_MARKER_LABEL.to_string(),
            corner_order: CornerOrder::default(),
        }
    }
}

/// Where results are written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Inserted between the input file stem and its extension.
    pub annotated_suffix: String,
    pub report_suffix: String,
    pub template_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            annotated_suffix: "_annotated".to_string(),
            report_suffix: "_report".to_string(),
            template_path: PathBuf::from("template.json"),
        }
    }
}

/// Every tunable of a scan. Missing sections and fields take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormScanConfig {
    pub markers: MarkerConfig,
    pub ocr: TesseractParams,
    pub template: TemplateParams,
    pub classify: ClassifierParams,
    pub annotate: AnnotationStyle,
    pub output: OutputConfig,
}

impl FormScanConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formscan_core::AdaptiveMethod;

    #[test]
    fn empty_object_gives_defaults() {
        let cfg: FormScanConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg, FormScanConfig::default());
        assert_eq!(cfg.markers.label, "QZKL");
        assert_eq!(cfg.markers.corner_order, CornerOrder::IndexHeuristic);
        assert_eq!(cfg.ocr.program, "tesseract");
        assert_eq!(cfg.template.threshold.block_size, 11);
        assert_eq!(cfg.template.threshold.method, AdaptiveMethod::Gaussian);
        approx::assert_relative_eq!(cfg.template.min_area, 10_000.0);
        approx::assert_relative_eq!(cfg.template.max_area, 200_000.0);
        approx::assert_relative_eq!(cfg.classify.threshold, 230.0);
        assert_eq!(cfg.annotate.thickness, 2);
        assert_eq!(cfg.output.template_path, PathBuf::from("template.json"));
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let raw = r#"{
            "markers": {"corner_order": "nearest_corner"},
            "template": {"block_size": 15, "method": "mean"},
            "classify": {"threshold": 200.0}
        }"#;
        let cfg: FormScanConfig = serde_json::from_str(raw).expect("parse");
        assert_eq!(cfg.markers.label, "QZKL");
        assert_eq!(cfg.markers.corner_order, CornerOrder::NearestCorner);
        assert_eq!(cfg.template.threshold.block_size, 15);
        assert_eq!(cfg.template.threshold.method, AdaptiveMethod::Mean);
        approx::assert_relative_eq!(cfg.template.threshold.c, 2.0);
        approx::assert_relative_eq!(cfg.classify.threshold, 200.0);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("formscan.json");
        let mut cfg = FormScanConfig::default();
        cfg.ocr.psm = Some(11);
        cfg.write_json(&path).expect("write");
        assert_eq!(FormScanConfig::load_json(&path).expect("load"), cfg);
    }
}
