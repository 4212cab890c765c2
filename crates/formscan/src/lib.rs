//! High-level facade crate for the `formscan-*` workspace.
//!
//! This crate provides:
//! - re-exports of the underlying crates
//! - a JSON [`FormScanConfig`] collecting every tunable of the pipeline
//! - [`FormScanner`], which runs OCR marker location, rectification and
//!   either template building or checkbox classification on an `image` buffer
//!
//! ## Quickstart
//!
//! ```no_run
//! use formscan::markers::{TargetSize, TesseractCli};
//! use formscan::{FormScanConfig, FormScanner};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FormScanConfig::default();
//! let ocr = TesseractCli::new(config.ocr.clone());
//! let scanner = FormScanner::new(config, TargetSize::new(2000, 1400), ocr)?;
//!
//! let image = formscan::load_rgb("blank_form.jpg")?;
//! let outcome = scanner.build_template(&image)?;
//! println!("found {} checkboxes", outcome.template.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `formscan::core`: pixel buffers, geometry, homography, adaptive threshold.
//! - `formscan::markers`: OCR boundary, marker location, rectification.
//! - `formscan::checkbox`: templates, classification, CSV report, overlays.

pub use formscan_checkbox as checkbox;
pub use formscan_core as core;
pub use formscan_markers as markers;

mod config;
mod pipeline;

pub use config::{ConfigError, FormScanConfig, MarkerConfig, OutputConfig};
pub use pipeline::{
    annotated_path, load_rgb, report_path, rgb_view, ClassifyOutcome, FormScanner, Mode,
    ModeError, PipelineError, RunSummary, TemplateOutcome,
};
