//! Fiducial marker location and form rectification.
//!
//! The markers are plain printed text tokens (for example `QZKL`) placed near
//! the four corners of a form. This crate:
//! - runs an [`OcrEngine`] over a grayscale image and keeps the centroids of
//!   tokens whose text equals the marker label ([`MarkerLocator`]),
//! - orders exactly four centroids into a [`CornerSet`],
//! - solves the perspective transform and warps the capture into a canonical
//!   `width x height` frontal view ([`Rectifier`]).
//!
//! It does **not** ship an OCR engine of its own; [`TesseractCli`] drives an
//! installed `tesseract` executable.

mod corners;
mod locate;
mod ocr;
mod rectify;
mod tesseract;

pub use formscan_core::TargetSize;

pub use corners::{CornerOrder, CornerSet};
pub use locate::{markers_from_tokens, MarkerLocator, MarkerPoint, DEFAULT_MARKER_LABEL};
pub use ocr::{OcrEngine, OcrError, OcrToken, StaticOcr};
pub use rectify::{Rectification, RectifiedRgb, RectifyError, Rectifier};
pub use tesseract::{parse_tsv_tokens, TesseractCli, TesseractParams};
