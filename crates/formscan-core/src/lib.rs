//! Core types and utilities for form rectification and checkbox scoring.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any concrete image codec or OCR engine: callers hand in
//! row-major pixel buffers through the lightweight view types below.

mod geometry;
mod homography;
mod image;
mod logger;
mod threshold;

pub use geometry::{polygon_area, PixelRect, TargetSize};
pub use homography::{
    homography_from_4pt, warp_perspective_gray, warp_perspective_rgb, Homography,
};
pub use image::{
    rgb_to_gray, sample_bilinear, sample_bilinear_u8, GrayImage, GrayImageView, RgbImage,
    RgbImageView,
};
pub use threshold::{adaptive_threshold_inv, AdaptiveMethod, ThresholdError, ThresholdParams};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
