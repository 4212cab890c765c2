//! Locally adaptive binarization.

use crate::{GrayImage, GrayImageView};
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ThresholdError {
    #[error("adaptive threshold block size must be odd and >= 3 (got {0})")]
    InvalidBlockSize(usize),
    #[error("adaptive threshold offset must be finite (got {0})")]
    InvalidOffset(f64),
}

/// How the local reference level is computed around each pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaptiveMethod {
    /// Unweighted mean of the `block_size x block_size` window.
    Mean,
    /// Gaussian-weighted mean with sigma derived from the block size.
    #[default]
    Gaussian,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdParams {
    pub method: AdaptiveMethod,
    /// Odd window side length in pixels.
    pub block_size: usize,
    /// Offset subtracted from the local mean.
    pub c: f64,
}

impl Default for ThresholdParams {
    fn default() -> Self {
        Self {
            method: AdaptiveMethod::Gaussian,
            block_size: 11,
            c: 2.0,
        }
    }
}

impl ThresholdParams {
    pub fn validate(&self) -> Result<(), ThresholdError> {
        if self.block_size < 3 || self.block_size % 2 == 0 {
            return Err(ThresholdError::InvalidBlockSize(self.block_size));
        }
        if !self.c.is_finite() {
            return Err(ThresholdError::InvalidOffset(self.c));
        }
        Ok(())
    }
}

fn kernel(params: &ThresholdParams) -> Vec<f32> {
    let k = params.block_size;
    match params.method {
        AdaptiveMethod::Mean => vec![1.0 / k as f32; k],
        AdaptiveMethod::Gaussian => {
            let sigma = 0.3 * ((k as f64 - 1.0) * 0.5 - 1.0) + 0.8;
            let half = (k / 2) as f64;
            let raw: Vec<f64> = (0..k)
                .map(|i| {
                    let d = i as f64 - half;
                    (-(d * d) / (2.0 * sigma * sigma)).exp()
                })
                .collect();
            let sum: f64 = raw.iter().sum();
            raw.iter().map(|w| (w / sum) as f32).collect()
        }
    }
}

/// Separable smoothing with replicated borders, rounded back to 8 bit.
fn local_mean(src: &GrayImageView<'_>, weights: &[f32]) -> Vec<u8> {
    let (w, h) = (src.width, src.height);
    let r = weights.len() as isize / 2;
    let clamp = |v: isize, n: usize| v.clamp(0, n as isize - 1) as usize;

    let mut rows = vec![0f32; w * h];
    for y in 0..h {
        let line = &src.data[y * w..(y + 1) * w];
        for x in 0..w {
            let mut acc = 0.0;
            for (i, wt) in weights.iter().enumerate() {
                acc += wt * line[clamp(x as isize + i as isize - r, w)] as f32;
            }
            rows[y * w + x] = acc;
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (i, wt) in weights.iter().enumerate() {
                acc += wt * rows[clamp(y as isize + i as isize - r, h) * w + x];
            }
            out[y * w + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

/// Inverted adaptive threshold: a pixel becomes foreground (255) when it is at
/// least `c` darker than its local mean, otherwise background (0).
///
/// Dark strokes on light paper come out as foreground.
pub fn adaptive_threshold_inv(
    src: &GrayImageView<'_>,
    params: &ThresholdParams,
) -> Result<GrayImage, ThresholdError> {
    params.validate()?;
    if src.width == 0 || src.height == 0 {
        return Ok(GrayImage::new(src.width, src.height));
    }

    let mean = local_mean(src, &kernel(params));
    let delta = params.c.floor() as i32;
    let data = src
        .data
        .iter()
        .zip(&mean)
        .map(|(&v, &m)| {
            if v as i32 - m as i32 <= -delta {
                255
            } else {
                0
            }
        })
        .collect();

    Ok(GrayImage {
        width: src.width,
        height: src.height,
        data,
    })
}
