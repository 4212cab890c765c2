use formscan_core::{GrayImageView, TargetSize};
use serde::{Deserialize, Serialize};

use crate::{CheckboxDescriptor, Template};

/// Default mean-intensity threshold on the 0..255 gray scale.
pub const DEFAULT_THRESHOLD: f64 = 230.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ClassifyError {
    #[error("template was built for a {template} form but the image is {image}")]
    SizeMismatch {
        template: TargetSize,
        image: TargetSize,
    },
    #[error("checkbox {ordinal} at ({x}, {y}) lies outside the image")]
    EmptyRegion { ordinal: usize, x: u32, y: u32 },
    #[error("threshold must be finite (got {0})")]
    InvalidThreshold(f64),
}

/// Fill state of one checkbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckStatus {
    #[serde(rename = "pos")]
    Checked,
    #[serde(rename = "neg")]
    Unchecked,
}

impl CheckStatus {
    /// Darker than the threshold means ink, and ink means checked.
    pub fn from_mean(mean: f64, threshold: f64) -> Self {
        if mean < threshold {
            CheckStatus::Checked
        } else {
            CheckStatus::Unchecked
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckStatus::Checked => "pos",
            CheckStatus::Unchecked => "neg",
        }
    }

    pub fn is_checked(&self) -> bool {
        matches!(self, CheckStatus::Checked)
    }
}

impl std::fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckboxResult {
    /// Position in the template, 0-based.
    pub index: usize,
    pub descriptor: CheckboxDescriptor,
    pub mean: f64,
    pub status: CheckStatus,
}

impl CheckboxResult {
    /// 1-based box number used in reports.
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }

    /// Overlay text, e.g. `pos (120, 48) Mean:87.25`.
    pub fn label_text(&self) -> String {
        format!(
            "{} ({}, {}) Mean:{:.2}",
            self.status, self.descriptor.x, self.descriptor.y, self.mean
        )
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierParams {
    /// Regions with a mean strictly below this are checked.
    pub threshold: f64,
}

impl Default for ClassifierParams {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct CheckboxClassifier {
    params: ClassifierParams,
}

impl CheckboxClassifier {
    pub fn new(params: ClassifierParams) -> Result<Self, ClassifyError> {
        if !params.threshold.is_finite() {
            return Err(ClassifyError::InvalidThreshold(params.threshold));
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &ClassifierParams {
        &self.params
    }

    /// Score every template region on `image`, in template order.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, image, template), fields(boxes = template.len()))
    )]
    pub fn classify(
        &self,
        image: &GrayImageView<'_>,
        template: &Template,
    ) -> Result<Vec<CheckboxResult>, ClassifyError> {
        let image_size = TargetSize::new(image.width as u32, image.height as u32);
        match template.size {
            Some(size) if size != image_size => {
                return Err(ClassifyError::SizeMismatch {
                    template: size,
                    image: image_size,
                });
            }
            Some(_) => {}
            None => log::warn!(
                "template has no recorded size; assuming it matches the {} image",
                image_size
            ),
        }

        template
            .checkboxes
            .iter()
            .enumerate()
            .map(|(index, descriptor)| {
                let mean = image.mean_in_rect(descriptor.rect()).ok_or(
                    ClassifyError::EmptyRegion {
                        ordinal: index + 1,
                        x: descriptor.x,
                        y: descriptor.y,
                    },
                )?;
                let status = CheckStatus::from_mean(mean, self.params.threshold);
                log::info!(
                    "box {} at ({}, {}): mean {:.2} -> {}",
                    index + 1,
                    descriptor.x,
                    descriptor.y,
                    mean,
                    status
                );
                Ok(CheckboxResult {
                    index,
                    descriptor: descriptor.clone(),
                    mean,
                    status,
                })
            })
            .collect()
    }
}
