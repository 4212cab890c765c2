use formscan_core::{
    adaptive_threshold_inv, polygon_area, GrayImageView, PixelRect, TargetSize, ThresholdError,
    ThresholdParams,
};
use imageproc::contours::{find_contours, BorderType};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{CheckboxDescriptor, Template, DEFAULT_LABEL};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error(transparent)]
    Threshold(#[from] ThresholdError),
    #[error("invalid area band: min_area={min} must be below max_area={max}")]
    InvalidAreaBand { min: f64, max: f64 },
    #[error("binary image buffer does not match {width}x{height}")]
    Buffer { width: usize, height: usize },
}

/// Settings for locating checkbox outlines on a blank rectified form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateParams {
    /// Contours with polygon area `<= min_area` are ignored (px²).
    pub min_area: f64,
    /// Contours with polygon area `>= max_area` are ignored (px²).
    pub max_area: f64,
    #[serde(flatten)]
    pub threshold: ThresholdParams,
    /// Label given to every new descriptor.
    pub default_label: String,
}

impl Default for TemplateParams {
    fn default() -> Self {
        Self {
            min_area: 10_000.0,
            max_area: 200_000.0,
            threshold: ThresholdParams::default(),
            default_label: DEFAULT_LABEL.to_string(),
        }
    }
}

/// One accepted outer contour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckboxRegion {
    pub rect: PixelRect,
    /// Polygon area enclosed by the traced contour.
    pub area: f64,
}

#[derive(Clone, Debug)]
pub struct TemplateBuild {
    pub template: Template,
    /// Accepted regions, in template order.
    pub regions: Vec<CheckboxRegion>,
    /// Number of external contours inspected.
    pub contours: usize,
}

#[derive(Clone, Debug, Default)]
pub struct TemplateBuilder {
    params: TemplateParams,
}

impl TemplateBuilder {
    pub fn new(params: TemplateParams) -> Result<Self, BuildError> {
        params.threshold.validate()?;
        if !(params.min_area < params.max_area) {
            return Err(BuildError::InvalidAreaBand {
                min: params.min_area,
                max: params.max_area,
            });
        }
        Ok(Self { params })
    }

    pub fn params(&self) -> &TemplateParams {
        &self.params
    }

    /// Find the external contours whose area lies strictly inside the band.
    ///
    /// Regions are returned in reading order (top to bottom, then left to
    /// right) so box numbering does not depend on contour tracing order.
    pub fn find_regions(
        &self,
        image: &GrayImageView<'_>,
    ) -> Result<(Vec<CheckboxRegion>, usize), BuildError> {
        let binary = adaptive_threshold_inv(image, &self.params.threshold)?;
        let binary = image::GrayImage::from_raw(
            binary.width as u32,
            binary.height as u32,
            binary.data,
        )
        .ok_or(BuildError::Buffer {
            width: image.width,
            height: image.height,
        })?;

        let mut inspected = 0usize;
        let mut regions = Vec::new();
        for contour in find_contours::<u32>(&binary) {
            if contour.border_type != BorderType::Outer || contour.parent.is_some() {
                continue;
            }
            inspected += 1;

            let Some(rect) = PixelRect::bounding(contour.points.iter().map(|p| (p.x, p.y)))
            else {
                continue;
            };
            let outline: Vec<Point2<f64>> = contour
                .points
                .iter()
                .map(|p| Point2::new(p.x as f64, p.y as f64))
                .collect();
            let area = polygon_area(&outline);

            if self.params.min_area < area && area < self.params.max_area {
                regions.push(CheckboxRegion { rect, area });
            } else {
                log::debug!(
                    "rejected contour at ({}, {}) {}x{} with area {:.0}",
                    rect.x,
                    rect.y,
                    rect.w,
                    rect.h,
                    area
                );
            }
        }

        regions.sort_by_key(|r| (r.rect.y, r.rect.x));
        log::debug!(
            "{} of {} external contours inside area band",
            regions.len(),
            inspected
        );
        Ok((regions, inspected))
    }

    /// Build a template from a blank rectified form.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, image), fields(width = image.width, height = image.height))
    )]
    pub fn build(&self, image: &GrayImageView<'_>) -> Result<TemplateBuild, BuildError> {
        let (regions, contours) = self.find_regions(image)?;
        let checkboxes = regions
            .iter()
            .map(|r| CheckboxDescriptor::new(r.rect, self.params.default_label.clone()))
            .collect();
        let size = TargetSize::new(image.width as u32, image.height as u32);
        log::info!("template: {} checkboxes on {} form", regions.len(), size);
        Ok(TemplateBuild {
            template: Template::new(size, checkboxes),
            regions,
            contours,
        })
    }
}
