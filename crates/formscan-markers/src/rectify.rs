use formscan_core::{
    homography_from_4pt, warp_perspective_gray, warp_perspective_rgb, GrayImage, GrayImageView,
    Homography, RgbImage, RgbImageView, TargetSize,
};

use crate::{CornerOrder, CornerSet, MarkerPoint};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RectifyError {
    #[error("could not detect four markers (found {found})")]
    MarkerCount { found: usize },
    #[error("invalid rectified size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("degenerate marker quad, homography estimation failed")]
    Homography,
}

/// A rectified image together with the geometry that produced it.
#[derive(Clone, Debug)]
pub struct Rectification<I = GrayImage> {
    pub image: I,
    pub corners: CornerSet,
    /// Maps rectified pixel coordinates back into the source capture.
    pub h_img_from_rect: Homography,
}

pub type RectifiedRgb = Rectification<RgbImage>;

#[derive(Clone, Debug)]
pub struct Rectifier {
    size: TargetSize,
    order: CornerOrder,
}

impl Rectifier {
    pub fn new(size: TargetSize, order: CornerOrder) -> Result<Self, RectifyError> {
        if size.width == 0 || size.height == 0 {
            return Err(RectifyError::InvalidSize {
                width: size.width,
                height: size.height,
            });
        }
        Ok(Self { size, order })
    }

    pub fn size(&self) -> TargetSize {
        self.size
    }

    pub fn corner_order(&self) -> CornerOrder {
        self.order
    }

    /// Turn raw marker centroids into a [`CornerSet`]; anything but four is fatal.
    pub fn corners(
        &self,
        markers: &[MarkerPoint],
        src_width: usize,
        src_height: usize,
    ) -> Result<CornerSet, RectifyError> {
        let points: [MarkerPoint; 4] = markers
            .try_into()
            .map_err(|_| RectifyError::MarkerCount {
                found: markers.len(),
            })?;
        let corners = CornerSet::order(points, self.order, src_width, src_height);
        log::info!(
            "corners tl=({},{}) tr=({},{}) br=({},{}) bl=({},{})",
            corners.top_left.x,
            corners.top_left.y,
            corners.top_right.x,
            corners.top_right.y,
            corners.bottom_right.x,
            corners.bottom_right.y,
            corners.bottom_left.x,
            corners.bottom_left.y
        );
        Ok(corners)
    }

    /// Homography taking rectified pixels to source pixels.
    pub fn homography(&self, corners: &CornerSet) -> Result<Homography, RectifyError> {
        homography_from_4pt(&self.size.quad(), &corners.quad()).ok_or(RectifyError::Homography)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, src, markers), fields(size = %self.size, markers = markers.len()))
    )]
    pub fn rectify_gray(
        &self,
        src: &GrayImageView<'_>,
        markers: &[MarkerPoint],
    ) -> Result<Rectification, RectifyError> {
        let corners = self.corners(markers, src.width, src.height)?;
        let h_img_from_rect = self.homography(&corners)?;
        let image = warp_perspective_gray(
            src,
            h_img_from_rect,
            self.size.width as usize,
            self.size.height as usize,
        );
        Ok(Rectification {
            image,
            corners,
            h_img_from_rect,
        })
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, src, markers), fields(size = %self.size, markers = markers.len()))
    )]
    pub fn rectify_rgb(
        &self,
        src: &RgbImageView<'_>,
        markers: &[MarkerPoint],
    ) -> Result<RectifiedRgb, RectifyError> {
        let corners = self.corners(markers, src.width, src.height)?;
        let h_img_from_rect = self.homography(&corners)?;
        let image = warp_perspective_rgb(
            src,
            h_img_from_rect,
            self.size.width as usize,
            self.size.height as usize,
        );
        Ok(Rectification {
            image,
            corners,
            h_img_from_rect,
        })
    }
}
