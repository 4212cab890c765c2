use formscan_core::GrayImageView;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::{OcrEngine, OcrError, OcrToken};

/// Text printed at each corner of the form.
pub const DEFAULT_MARKER_LABEL: &str = "QZKL";

/// Integer centroid of one detected marker token, in source image pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarkerPoint {
    pub x: i32,
    pub y: i32,
}

impl MarkerPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Centroid of a token box, rounded down like the box coordinates themselves.
    pub fn from_token(token: &OcrToken) -> Self {
        Self::new(
            token.left + token.width.div_euclid(2),
            token.top + token.height.div_euclid(2),
        )
    }

    pub fn to_point(self) -> Point2<f32> {
        Point2::new(self.x as f32, self.y as f32)
    }
}

/// Keep the centroids of tokens whose text is exactly `label`, in OCR order.
///
/// Matching is byte-exact: no case folding, no fuzzy matching and no
/// confidence cut-off.
pub fn markers_from_tokens(tokens: &[OcrToken], label: &str) -> Vec<MarkerPoint> {
    tokens
        .iter()
        .filter(|t| t.text == label)
        .map(MarkerPoint::from_token)
        .collect()
}

#[derive(Clone, Debug)]
pub struct MarkerLocator {
    label: String,
}

impl Default for MarkerLocator {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER_LABEL)
    }
}

impl MarkerLocator {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Run `ocr` over `image` and return every marker centroid it finds.
    ///
    /// Absent or misread markers simply shorten the returned list; enforcing
    /// the expected count is left to the caller.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, ocr, image), fields(label = %self.label))
    )]
    pub fn locate<E: OcrEngine + ?Sized>(
        &self,
        ocr: &E,
        image: &GrayImageView<'_>,
    ) -> Result<Vec<MarkerPoint>, OcrError> {
        let tokens = ocr.recognize(image)?;
        let markers = markers_from_tokens(&tokens, &self.label);
        log::info!(
            "found {} '{}' markers among {} OCR tokens",
            markers.len(),
            self.label,
            tokens.len()
        );
        Ok(markers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StaticOcr;

    #[test]
    fn centroid_uses_floor_division() {
        let t = OcrToken::new("QZKL", 10, 20, 41, 15);
        assert_eq!(MarkerPoint::from_token(&t), MarkerPoint::new(30, 27));
    }

    #[test]
    fn only_exact_label_matches() {
        let mut low_conf = OcrToken::new("QZKL", 500, 500, 10, 10);
        low_conf.confidence = 0.01;
        let tokens = vec![
            OcrToken::new("QZKL", 0, 0, 10, 10),
            OcrToken::new("qzkl", 100, 0, 10, 10),
            OcrToken::new("QZKL.", 200, 0, 10, 10),
            OcrToken::new("QZK", 300, 0, 10, 10),
            low_conf,
        ];
        let found = markers_from_tokens(&tokens, "QZKL");
        assert_eq!(found, vec![MarkerPoint::new(5, 5), MarkerPoint::new(505, 505)]);
    }

    #[test]
    fn locator_preserves_ocr_order() {
        let ocr = StaticOcr::new(vec![
            OcrToken::new("QZKL", 900, 900, 20, 20),
            OcrToken::new("Name", 50, 50, 20, 20),
            OcrToken::new("QZKL", 10, 10, 20, 20),
        ]);
        let data = [0u8; 1];
        let view = GrayImageView {
            width: 1,
            height: 1,
            data: &data,
        };
        let found = MarkerLocator::default()
            .locate(&ocr, &view)
            .expect("static OCR never fails");
        assert_eq!(found, vec![MarkerPoint::new(910, 910), MarkerPoint::new(20, 20)]);
    }
}
