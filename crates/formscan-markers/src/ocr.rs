//! OCR engine boundary.

use formscan_core::GrayImageView;
use serde::{Deserialize, Serialize};

/// One recognized word with its axis-aligned box in image pixels.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OcrToken {
    pub text: String,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    /// Engine confidence in `0.0..=1.0`.
    pub confidence: f32,
}

impl OcrToken {
    pub fn new(text: impl Into<String>, left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            width,
            height,
            confidence: 1.0,
        }
    }
}

/// Errors raised when the OCR engine itself cannot produce a result.
///
/// A marker that is merely not recognized is not an error; it shows up as a
/// missing token.
#[derive(thiserror::Error, Debug)]
pub enum OcrError {
    #[error("failed to run OCR program `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("OCR program exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("OCR output is not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Anything that turns a grayscale image into recognized text tokens.
pub trait OcrEngine {
    fn recognize(&self, image: &GrayImageView<'_>) -> Result<Vec<OcrToken>, OcrError>;
}

impl<T: OcrEngine + ?Sized> OcrEngine for &T {
    fn recognize(&self, image: &GrayImageView<'_>) -> Result<Vec<OcrToken>, OcrError> {
        (**self).recognize(image)
    }
}

/// Engine that ignores the image and returns a fixed token list.
///
/// Useful for synthetic images and for replaying OCR output captured elsewhere.
#[derive(Clone, Debug, Default)]
pub struct StaticOcr {
    pub tokens: Vec<OcrToken>,
}

impl StaticOcr {
    pub fn new(tokens: Vec<OcrToken>) -> Self {
        Self { tokens }
    }
}

impl OcrEngine for StaticOcr {
    fn recognize(&self, _image: &GrayImageView<'_>) -> Result<Vec<OcrToken>, OcrError> {
        Ok(self.tokens.clone())
    }
}
