//! Debug overlays for template building and classification.

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_text_mut, text_size},
    rect::Rect,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{CheckStatus, CheckboxDescriptor, CheckboxResult};

/// Fonts tried when no explicit font path is configured.
const FALLBACK_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

#[derive(thiserror::Error, Debug)]
pub enum AnnotateError {
    #[error("failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a usable TrueType/OpenType font")]
    Font { path: PathBuf },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    /// Outline color for detected template regions.
    pub template_color: [u8; 3],
    pub checked_color: [u8; 3],
    pub unchecked_color: [u8; 3],
    pub text_color: [u8; 3],
    /// Outline thickness in pixels, centered on the box edge.
    pub thickness: u32,
    /// Gap between the box top and the text baseline.
    pub text_offset: u32,
    /// Text height in pixels.
    pub font_scale: f32,
    pub font_path: Option<PathBuf>,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            template_color: [0, 255, 0],
            checked_color: [0, 255, 0],
            unchecked_color: [255, 0, 0],
            text_color: [255, 0, 0],
            thickness: 2,
            text_offset: 10,
            font_scale: 16.0,
            font_path: None,
        }
    }
}

pub struct Annotator {
    style: AnnotationStyle,
    font: Option<FontVec>,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("style", &self.style)
            .field("font", &self.font.is_some())
            .finish()
    }
}

impl Annotator {
    /// Create an annotator, loading the configured font or the first
    /// available system fallback. Text is skipped when none loads.
    pub fn new(style: AnnotationStyle) -> Self {
        let font = match &style.font_path {
            Some(path) => match load_font(path) {
                Ok(font) => Some(font),
                Err(err) => {
                    log::warn!("{err}; overlay labels disabled");
                    None
                }
            },
            None => {
                let found = FALLBACK_FONTS
                    .iter()
                    .map(Path::new)
                    .filter(|p| p.is_file())
                    .find_map(|p| load_font(p).ok());
                if found.is_none() {
                    log::warn!("no system font found; overlay labels disabled");
                }
                found
            }
        };
        Self { style, font }
    }

    /// Create an annotator with an already loaded font, or none.
    pub fn with_font(style: AnnotationStyle, font: Option<FontVec>) -> Self {
        Self { style, font }
    }

    pub fn style(&self) -> &AnnotationStyle {
        &self.style
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Outline every template region and label it with its top-left corner.
    pub fn draw_template(&self, canvas: &mut RgbImage, boxes: &[CheckboxDescriptor]) {
        for b in boxes {
            self.outline(canvas, b, Rgb(self.style.template_color));
            self.label(canvas, b, &format!("({}, {})", b.x, b.y));
        }
    }

    /// Outline every scored region in its status color and label it.
    pub fn draw_results(&self, canvas: &mut RgbImage, results: &[CheckboxResult]) {
        for r in results {
            let color = match r.status {
                CheckStatus::Checked => self.style.checked_color,
                CheckStatus::Unchecked => self.style.unchecked_color,
            };
            self.outline(canvas, &r.descriptor, Rgb(color));
            self.label(canvas, &r.descriptor, &r.label_text());
        }
    }

    fn outline(&self, canvas: &mut RgbImage, b: &CheckboxDescriptor, color: Rgb<u8>) {
        let t = self.style.thickness.max(1) as i32;
        // rings from outside to inside, centered on the x..=x+w edge
        for k in -((t - 1) / 2)..=(t / 2) {
            let w = b.w as i64 + 1 - 2 * k as i64;
            let h = b.h as i64 + 1 - 2 * k as i64;
            if w <= 0 || h <= 0 {
                break;
            }
            let rect = Rect::at(b.x as i32 + k, b.y as i32 + k).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, rect, color);
        }
    }

    fn label(&self, canvas: &mut RgbImage, b: &CheckboxDescriptor, text: &str) {
        let Some(font) = &self.font else {
            return;
        };
        let scale = PxScale::from(self.style.font_scale);
        let (_, text_h) = text_size(scale, font, text);
        // text sits above the box with its bottom `text_offset` px over the edge
        let top = b.y as i32 - self.style.text_offset as i32 - text_h as i32;
        draw_text_mut(
            canvas,
            Rgb(self.style.text_color),
            b.x as i32,
            top,
            scale,
            font,
            text,
        );
    }
}

/// Read a font file from disk.
pub fn load_font(path: impl AsRef<Path>) -> Result<FontVec, AnnotateError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| AnnotateError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    FontVec::try_from_vec(bytes).map_err(|_| AnnotateError::Font {
        path: path.to_path_buf(),
    })
}
