//! Checkbox layout template and its JSON file format.

use formscan_core::{PixelRect, TargetSize};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Placeholder label; real labels are filled in by hand after authoring.
pub const DEFAULT_LABEL: &str = "label_here";

fn default_label() -> String {
    DEFAULT_LABEL.to_string()
}

#[derive(thiserror::Error, Debug)]
pub enum TemplateIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// One checkbox region in rectified-image pixels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckboxDescriptor {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
    #[serde(default = "default_label")]
    pub label: String,
}

impl CheckboxDescriptor {
    pub fn new(rect: PixelRect, label: impl Into<String>) -> Self {
        Self {
            x: rect.x,
            y: rect.y,
            w: rect.w,
            h: rect.h,
            label: label.into(),
        }
    }

    pub fn rect(&self) -> PixelRect {
        PixelRect::new(self.x, self.y, self.w, self.h)
    }
}

/// Ordered checkbox layout for one form design.
///
/// `size` is the rectified image size the coordinates refer to. Templates
/// written before the size was recorded load with `size == None`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TemplateFile", into = "TemplateFile")]
pub struct Template {
    pub size: Option<TargetSize>,
    pub checkboxes: Vec<CheckboxDescriptor>,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum TemplateFile {
    Sized {
        width: u32,
        height: u32,
        checkboxes: Vec<CheckboxDescriptor>,
    },
    Bare(Vec<CheckboxDescriptor>),
}

/// A descriptor whose far edge does not fit in `u32` pixel coordinates.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("checkbox {ordinal} at ({x}, {y}) size {w}x{h} extends past the coordinate range")]
pub struct BoxOutOfRange {
    pub ordinal: usize,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

fn check_extent(checkboxes: &[CheckboxDescriptor]) -> Result<(), BoxOutOfRange> {
    for (i, c) in checkboxes.iter().enumerate() {
        if c.x.checked_add(c.w).is_none() || c.y.checked_add(c.h).is_none() {
            return Err(BoxOutOfRange {
                ordinal: i + 1,
                x: c.x,
                y: c.y,
                w: c.w,
                h: c.h,
            });
        }
    }
    Ok(())
}

impl TryFrom<TemplateFile> for Template {
    type Error = BoxOutOfRange;

    fn try_from(file: TemplateFile) -> Result<Self, Self::Error> {
        let (size, checkboxes) = match file {
            TemplateFile::Sized {
                width,
                height,
                checkboxes,
            } => (Some(TargetSize::new(width, height)), checkboxes),
            TemplateFile::Bare(checkboxes) => (None, checkboxes),
        };
        check_extent(&checkboxes)?;
        Ok(Self { size, checkboxes })
    }
}

impl From<Template> for TemplateFile {
    fn from(t: Template) -> Self {
        match t.size {
            Some(size) => TemplateFile::Sized {
                width: size.width,
                height: size.height,
                checkboxes: t.checkboxes,
            },
            None => TemplateFile::Bare(t.checkboxes),
        }
    }
}

impl Template {
    pub fn new(size: TargetSize, checkboxes: Vec<CheckboxDescriptor>) -> Self {
        Self {
            size: Some(size),
            checkboxes,
        }
    }

    pub fn len(&self) -> usize {
        self.checkboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkboxes.is_empty()
    }

    /// Load a template from JSON on disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, TemplateIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this template to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TemplateIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
