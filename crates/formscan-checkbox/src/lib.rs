//! Checkbox layout templates and checked/unchecked scoring on rectified forms.
//!
//! Typical flow:
//! - first run: [`TemplateBuilder`] finds box-shaped contours on a blank,
//!   rectified form and produces a [`Template`] which is written as JSON;
//! - later runs: [`CheckboxClassifier`] loads that template and scores each
//!   region of a filled-in form by its mean gray level, and a
//!   [`StatusReport`] is written as CSV.
//!
//! [`Annotator`] renders debug overlays for both stages.

mod annotate;
mod builder;
mod classify;
mod report;
mod template;

pub use annotate::{load_font, AnnotateError, AnnotationStyle, Annotator};
pub use builder::{BuildError, CheckboxRegion, TemplateBuild, TemplateBuilder, TemplateParams};
pub use classify::{
    CheckStatus, CheckboxClassifier, CheckboxResult, ClassifierParams, ClassifyError,
    DEFAULT_THRESHOLD,
};
pub use report::{ReportError, ReportRow, StatusReport};
pub use template::{BoxOutOfRange, CheckboxDescriptor, Template, TemplateIoError, DEFAULT_LABEL};
