//! End-to-end scan of one form image.
//!
//! The stages run in memory: OCR marker location on the grayscale capture,
//! rectification of the color capture, then template building or checkbox
//! classification on the rectified grayscale. Files are written only after
//! every stage succeeded.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use formscan_checkbox::{
    Annotator, BuildError, CheckboxClassifier, CheckboxRegion, CheckboxResult, ClassifyError,
    ReportError, StatusReport, Template, TemplateBuilder, TemplateIoError,
};
use formscan_core::{rgb_to_gray, RgbImageView, TargetSize};
use formscan_markers::{
    MarkerLocator, OcrEngine, OcrError, RectifiedRgb, Rectifier, RectifyError,
};
use image::ImageReader;

use crate::{ConfigError, FormScanConfig};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid mode '{0}': expected 1 (build template) or 2 (classify)")]
pub struct ModeError(pub String);

/// What a run does with the rectified form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Mode {
    /// Detect checkbox outlines on a blank form and write a template.
    BuildTemplate = 1,
    /// Score a filled form against an existing template.
    Classify = 2,
}

impl TryFrom<u8> for Mode {
    type Error = ModeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Mode::BuildTemplate),
            2 => Ok(Mode::Classify),
            other => Err(ModeError(other.to_string())),
        }
    }
}

impl FromStr for Mode {
    type Err = ModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u8 = s.trim().parse().map_err(|_| ModeError(s.to_string()))?;
        Mode::try_from(value)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::BuildTemplate => f.write_str("build-template"),
            Mode::Classify => f.write_str("classify"),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Mode(#[from] ModeError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),
    #[error(transparent)]
    Rectify(#[from] RectifyError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error("template: {0}")]
    Template(#[from] TemplateIoError),
    #[error("report: {0}")]
    Report(#[from] ReportError),
    #[error("pixel buffer does not match {width}x{height}")]
    Buffer { width: usize, height: usize },
}

/// Result of [`FormScanner::build_template`], not yet written anywhere.
#[derive(Clone, Debug)]
pub struct TemplateOutcome {
    pub template: Template,
    pub regions: Vec<CheckboxRegion>,
    /// Rectified form with the detected regions outlined.
    pub annotated: image::RgbImage,
}

/// Result of [`FormScanner::classify`], not yet written anywhere.
#[derive(Clone, Debug)]
pub struct ClassifyOutcome {
    pub results: Vec<CheckboxResult>,
    pub report: StatusReport,
    /// Rectified form with every box outlined in its status color.
    pub annotated: image::RgbImage,
}

impl ClassifyOutcome {
    pub fn checked(&self) -> usize {
        self.results.iter().filter(|r| r.status.is_checked()).count()
    }
}

/// Files produced by [`FormScanner::run`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunSummary {
    Template {
        template_path: PathBuf,
        annotated_path: PathBuf,
        boxes: usize,
    },
    Classify {
        report_path: PathBuf,
        annotated_path: PathBuf,
        checked: usize,
        total: usize,
    },
}

/// Insert `suffix` between the file stem and the extension of `path`.
pub fn annotated_path(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let name = match path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    path.with_file_name(name)
}

/// `<dir>/<stem><suffix>.csv` next to the input image.
pub fn report_path(image_path: &Path, suffix: &str) -> PathBuf {
    let stem = image_path.file_stem().unwrap_or_default().to_string_lossy();
    image_path.with_file_name(format!("{stem}{suffix}.csv"))
}

/// Convert an `image::RgbImage` into the lightweight `formscan-core` view type.
pub fn rgb_view(img: &image::RgbImage) -> RgbImageView<'_> {
    RgbImageView {
        width: img.width() as usize,
        height: img.height() as usize,
        data: img.as_raw(),
    }
}

#[cfg_attr(feature = "tracing", tracing::instrument(level = "info", skip(path)))]
pub fn load_rgb(path: impl AsRef<Path>) -> Result<image::RgbImage, PipelineError> {
    Ok(ImageReader::open(path)?.decode()?.to_rgb8())
}

fn into_image(img: formscan_core::RgbImage) -> Result<image::RgbImage, PipelineError> {
    let (width, height) = (img.width, img.height);
    image::RgbImage::from_raw(width as u32, height as u32, img.data)
        .ok_or(PipelineError::Buffer { width, height })
}

/// Runs the configured stages with one OCR engine and one target size.
pub struct FormScanner<E> {
    config: FormScanConfig,
    ocr: E,
    locator: MarkerLocator,
    rectifier: Rectifier,
    builder: TemplateBuilder,
    classifier: CheckboxClassifier,
    annotator: Annotator,
}

impl<E: OcrEngine> FormScanner<E> {
    pub fn new(config: FormScanConfig, size: TargetSize, ocr: E) -> Result<Self, PipelineError> {
        let locator = MarkerLocator::new(config.markers.label.clone());
        let rectifier = Rectifier::new(size, config.markers.corner_order)?;
        let builder = TemplateBuilder::new(config.template.clone())?;
        let classifier = CheckboxClassifier::new(config.classify.clone())?;
        let annotator = Annotator::new(config.annotate.clone());
        Ok(Self {
            config,
            ocr,
            locator,
            rectifier,
            builder,
            classifier,
            annotator,
        })
    }

    pub fn config(&self) -> &FormScanConfig {
        &self.config
    }

    pub fn size(&self) -> TargetSize {
        self.rectifier.size()
    }

    /// Locate the four markers and warp the capture to the target size.
    pub fn rectify(&self, image: &image::RgbImage) -> Result<RectifiedRgb, PipelineError> {
        let view = rgb_view(image);
        let gray = rgb_to_gray(&view);
        let markers = self.locator.locate(&self.ocr, &gray.view())?;
        Ok(self.rectifier.rectify_rgb(&view, &markers)?)
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, image), fields(width = image.width(), height = image.height()))
    )]
    pub fn build_template(&self, image: &image::RgbImage) -> Result<TemplateOutcome, PipelineError> {
        let rectified = self.rectify(image)?;
        let gray = rgb_to_gray(&rectified.image.view());
        let build = self.builder.build(&gray.view())?;

        let mut annotated = into_image(rectified.image)?;
        self.annotator
            .draw_template(&mut annotated, &build.template.checkboxes);
        Ok(TemplateOutcome {
            template: build.template,
            regions: build.regions,
            annotated,
        })
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, image, template), fields(boxes = template.len()))
    )]
    pub fn classify(
        &self,
        image: &image::RgbImage,
        template: &Template,
    ) -> Result<ClassifyOutcome, PipelineError> {
        // fail before running OCR when the template cannot fit
        if let Some(size) = template.size {
            if size != self.size() {
                return Err(ClassifyError::SizeMismatch {
                    template: size,
                    image: self.size(),
                }
                .into());
            }
        }

        let rectified = self.rectify(image)?;
        let gray = rgb_to_gray(&rectified.image.view());
        let results = self.classifier.classify(&gray.view(), template)?;
        let report = StatusReport::from_results(&results);

        let mut annotated = into_image(rectified.image)?;
        self.annotator.draw_results(&mut annotated, &results);
        Ok(ClassifyOutcome {
            results,
            report,
            annotated,
        })
    }

    /// Process `image_path` in `mode` and write every output file.
    ///
    /// `report_override` replaces the default `<stem>_report.csv` location.
    pub fn run(
        &self,
        mode: Mode,
        image_path: &Path,
        report_override: Option<&Path>,
    ) -> Result<RunSummary, PipelineError> {
        log::info!("{} {}", mode, image_path.display());
        let image = load_rgb(image_path)?;
        let out = &self.config.output;
        let overlay_path = annotated_path(image_path, &out.annotated_suffix);

        match mode {
            Mode::BuildTemplate => {
                let outcome = self.build_template(&image)?;
                outcome.template.write_json(&out.template_path)?;
                if let Err(err) = outcome.annotated.save(&overlay_path) {
                    let _ = std::fs::remove_file(&out.template_path);
                    return Err(err.into());
                }
                log::info!(
                    "wrote template with {} boxes to {}",
                    outcome.template.len(),
                    out.template_path.display()
                );
                Ok(RunSummary::Template {
                    template_path: out.template_path.clone(),
                    annotated_path: overlay_path,
                    boxes: outcome.template.len(),
                })
            }
            Mode::Classify => {
                let template = Template::load_json(&out.template_path)?;
                let outcome = self.classify(&image, &template)?;
                let csv_path = report_override
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| report_path(image_path, &out.report_suffix));
                outcome.report.write_csv(&csv_path)?;
                if let Err(err) = outcome.annotated.save(&overlay_path) {
                    let _ = std::fs::remove_file(&csv_path);
                    return Err(err.into());
                }
                Ok(RunSummary::Classify {
                    report_path: csv_path,
                    annotated_path: overlay_path,
                    checked: outcome.checked(),
                    total: outcome.results.len(),
                })
            }
        }
    }
}
