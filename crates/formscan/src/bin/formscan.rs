//! formscan CLI: rectify a form photo by its four printed markers, then build
//! a checkbox template (mode 1) or classify boxes against it (mode 2).

use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use formscan::markers::{CornerOrder, TargetSize, TesseractCli};
use formscan::{FormScanConfig, FormScanner, Mode, PipelineError, RunSummary};
use log::LevelFilter;

#[derive(Parser, Debug)]
#[command(name = "formscan")]
#[command(about = "Rectify a scanned form and build or apply a checkbox template")]
#[command(version)]
struct Cli {
    /// Path to the form image.
    image_path: PathBuf,

    /// 1 = build template from a blank form, 2 = classify a filled form.
    mode: u8,

    /// Width of the rectified form in pixels.
    fixed_width: u32,

    /// Height of the rectified form in pixels.
    fixed_height: u32,

    /// Mean gray level below which a box counts as checked.
    threshold: f64,

    /// Template JSON to write (mode 1) or read (mode 2).
    #[arg(long)]
    template: Option<PathBuf>,

    /// Report CSV path (default: `<image stem>_report.csv`).
    #[arg(long)]
    report: Option<PathBuf>,

    /// JSON config with marker, OCR, template and drawing settings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// How the four markers are assigned to form corners.
    #[arg(long, value_enum)]
    corner_order: Option<CornerOrderArg>,

    /// Log verbosity (off, error, warn, info, debug, trace).
    /// Builds with the `tracing` feature read `RUST_LOG` instead.
    #[arg(long, default_value = "info", value_parser = parse_level)]
    log_level: LevelFilter,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CornerOrderArg {
    IndexHeuristic,
    NearestCorner,
}

impl From<CornerOrderArg> for CornerOrder {
    fn from(arg: CornerOrderArg) -> Self {
        match arg {
            CornerOrderArg::IndexHeuristic => CornerOrder::IndexHeuristic,
            CornerOrderArg::NearestCorner => CornerOrder::NearestCorner,
        }
    }
}

fn parse_level(s: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(s).map_err(|_| format!("unknown log level '{s}'"))
}

fn init_logging(level: LevelFilter) {
    #[cfg(feature = "tracing")]
    {
        let _ = level;
        let _ = tracing_log::LogTracer::init();
        formscan::core::init_tracing(false);
    }
    #[cfg(not(feature = "tracing"))]
    {
        if let Err(err) = formscan::core::init_with_level(level) {
            eprintln!("warning: logger not installed: {err}");
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_level);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), PipelineError> {
    let mode = Mode::try_from(cli.mode)?;

    let mut config = match &cli.config {
        Some(path) => FormScanConfig::load_json(path)?,
        None => FormScanConfig::default(),
    };
    config.classify.threshold = cli.threshold;
    if let Some(order) = cli.corner_order {
        config.markers.corner_order = order.into();
    }
    if let Some(path) = cli.template {
        config.output.template_path = path;
    }

    let ocr = TesseractCli::new(config.ocr.clone());
    let size = TargetSize::new(cli.fixed_width, cli.fixed_height);
    let scanner = FormScanner::new(config, size, ocr)?;

    match scanner.run(mode, &cli.image_path, cli.report.as_deref())? {
        RunSummary::Template {
            template_path,
            annotated_path,
            boxes,
        } => {
            println!(
                "{boxes} checkboxes written to {} (overlay: {})",
                template_path.display(),
                annotated_path.display()
            );
        }
        RunSummary::Classify {
            report_path,
            annotated_path,
            checked,
            total,
        } => {
            println!(
                "{checked}/{total} boxes checked; report {} (overlay: {})",
                report_path.display(),
                annotated_path.display()
            );
        }
    }
    Ok(())
}
