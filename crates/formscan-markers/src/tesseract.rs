//! `tesseract` command-line adapter.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};

use formscan_core::GrayImageView;
use serde::{Deserialize, Serialize};

use crate::{OcrEngine, OcrError, OcrToken};

/// TSV `level` value of word rows.
const WORD_LEVEL: i32 = 5;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractParams {
    /// Executable name or path.
    pub program: String,
    /// Language pack passed as `-l`, engine default when `None`.
    pub lang: Option<String>,
    /// Page segmentation mode passed as `--psm`.
    pub psm: Option<u8>,
}

impl Default for TesseractParams {
    fn default() -> Self {
        Self {
            program: "tesseract".to_string(),
            lang: Some("eng".to_string()),
            psm: None,
        }
    }
}

/// Runs an installed `tesseract` binary, feeding the image as PGM on stdin
/// and reading word boxes back as TSV on stdout.
#[derive(Clone, Debug, Default)]
pub struct TesseractCli {
    params: TesseractParams,
}

impl TesseractCli {
    pub fn new(params: TesseractParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TesseractParams {
        &self.params
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.params.program);
        cmd.arg("stdin").arg("stdout");
        if let Some(lang) = &self.params.lang {
            cmd.arg("-l").arg(lang);
        }
        if let Some(psm) = self.params.psm {
            cmd.arg("--psm").arg(psm.to_string());
        }
        cmd.arg("tsv");
        cmd
    }
}

impl OcrEngine for TesseractCli {
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, image), fields(width = image.width, height = image.height))
    )]
    fn recognize(&self, image: &GrayImageView<'_>) -> Result<Vec<OcrToken>, OcrError> {
        let mut child = self
            .command()
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| OcrError::Spawn {
                program: self.params.program.clone(),
                source,
            })?;

        // tesseract reads the whole image before it writes anything
        if let Some(mut stdin) = child.stdin.take() {
            match stdin.write_all(&encode_pgm(image)) {
                // an early exit closes the pipe; its status and stderr say why
                Err(err) if err.kind() == ErrorKind::BrokenPipe => {
                    log::debug!("tesseract closed stdin early");
                }
                other => other?,
            }
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(OcrError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let tsv = String::from_utf8(output.stdout)?;
        let tokens = parse_tsv_tokens(&tsv);
        log::debug!("tesseract returned {} words", tokens.len());
        Ok(tokens)
    }
}

/// Binary PGM (`P5`) encoding of an 8-bit grayscale view.
fn encode_pgm(image: &GrayImageView<'_>) -> Vec<u8> {
    let header = format!("P5\n{} {}\n255\n", image.width, image.height);
    let mut out = Vec::with_capacity(header.len() + image.data.len());
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(image.data);
    out
}

/// Parse tesseract TSV output into word tokens.
///
/// Columns: `level page_num block_num par_num line_num word_num left top
/// width height conf text`. Only word rows with non-empty text are kept;
/// malformed rows are skipped. Confidence is rescaled from `0..100` to
/// `0.0..1.0`, and tesseract's `-1` becomes `0.0`.
pub fn parse_tsv_tokens(tsv: &str) -> Vec<OcrToken> {
    let mut tokens = Vec::new();

    for line in tsv.lines().skip(1) {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }
        if fields[0].trim().parse::<i32>().ok() != Some(WORD_LEVEL) {
            continue;
        }

        let text = fields[11].trim();
        if text.is_empty() {
            continue;
        }

        let Some([left, top, width, height]) = parse_box(&fields[6..10]) else {
            continue;
        };
        let conf: f32 = fields[10].trim().parse().unwrap_or(-1.0);
        let confidence = if conf < 0.0 { 0.0 } else { conf / 100.0 };

        tokens.push(OcrToken {
            text: text.to_string(),
            left,
            top,
            width,
            height,
            confidence,
        });
    }

    tokens
}

fn parse_box(fields: &[&str]) -> Option<[i32; 4]> {
    Some([
        fields[0].trim().parse().ok()?,
        fields[1].trim().parse().ok()?,
        fields[2].trim().parse().ok()?,
        fields[3].trim().parse().ok()?,
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext";

    #[test]
    fn parses_word_rows_with_boxes() {
        let tsv = format!(
            "{HEADER}\n\
             1\t1\t0\t0\t0\t0\t0\t0\t2000\t1400\t-1\t\n\
             5\t1\t1\t1\t1\t1\t12\t30\t80\t24\t96.5\tQZKL\n\
             5\t1\t1\t1\t1\t2\t140\t31\t60\t22\t88\tName:\n"
        );
        let tokens = parse_tsv_tokens(&tsv);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].text, "QZKL");
        assert_eq!(
            (tokens[0].left, tokens[0].top, tokens[0].width, tokens[0].height),
            (12, 30, 80, 24)
        );
        assert!((tokens[0].confidence - 0.965).abs() < 1e-6);
        assert!((tokens[1].confidence - 0.88).abs() < 1e-6);
    }

    #[test]
    fn negative_confidence_maps_to_zero() {
        let tsv = format!("{HEADER}\n5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t-1\tQZKL\n");
        let tokens = parse_tsv_tokens(&tsv);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].confidence, 0.0);
    }

    #[test]
    fn skips_malformed_and_empty_rows() {
        let tsv = format!(
            "{HEADER}\n\
             5\t1\t1\t1\t1\t1\t0\t0\t10\n\
             5\t1\t1\t1\t1\t1\tx\t0\t10\t10\t90\tQZKL\n\
             5\t1\t1\t1\t1\t1\t0\t0\t10\t10\t90\t \n"
        );
        assert!(parse_tsv_tokens(&tsv).is_empty());
        assert!(parse_tsv_tokens("").is_empty());
        assert!(parse_tsv_tokens(HEADER).is_empty());
    }

    #[test]
    fn pgm_header_precedes_pixels() {
        let data = [0u8, 128, 255, 7, 8, 9];
        let view = GrayImageView {
            width: 3,
            height: 2,
            data: &data,
        };
        let pgm = encode_pgm(&view);
        assert!(pgm.starts_with(b"P5\n3 2\n255\n"));
        assert_eq!(&pgm[pgm.len() - 6..], &data);
    }

    #[test]
    fn command_line_carries_language_and_psm() {
        let cli = TesseractCli::new(TesseractParams {
            program: "tesseract".into(),
            lang: Some("deu".into()),
            psm: Some(11),
        });
        let cmd = cli.command();
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(args, ["stdin", "stdout", "-l", "deu", "--psm", "11", "tsv"]);
    }

    #[cfg(unix)]
    #[test]
    fn early_exit_reports_child_stderr() {
        let dir = tempfile::tempdir().expect("tempdir");
        let script = dir.path().join("fake-tesseract");
        std::fs::write(
            &script,
            "#!/bin/sh\necho 'Failed loading language xyz' >&2\nexit 1\n",
        )
        .expect("write script");
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755))
                .expect("chmod");
        }
        let cli = TesseractCli::new(TesseractParams {
            program: script.to_string_lossy().into_owned(),
            ..TesseractParams::default()
        });
        // large enough to overflow the pipe buffer once the script is gone
        let data = vec![255u8; 1024 * 1024];
        let view = GrayImageView {
            width: 1024,
            height: 1024,
            data: &data,
        };
        match cli.recognize(&view) {
            Err(OcrError::Failed { stderr, .. }) => {
                assert!(stderr.contains("Failed loading language"), "stderr: {stderr}")
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let cli = TesseractCli::new(TesseractParams {
            program: "definitely-not-a-real-ocr-binary".into(),
            ..TesseractParams::default()
        });
        let data = [255u8; 4];
        let view = GrayImageView {
            width: 2,
            height: 2,
            data: &data,
        };
        assert!(matches!(
            cli.recognize(&view),
            Err(OcrError::Spawn { .. })
        ));
    }
}
