//! Per-box status report written as CSV.

use serde::Serialize;
use std::{fs::File, io::Write, path::Path};

use crate::{CheckStatus, CheckboxResult};

#[derive(thiserror::Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

/// One CSV row: `Box n,pos|neg`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    #[serde(rename = "Box")]
    pub box_label: String,
    #[serde(rename = "Status")]
    pub status: CheckStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub rows: Vec<ReportRow>,
}

impl StatusReport {
    pub fn from_results(results: &[CheckboxResult]) -> Self {
        let rows = results
            .iter()
            .map(|r| ReportRow {
                box_label: format!("Box {}", r.ordinal()),
                status: r.status,
            })
            .collect();
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write the header and one row per box.
    pub fn write_to<W: Write>(&self, out: W) -> Result<(), ReportError> {
        let mut writer = csv::Writer::from_writer(out);
        // header must be present even for an empty template
        writer.write_record(["Box", "Status"])?;
        for row in &self.rows {
            writer.write_record([row.box_label.as_str(), row.status.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<(), ReportError> {
        let file = File::create(path.as_ref())?;
        self.write_to(file)?;
        log::info!(
            "wrote {} report rows to {}",
            self.rows.len(),
            path.as_ref().display()
        );
        Ok(())
    }
}
