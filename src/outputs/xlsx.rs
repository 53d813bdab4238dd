//! Excel report output.
//!
//! The workbook has a single sheet with a bold header row followed by one row
//! per record:
//!
//! | title | date | description | picture filename | count of search phrases | contains money |
//! |-------|------|-------------|------------------|-------------------------|----------------|
//! | text  | `DD-MM-YYYY` or blank | text | path or blank | number | boolean |
//!
//! The file is built under a staging name next to the destination and renamed
//! into place, so a reader sees either the previous report or the new one,
//! never a half-written file.

use crate::models::ReportTable;
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const SHEET_NAME: &str = "News";
pub const DATE_FORMAT: &str = "%d-%m-%Y";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("could not build workbook: {0}")]
    Xlsx(#[from] XlsxError),
    #[error("could not move report into place: {0}")]
    Io(#[from] std::io::Error),
    #[error("report has more rows than a worksheet holds")]
    TooManyRows,
}

/// Write `table` to `destination`, replacing any existing file.
#[instrument(level = "info", skip_all, fields(path = %destination.display(), records = table.len()))]
pub fn write_report(table: &ReportTable, destination: &Path) -> Result<(), ReportError> {
    let staging = staging_path(destination);
    let result = build_workbook(table, &staging)
        .and_then(|()| fs::rename(&staging, destination).map_err(ReportError::from));

    if let Err(e) = &result {
        warn!(error = %e, "Report write failed; removing staging file");
        let _ = fs::remove_file(&staging);
    } else {
        info!("Wrote report");
    }
    result
}

fn staging_path(destination: &Path) -> PathBuf {
    let name = destination
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "report.xlsx".to_string());
    destination.with_file_name(format!(".{name}.partial.xlsx"))
}

fn build_workbook(table: &ReportTable, path: &Path) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    {
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME)?;

        for (col, name) in (0u16..).zip(ReportTable::HEADER) {
            sheet.write_string_with_format(0, col, name, &bold)?;
        }

        for (i, record) in table.records().iter().enumerate() {
            let row = u32::try_from(i + 1).map_err(|_| ReportError::TooManyRows)?;
            let date = record
                .published
                .map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default();

            sheet.write_string(row, 0, record.title.as_str())?;
            sheet.write_string(row, 1, date)?;
            sheet.write_string(row, 2, record.description.as_str())?;
            sheet.write_string(row, 3, record.picture_filename())?;
            sheet.write_number(row, 4, record.phrase_count as f64)?;
            sheet.write_boolean(row, 5, record.contains_money)?;
        }
        sheet.autofit();
    }

    workbook.save(path)?;
    Ok(())
}
