use std::path::{Path, PathBuf};

use harvester_core::{Record, SessionResult, SessionStatus};
use serde_json::json;

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Union of field names across records, in first-seen order.
pub fn csv_columns(records: &[Record]) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for record in records {
        for name in record.field_names() {
            if !columns.iter().any(|c| c == name) {
                columns.push(name.to_string());
            }
        }
    }
    columns
}

/// One header row, then one row per record; missing and null cells are empty.
pub fn records_to_csv(records: &[Record]) -> Result<Vec<u8>, ExportError> {
    let columns = csv_columns(records);
    if columns.is_empty() {
        return Ok(Vec::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(
            columns
                .iter()
                .map(|c| record.get(c).unwrap_or_default()),
        )?;
    }
    writer
        .into_inner()
        .map_err(|err| ExportError::Csv(err.into_error().into()))
}

pub fn write_csv(dir: &Path, filename: &str, records: &[Record]) -> Result<PathBuf, ExportError> {
    let content = records_to_csv(records)?;
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    Ok(writer.write(filename, content)?)
}

pub fn write_json(dir: &Path, filename: &str, records: &[Record]) -> Result<PathBuf, ExportError> {
    let content = serde_json::to_string_pretty(records)?;
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    Ok(writer.write(filename, content)?)
}

/// Expected vs. actual counts for one finished session.
pub fn write_summary(
    dir: &Path,
    filename: &str,
    source_id: &str,
    result: &SessionResult,
    finished_utc: &str,
) -> Result<PathBuf, ExportError> {
    let (status, reason) = match result.status() {
        SessionStatus::Complete => ("complete", None),
        SessionStatus::Partial { .. } => ("partial", None),
        SessionStatus::Failed(reason) => ("failed", Some(reason.to_string())),
    };
    let summary = json!({
        "source_id": source_id,
        "status": status,
        "failure": reason,
        "expected_total": result.expected_total(),
        "actual_total": result.actual_total(),
        "outstanding": result.outstanding(),
        "finished_utc": finished_utc,
    });
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    Ok(writer.write(filename, serde_json::to_string_pretty(&summary)?)?)
}
