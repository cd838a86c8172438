use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use engine_logging::{engine_info, engine_warn};
use harvester_core::{SessionResult, SessionStatus};
use harvester_engine::{
    ensure_output_dir, output_stem, write_csv, write_json, write_summary, CheckpointStore,
    FileCheckpointStore,
};

use crate::cli::ExportFormat;

/// Where one source's files go: `{dir}/{stem}.csv`, `.json`,
/// `.summary.json`, plus the checkpoint in the same directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    dir: PathBuf,
    stem: String,
}

impl OutputPaths {
    pub fn new(prefix: Option<&Path>, source_id: &str) -> Result<Self> {
        let Some(prefix) = prefix else {
            return Ok(Self {
                dir: PathBuf::from("."),
                stem: output_stem(source_id),
            });
        };
        let stem = prefix
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .with_context(|| format!("output prefix {} has no file name", prefix.display()))?
            .to_string();
        let dir = prefix
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        Ok(Self { dir, stem })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file(&self, extension: &str) -> String {
        format!("{}.{}", self.stem, extension)
    }
}

/// How a finished run maps onto the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Complete,
    Partial,
    Failed,
}

impl RunOutcome {
    pub fn of(status: &SessionStatus) -> Self {
        match status {
            SessionStatus::Complete => RunOutcome::Complete,
            SessionStatus::Partial { .. } => RunOutcome::Partial,
            SessionStatus::Failed(_) => RunOutcome::Failed,
        }
    }

    pub fn exit_code(self) -> ExitCode {
        match self {
            RunOutcome::Complete => ExitCode::SUCCESS,
            RunOutcome::Partial => ExitCode::from(2),
            RunOutcome::Failed => ExitCode::from(3),
        }
    }
}

/// Write exports and the summary, then drop the checkpoint if the harvest
/// is complete. A failed session only gets its summary.
pub fn finish(
    paths: &OutputPaths,
    source_id: &str,
    result: &SessionResult,
    store: &FileCheckpointStore,
    format: ExportFormat,
    keep_checkpoint: bool,
) -> Result<RunOutcome> {
    ensure_output_dir(paths.dir())?;
    let outcome = RunOutcome::of(result.status());

    if outcome != RunOutcome::Failed {
        if format.csv() {
            let path = write_csv(paths.dir(), &paths.file("csv"), result.records())
                .context("could not write CSV export")?;
            engine_info!("Wrote {} records to {:?}", result.actual_total(), path);
        }
        if format.json() {
            let path = write_json(paths.dir(), &paths.file("json"), result.records())
                .context("could not write JSON export")?;
            engine_info!("Wrote {} records to {:?}", result.actual_total(), path);
        }
    }

    let finished = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    write_summary(
        paths.dir(),
        &paths.file("summary.json"),
        source_id,
        result,
        &finished,
    )
    .context("could not write run summary")?;

    match outcome {
        RunOutcome::Complete if !keep_checkpoint => store
            .delete(source_id)
            .context("could not remove checkpoint")?,
        RunOutcome::Complete => {}
        _ => engine_warn!(
            "Checkpoint kept at {:?}; run again to resume",
            store.path_for(source_id)
        ),
    }
    Ok(outcome)
}
