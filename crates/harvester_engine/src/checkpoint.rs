use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use engine_logging::{engine_debug, engine_info};
use harvester_core::Record;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filename::checkpoint_filename;
use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("could not encode checkpoint: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("checkpoint {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("checkpoint belongs to {found:?}, not {expected:?}")]
    SourceMismatch { expected: String, found: String },
}

/// Durable snapshot of every record admitted so far, keyed by source id.
///
/// `write` replaces the whole snapshot atomically.
pub trait CheckpointStore: Send + Sync {
    fn write(&self, source_id: &str, records: &[Record]) -> Result<(), CheckpointError>;
    fn read(&self, source_id: &str) -> Result<Option<Vec<Record>>, CheckpointError>;
    fn delete(&self, source_id: &str) -> Result<(), CheckpointError>;
}

#[derive(Serialize)]
struct CheckpointDocumentRef<'a> {
    source_id: &'a str,
    record_count: usize,
    records: &'a [Record],
}

#[derive(Deserialize)]
struct CheckpointDocument {
    source_id: String,
    records: Vec<Record>,
}

/// One JSON checkpoint file per source inside a directory.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    writer: AtomicFileWriter,
}

impl FileCheckpointStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            writer: AtomicFileWriter::new(dir),
        }
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }

    pub fn path_for(&self, source_id: &str) -> PathBuf {
        self.writer.dir().join(checkpoint_filename(source_id))
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn write(&self, source_id: &str, records: &[Record]) -> Result<(), CheckpointError> {
        let document = CheckpointDocumentRef {
            source_id,
            record_count: records.len(),
            records,
        };
        let content = serde_json::to_vec(&document).map_err(CheckpointError::Encode)?;
        let path = self.writer.write(&checkpoint_filename(source_id), content)?;
        engine_debug!("Checkpointed {} records to {:?}", records.len(), path);
        Ok(())
    }

    fn read(&self, source_id: &str) -> Result<Option<Vec<Record>>, CheckpointError> {
        let path = self.path_for(source_id);
        let content = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let document: CheckpointDocument = serde_json::from_slice(&content)
            .map_err(|source| CheckpointError::Corrupt {
                path: path.clone(),
                source,
            })?;
        if document.source_id != source_id {
            return Err(CheckpointError::SourceMismatch {
                expected: source_id.to_string(),
                found: document.source_id,
            });
        }
        engine_info!(
            "Loaded checkpoint with {} records from {:?}",
            document.records.len(),
            path
        );
        Ok(Some(document.records))
    }

    fn delete(&self, source_id: &str) -> Result<(), CheckpointError> {
        if self.writer.remove(&checkpoint_filename(source_id))? {
            engine_info!("Removed checkpoint for {}", source_id);
        }
        Ok(())
    }
}
