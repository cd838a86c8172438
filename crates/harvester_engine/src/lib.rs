//! Harvester engine: table sources, checkpoints, and the page walk.
mod checkpoint;
mod datatables;
mod events;
mod export;
mod filename;
mod persist;
mod session;
mod source;
mod types;
mod walker;

pub use checkpoint::{CheckpointError, CheckpointStore, FileCheckpointStore};
pub use datatables::{DataTablesSettings, DataTablesSource};
pub use events::{ChannelProgressSink, NoopProgressSink, ProgressSink};
pub use export::{csv_columns, records_to_csv, write_csv, write_json, write_summary, ExportError};
pub use filename::{checkpoint_filename, output_stem};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use session::ExtractionSession;
pub use source::TableSource;
pub use types::{AdvanceMode, NavigationStrategy, SourceError, SourceErrorKind, WalkEvent};
pub use walker::{PageWalker, WalkSettings};
