use engine_logging::{engine_info, engine_warn};
use harvester_core::{reconcile, ExtractionState, Record, SessionResult, SessionStatus};
use tokio_util::sync::CancellationToken;

use crate::checkpoint::CheckpointStore;
use crate::events::ProgressSink;
use crate::source::TableSource;
use crate::walker::{PageWalker, WalkSettings};

/// Composition root for harvesting one source.
///
/// Each run owns its own ledger and state; nothing is shared between
/// sessions, so independent sources can run in separate tasks or processes.
pub struct ExtractionSession<'a> {
    source_id: String,
    store: &'a dyn CheckpointStore,
    sink: &'a dyn ProgressSink,
    settings: WalkSettings,
    cancel: CancellationToken,
}

impl<'a> ExtractionSession<'a> {
    pub fn new(
        source_id: impl Into<String>,
        store: &'a dyn CheckpointStore,
        sink: &'a dyn ProgressSink,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            store,
            sink,
            settings: WalkSettings::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_settings(mut self, settings: WalkSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Token checked between pages; cancelling it ends the walk with what
    /// has been committed so far.
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    /// Harvest the source, starting from page 0.
    ///
    /// `resume_from` (normally read back from the checkpoint store) seeds the
    /// ledger so pages already captured are walked again as no-ops.
    pub async fn run<S: TableSource + ?Sized>(
        &self,
        source: &mut S,
        resume_from: Option<Vec<Record>>,
    ) -> SessionResult {
        let _label = SessionLabel::set(&self.source_id);

        let state = match resume_from {
            Some(records) => {
                let offered = records.len();
                let state = ExtractionState::resumed(records);
                engine_info!(
                    "Resuming with {} records ({} duplicates dropped)",
                    state.extracted(),
                    offered - state.extracted()
                );
                state
            }
            None => ExtractionState::new(),
        };

        let walker = PageWalker::new(
            &self.source_id,
            source,
            self.store,
            self.sink,
            &self.settings,
            state,
        )
        .with_cancellation(self.cancel.clone());
        let (records, outcome) = walker.walk().await;
        let result = reconcile(records, &outcome);

        match result.status() {
            SessionStatus::Complete => engine_info!(
                "Complete: {} records (expected {})",
                result.actual_total(),
                describe_total(result.expected_total())
            ),
            status => engine_warn!(
                "Ended {}: {} records (expected {})",
                status,
                result.actual_total(),
                describe_total(result.expected_total())
            ),
        }
        result
    }
}

fn describe_total(total: Option<u64>) -> String {
    total.map_or_else(|| "unknown".to_string(), |t| t.to_string())
}

/// Keeps the log label set for the lifetime of a run.
struct SessionLabel;

impl SessionLabel {
    fn set(source_id: &str) -> Self {
        engine_logging::set_session_label(source_id);
        Self
    }
}

impl Drop for SessionLabel {
    fn drop(&mut self) {
        engine_logging::clear_session_label();
    }
}
