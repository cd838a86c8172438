#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{mpsc, Mutex};
use std::time::Duration;

use harvester_core::{PageInfo, RawPage, Record, RowKey};
use harvester_engine::{
    AdvanceMode, ChannelProgressSink, CheckpointError, CheckpointStore, PersistError, SourceError,
    SourceErrorKind, TableSource, WalkEvent, WalkSettings,
};

pub fn init_logging() {
    engine_logging::initialize_for_tests();
}

/// Settings with no waiting, so scripted walks finish instantly.
pub fn fast_settings() -> WalkSettings {
    WalkSettings {
        call_timeout: Duration::from_secs(2),
        settle_delay: Duration::ZERO,
        retry_delay: Duration::ZERO,
        max_attempts: 3,
        stall_threshold: 2,
        page_limit: None,
    }
}

pub fn entry(i: usize) -> Vec<Option<String>> {
    vec![Some(format!("word {i}")), Some(format!("ಪದ {i}"))]
}

pub fn named(word: &str) -> Vec<Option<String>> {
    vec![Some(word.to_string()), Some(format!("{word} meaning"))]
}

pub fn keys(records: &[Record]) -> Vec<RowKey> {
    records.iter().map(Record::row_key).collect()
}

/// In-memory table whose pagination signals can be made to lie.
pub struct ScriptedSource {
    pages: Vec<Vec<Vec<Option<String>>>>,
    total_records: Option<u64>,
    page_index: u32,
    /// `has_next_page` is reported only below this page index.
    claims_next_below: Option<u32>,
    pub forced_advance_works: bool,
    /// Forced advance reports success without moving.
    pub forced_advance_inert: bool,
    pub jump_works: bool,
    pub fetch_failures: VecDeque<SourceError>,
    /// Transient fetch failures still owed by a page.
    pub page_fetch_failures: HashMap<u32, u32>,
    /// Errors handed out by navigation calls before they behave.
    pub nav_failures: VecDeque<SourceError>,
    /// From this page on, the source reports a different total.
    pub total_from_page: Option<(u32, u64)>,
    pub slow_fetches: VecDeque<Duration>,
    /// Fetches at or past this page fail structurally.
    pub structural_from_page: Option<u32>,
    pub fetches: u32,
}

impl ScriptedSource {
    pub fn paged(pages: Vec<Vec<Vec<Option<String>>>>, total_records: Option<u64>) -> Self {
        Self {
            pages,
            total_records,
            page_index: 0,
            claims_next_below: None,
            forced_advance_works: true,
            forced_advance_inert: false,
            jump_works: true,
            fetch_failures: VecDeque::new(),
            page_fetch_failures: HashMap::new(),
            nav_failures: VecDeque::new(),
            total_from_page: None,
            slow_fetches: VecDeque::new(),
            structural_from_page: None,
            fetches: 0,
        }
    }

    /// `rows` distinct entries split into pages of `page_size`.
    pub fn uniform(rows: usize, page_size: usize, total_records: Option<u64>) -> Self {
        let all: Vec<_> = (0..rows).map(entry).collect();
        let pages = all.chunks(page_size).map(|c| c.to_vec()).collect();
        Self::paged(pages, total_records)
    }

    pub fn claiming_next_below(mut self, page_index: u32) -> Self {
        self.claims_next_below = Some(page_index);
        self
    }

    pub fn without_fallbacks(mut self) -> Self {
        self.forced_advance_works = false;
        self.jump_works = false;
        self
    }

    pub fn rewind(&mut self) {
        self.page_index = 0;
    }

    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn has_next(&self) -> bool {
        let truthful = self.page_index + 1 < self.page_count();
        match self.claims_next_below {
            Some(limit) => truthful && self.page_index < limit,
            None => truthful,
        }
    }
}

#[async_trait::async_trait]
impl TableSource for ScriptedSource {
    async fn fetch_current_page(&mut self) -> Result<RawPage, SourceError> {
        self.fetches += 1;
        if let Some(delay) = self.slow_fetches.pop_front() {
            tokio::time::sleep(delay).await;
        }
        if self
            .structural_from_page
            .is_some_and(|page| self.page_index >= page)
        {
            return Err(SourceError::structural("table #myTable10 not found"));
        }
        if let Some(err) = self.fetch_failures.pop_front() {
            return Err(err);
        }
        if let Some(left) = self.page_fetch_failures.get_mut(&self.page_index) {
            if *left > 0 {
                *left -= 1;
                return Err(SourceError::new(SourceErrorKind::Network, "connection reset"));
            }
        }
        let rows = self
            .pages
            .get(self.page_index as usize)
            .cloned()
            .unwrap_or_default();
        Ok(RawPage::new(
            vec!["English".to_string(), "Kannada".to_string()],
            rows,
        ))
    }

    async fn page_info(&mut self) -> Result<PageInfo, SourceError> {
        Ok(PageInfo {
            current_page_index: self.page_index,
            total_pages: self.page_count(),
            total_records: match self.total_from_page {
                Some((from, total)) if self.page_index >= from => Some(total),
                _ => self.total_records,
            },
            has_next_page: self.has_next(),
        })
    }

    async fn go_to_page(&mut self, page_index: u32) -> Result<bool, SourceError> {
        if let Some(err) = self.nav_failures.pop_front() {
            return Err(err);
        }
        if !self.jump_works || page_index >= self.page_count() {
            return Ok(false);
        }
        self.page_index = page_index;
        Ok(true)
    }

    async fn advance_to_next_page(&mut self, mode: AdvanceMode) -> Result<bool, SourceError> {
        if let Some(err) = self.nav_failures.pop_front() {
            return Err(err);
        }
        let allowed = match mode {
            AdvanceMode::Normal => self.has_next(),
            AdvanceMode::Forced => self.forced_advance_works,
        };
        if mode == AdvanceMode::Forced && allowed && self.forced_advance_inert {
            return Ok(true);
        }
        if allowed {
            self.page_index += 1;
        }
        Ok(allowed)
    }
}

/// Checkpoint store that keeps every snapshot it was handed.
#[derive(Default)]
pub struct RecordingStore {
    current: Mutex<HashMap<String, Vec<Record>>>,
    snapshots: Mutex<Vec<Vec<Record>>>,
    failing_writes: AtomicU32,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(writes: u32) -> Self {
        let store = Self::default();
        store.failing_writes.store(writes, Ordering::SeqCst);
        store
    }

    pub fn snapshots(&self) -> Vec<Vec<Record>> {
        self.snapshots.lock().unwrap().clone()
    }
}

impl CheckpointStore for RecordingStore {
    fn write(&self, source_id: &str, records: &[Record]) -> Result<(), CheckpointError> {
        let remaining = self.failing_writes.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_writes.store(remaining - 1, Ordering::SeqCst);
            return Err(PersistError::OutputDir("disk full".into()).into());
        }
        self.snapshots.lock().unwrap().push(records.to_vec());
        self.current
            .lock()
            .unwrap()
            .insert(source_id.to_string(), records.to_vec());
        Ok(())
    }

    fn read(&self, source_id: &str) -> Result<Option<Vec<Record>>, CheckpointError> {
        Ok(self.current.lock().unwrap().get(source_id).cloned())
    }

    fn delete(&self, source_id: &str) -> Result<(), CheckpointError> {
        self.current.lock().unwrap().remove(source_id);
        Ok(())
    }
}

pub struct EventLog {
    rx: mpsc::Receiver<WalkEvent>,
}

pub fn event_sink() -> (ChannelProgressSink, EventLog) {
    let (tx, rx) = mpsc::channel();
    (ChannelProgressSink::new(tx), EventLog { rx })
}

impl EventLog {
    pub fn drain(&self) -> Vec<WalkEvent> {
        self.rx.try_iter().collect()
    }
}
