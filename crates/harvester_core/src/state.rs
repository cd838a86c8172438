use crate::ledger::SessionLedger;
use crate::record::Record;

/// Outcome of absorbing one page into the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageYield {
    pub admitted: usize,
    pub duplicates: usize,
}

impl PageYield {
    pub fn is_stall(&self) -> bool {
        self.admitted == 0
    }
}

/// Mutable state of one extraction session.
///
/// `accumulated` only ever grows, and every record in it has a distinct
/// row key.
#[derive(Debug, Clone, Default)]
pub struct ExtractionState {
    accumulated: Vec<Record>,
    ledger: SessionLedger,
    page_index: u32,
    consecutive_stall_count: u32,
    consecutive_failures: u32,
    resumed: usize,
}

impl ExtractionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously checkpointed records. Duplicates within the
    /// resumed list are dropped; the walk still begins at page 0.
    pub fn resumed(records: Vec<Record>) -> Self {
        let mut state = Self::new();
        for record in records {
            if state.ledger.admit(&record) {
                state.accumulated.push(record);
            }
        }
        state.resumed = state.accumulated.len();
        state
    }

    /// Admit new records and append them. A page that admits nothing counts
    /// as a stall; any progress resets the stall counter.
    pub fn absorb_page(&mut self, records: Vec<Record>) -> PageYield {
        let mut page_yield = PageYield::default();
        for record in records {
            if self.ledger.admit(&record) {
                self.accumulated.push(record);
                page_yield.admitted += 1;
            } else {
                page_yield.duplicates += 1;
            }
        }
        if page_yield.is_stall() {
            self.consecutive_stall_count += 1;
        } else {
            self.consecutive_stall_count = 0;
            self.consecutive_failures = 0;
        }
        page_yield
    }

    /// Count a fetch or navigation that failed after all its retries.
    /// Cleared by moving to a new page or by admitting new rows.
    pub fn record_failure(&mut self) -> u32 {
        self.consecutive_failures += 1;
        self.consecutive_failures
    }

    pub fn advance_page(&mut self) {
        self.page_index += 1;
        self.consecutive_failures = 0;
    }

    pub fn accumulated(&self) -> &[Record] {
        &self.accumulated
    }

    pub fn extracted(&self) -> usize {
        self.accumulated.len()
    }

    pub fn ledger(&self) -> &SessionLedger {
        &self.ledger
    }

    pub fn page_index(&self) -> u32 {
        self.page_index
    }

    pub fn consecutive_stall_count(&self) -> u32 {
        self.consecutive_stall_count
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// True while the walk is re-reading pages already covered by resumed
    /// records. Each such page holds at least one resumed row, so this ends
    /// after at most `resumed` pages.
    pub fn replaying_checkpoint(&self) -> bool {
        self.resumed > 0
            && self.accumulated.len() == self.resumed
            && (self.page_index as usize) < self.resumed
    }

    pub fn into_records(self) -> Vec<Record> {
        self.accumulated
    }
}
