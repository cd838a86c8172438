use std::collections::HashSet;

use crate::record::Record;
use crate::row_key::RowKey;

/// Row keys seen during the current session.
#[derive(Debug, Clone, Default)]
pub struct SessionLedger {
    seen: HashSet<RowKey>,
}

impl SessionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the key and returns true if it was new; false means the
    /// caller must discard the record.
    pub fn admit(&mut self, record: &Record) -> bool {
        self.seen.insert(record.row_key())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
