/// One page of cells as the source rendered it, before any cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawPage {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawPage {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Pagination snapshot reported by the source.
///
/// Fields may contradict each other: `has_next_page` can be false while
/// `total_records` is still ahead of what has been extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PageInfo {
    pub current_page_index: u32,
    pub total_pages: u32,
    pub total_records: Option<u64>,
    pub has_next_page: bool,
}
