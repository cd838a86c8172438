use harvester_core::{PageInfo, RawPage};

use crate::{AdvanceMode, SourceError};

/// A remote, paginated table.
///
/// Every call may fail or hang; the walker wraps each one in a timeout and a
/// bounded retry. Navigation calls return `Ok(false)` when the source refuses
/// to move, which is not an error.
#[async_trait::async_trait]
pub trait TableSource: Send {
    /// Rows currently rendered by the source.
    async fn fetch_current_page(&mut self) -> Result<RawPage, SourceError>;

    async fn page_info(&mut self) -> Result<PageInfo, SourceError>;

    /// Jump straight to a 0-based page, bypassing the next-page affordance.
    async fn go_to_page(&mut self, page_index: u32) -> Result<bool, SourceError>;

    async fn advance_to_next_page(&mut self, mode: AdvanceMode) -> Result<bool, SourceError>;
}
