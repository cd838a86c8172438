//! Harvester core: pure record model, dedup ledger, and walk decisions.
mod decide;
mod ledger;
mod normalize;
mod page;
mod reconcile;
mod record;
mod row_key;
mod state;

pub use decide::{decide_next, stall_action, NextStep, StallAction, TentativeVerdict, WalkPhase};
pub use ledger::SessionLedger;
pub use normalize::{normalize_cell, normalize_page};
pub use page::{PageInfo, RawPage};
pub use reconcile::{reconcile, FailureReason, SessionResult, SessionStatus, WalkOutcome};
pub use record::Record;
pub use row_key::{RowKey, ROW_KEY_DELIMITER, ROW_KEY_FIELDS, ROW_KEY_PREFIX_CHARS};
pub use state::{ExtractionState, PageYield};
