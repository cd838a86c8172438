use std::fmt;

use crate::page::PageInfo;

/// States of the page walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkPhase {
    Init,
    FetchingPage,
    Normalizing,
    Checkpointing,
    DecidingNext,
    Advancing,
    Stalled,
    Reconciling,
    Done,
    Failed,
}

impl fmt::Display for WalkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WalkPhase::Init => "init",
            WalkPhase::FetchingPage => "fetching page",
            WalkPhase::Normalizing => "normalizing",
            WalkPhase::Checkpointing => "checkpointing",
            WalkPhase::DecidingNext => "deciding next",
            WalkPhase::Advancing => "advancing",
            WalkPhase::Stalled => "stalled",
            WalkPhase::Reconciling => "reconciling",
            WalkPhase::Done => "done",
            WalkPhase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What the walker believed when it stopped walking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TentativeVerdict {
    /// The count caught up with the total, or the source ran out naturally.
    Complete,
    /// The walk gave up: stalls, cancellation, or a page limit.
    Partial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    Reconcile(TentativeVerdict),
    /// The source offers a next page.
    Advance,
    /// The source denies a next page but the count is short of the total.
    ForceAdvance,
}

/// Choose the next step after a page has been committed.
///
/// `has_next_page` is only advisory: the running count against the reported
/// total decides first.
pub fn decide_next(extracted: usize, info: &PageInfo) -> NextStep {
    match info.total_records {
        Some(total) if extracted as u64 >= total => NextStep::Reconcile(TentativeVerdict::Complete),
        _ if info.has_next_page => NextStep::Advance,
        Some(_) => NextStep::ForceAdvance,
        None => NextStep::Reconcile(TentativeVerdict::Complete),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StallAction {
    /// Fetch the same page again.
    Refetch,
    GiveUp,
}

pub fn stall_action(consecutive_stalls: u32, threshold: u32) -> StallAction {
    if consecutive_stalls > threshold {
        StallAction::GiveUp
    } else {
        StallAction::Refetch
    }
}
