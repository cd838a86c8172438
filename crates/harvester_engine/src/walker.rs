use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_trace, engine_warn};
use harvester_core::{
    decide_next, normalize_page, stall_action, ExtractionState, FailureReason, NextStep, PageInfo,
    RawPage, Record, StallAction, TentativeVerdict, WalkOutcome, WalkPhase,
};
use tokio_util::sync::CancellationToken;

use crate::checkpoint::CheckpointStore;
use crate::events::ProgressSink;
use crate::source::TableSource;
use crate::{AdvanceMode, NavigationStrategy, SourceError, SourceErrorKind, WalkEvent};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkSettings {
    pub call_timeout: Duration,
    /// Pause after a successful navigation so the source can re-render.
    pub settle_delay: Duration,
    pub retry_delay: Duration,
    pub max_attempts: u32,
    pub stall_threshold: u32,
    pub page_limit: Option<u32>,
}

impl Default for WalkSettings {
    fn default() -> Self {
        Self {
            call_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(3),
            retry_delay: Duration::from_secs(1),
            max_attempts: 3,
            stall_threshold: 3,
            page_limit: None,
        }
    }
}

// Structural errors are returned without retrying.
macro_rules! with_retry {
    ($walker:ident, $operation:expr, $call:expr) => {{
        let mut attempt: u32 = 1;
        loop {
            let outcome = match tokio::time::timeout($walker.settings.call_timeout, $call).await {
                Ok(result) => result,
                Err(_) => Err(SourceError::new(
                    SourceErrorKind::Timeout,
                    format!(
                        "{} did not settle within {:?}",
                        $operation, $walker.settings.call_timeout
                    ),
                )),
            };
            match outcome {
                Ok(value) => break Ok(value),
                Err(err) if err.is_structural() || attempt >= $walker.settings.max_attempts => {
                    break Err(err)
                }
                Err(err) => {
                    engine_debug!("{} attempt {} failed: {}", $operation, attempt, err);
                    $walker.sink.emit(WalkEvent::Retrying {
                        operation: $operation,
                        attempt,
                        error: err,
                    });
                    tokio::time::sleep($walker.settings.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }};
}

enum Step {
    Fetch,
    Commit {
        page: RawPage,
        info: Option<PageInfo>,
    },
    Decide(PageInfo),
    Advance { offered: bool },
    Stalled,
    Reconcile(TentativeVerdict),
    Fail(FailureReason),
}

impl Step {
    fn phase(&self) -> WalkPhase {
        match self {
            Step::Fetch => WalkPhase::FetchingPage,
            Step::Commit { .. } => WalkPhase::Normalizing,
            Step::Decide(_) => WalkPhase::DecidingNext,
            Step::Advance { .. } => WalkPhase::Advancing,
            Step::Stalled => WalkPhase::Stalled,
            Step::Reconcile(_) => WalkPhase::Reconciling,
            Step::Fail(_) => WalkPhase::Failed,
        }
    }
}

/// Page-by-page state machine over one source. Admitted records are
/// returned on every exit path.
pub struct PageWalker<'a, S: TableSource + ?Sized> {
    source_id: &'a str,
    source: &'a mut S,
    store: &'a dyn CheckpointStore,
    sink: &'a dyn ProgressSink,
    settings: &'a WalkSettings,
    cancel: CancellationToken,
    state: ExtractionState,
    last_info: Option<PageInfo>,
    first_total: Option<u64>,
    forced_navigation: bool,
    pages_committed: u32,
}

impl<'a, S: TableSource + ?Sized> PageWalker<'a, S> {
    pub fn new(
        source_id: &'a str,
        source: &'a mut S,
        store: &'a dyn CheckpointStore,
        sink: &'a dyn ProgressSink,
        settings: &'a WalkSettings,
        state: ExtractionState,
    ) -> Self {
        Self {
            source_id,
            source,
            store,
            sink,
            settings,
            cancel: CancellationToken::new(),
            state,
            last_info: None,
            first_total: None,
            forced_navigation: false,
            pages_committed: 0,
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub async fn walk(mut self) -> (Vec<Record>, WalkOutcome) {
        engine_trace!("walk phase: {}", WalkPhase::Init);
        let mut step = Step::Fetch;
        loop {
            engine_trace!("walk phase: {}", step.phase());
            step = match step {
                Step::Fetch => self.fetch().await,
                Step::Commit { page, info } => self.commit(page, info).await,
                Step::Decide(info) => self.decide(info),
                Step::Advance { offered } => self.advance(offered).await,
                Step::Stalled => self.stalled().await,
                Step::Reconcile(verdict) => return self.finish(verdict, None),
                Step::Fail(reason) => return self.finish(TentativeVerdict::Partial, Some(reason)),
            };
        }
    }

    fn interrupted(&self) -> Option<Step> {
        if self.cancel.is_cancelled() {
            engine_info!("Walk cancelled after page {}", self.state.page_index());
            return Some(Step::Reconcile(TentativeVerdict::Partial));
        }
        match self.settings.page_limit {
            Some(limit) if self.pages_committed >= limit => {
                engine_warn!("Page limit of {} reached", limit);
                Some(Step::Reconcile(TentativeVerdict::Partial))
            }
            _ => None,
        }
    }

    async fn fetch(&mut self) -> Step {
        if let Some(step) = self.interrupted() {
            return step;
        }

        let page = match with_retry!(self, "fetch page", self.source.fetch_current_page()) {
            Ok(page) => page,
            Err(err) if err.is_structural() => {
                return Step::Fail(FailureReason::Structural(err.message));
            }
            Err(err) => {
                engine_warn!(
                    "Could not fetch page {}: {}",
                    self.state.page_index() + 1,
                    err
                );
                self.state.record_failure();
                return Step::Stalled;
            }
        };

        let info = match with_retry!(self, "read page info", self.source.page_info()) {
            Ok(info) => {
                self.observe_info(info);
                Some(info)
            }
            Err(err) if err.is_structural() => {
                return Step::Fail(FailureReason::Structural(err.message));
            }
            Err(err) => {
                engine_warn!("Page info unavailable, using last known: {}", err);
                self.last_info
            }
        };

        Step::Commit { page, info }
    }

    fn observe_info(&mut self, info: PageInfo) {
        if let Some(total) = info.total_records {
            match self.first_total {
                None => {
                    engine_info!(
                        "Source reports {} records over {} pages",
                        total,
                        info.total_pages
                    );
                    self.first_total = Some(total);
                }
                Some(first) if first != total => {
                    engine_warn!("Source total changed mid-walk: {} -> {}", first, total);
                }
                Some(_) => {}
            }
        }
        self.last_info = Some(info);
    }

    async fn commit(&mut self, page: RawPage, info: Option<PageInfo>) -> Step {
        let page_index = self.state.page_index();
        if page.is_empty() && page_index > 0 {
            engine_debug!("Page {} rendered no rows", page_index + 1);
        }

        let page_yield = self.state.absorb_page(normalize_page(&page));

        if let Err(reason) = self.checkpoint().await {
            return Step::Fail(reason);
        }
        self.pages_committed += 1;

        let expected_total = info.and_then(|i| i.total_records);
        engine_info!(
            "Page {}: {} new, {} duplicate, {} total{}",
            page_index + 1,
            page_yield.admitted,
            page_yield.duplicates,
            self.state.extracted(),
            expected_total
                .map(|t| format!(" of {t}"))
                .unwrap_or_default()
        );
        self.sink.emit(WalkEvent::PageCommitted {
            page_index,
            admitted: page_yield.admitted,
            duplicates: page_yield.duplicates,
            extracted: self.state.extracted(),
            expected_total,
        });

        match info {
            Some(info) => Step::Decide(info),
            None => {
                self.state.record_failure();
                Step::Stalled
            }
        }
    }

    async fn checkpoint(&mut self) -> Result<(), FailureReason> {
        engine_trace!("walk phase: {}", WalkPhase::Checkpointing);
        let mut attempt: u32 = 1;
        loop {
            match self.store.write(self.source_id, self.state.accumulated()) {
                Ok(()) => return Ok(()),
                Err(err) if attempt >= self.settings.max_attempts => {
                    engine_warn!("Giving up on checkpoint after {} attempts: {}", attempt, err);
                    return Err(FailureReason::Checkpoint(err.to_string()));
                }
                Err(err) => {
                    engine_warn!("Checkpoint attempt {} failed: {}", attempt, err);
                    tokio::time::sleep(self.settings.retry_delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn decide(&mut self, info: PageInfo) -> Step {
        let extracted = self.state.extracted();
        let next = decide_next(extracted, &info);
        if let NextStep::Reconcile(verdict) = next {
            return Step::Reconcile(verdict);
        }

        // A source that keeps moving but never yields anything new is stuck,
        // unless it is still walking pages a resumed checkpoint covers.
        let stalls = self.state.consecutive_stall_count();
        if !self.state.replaying_checkpoint()
            && stall_action(stalls, self.settings.stall_threshold) == StallAction::GiveUp
        {
            engine_warn!("{} consecutive pages without new rows, giving up", stalls);
            return Step::Reconcile(TentativeVerdict::Partial);
        }

        match next {
            NextStep::Advance => Step::Advance { offered: true },
            _ => {
                engine_warn!(
                    "Source reports no next page but {} of {} records remain",
                    info.total_records
                        .map(|t| t.saturating_sub(extracted as u64))
                        .unwrap_or_default(),
                    info.total_records.unwrap_or_default()
                );
                Step::Advance { offered: false }
            }
        }
    }

    async fn advance(&mut self, offered: bool) -> Step {
        if let Some(step) = self.interrupted() {
            return step;
        }

        let target = self.state.page_index() + 1;
        let strategies: &[NavigationStrategy] = if offered {
            &[
                NavigationStrategy::Next,
                NavigationStrategy::ForcedNext,
                NavigationStrategy::JumpToPage,
            ]
        } else {
            &[NavigationStrategy::ForcedNext, NavigationStrategy::JumpToPage]
        };

        for &strategy in strategies {
            let moved = match strategy {
                NavigationStrategy::Next => with_retry!(
                    self,
                    "advance to next page",
                    self.source.advance_to_next_page(AdvanceMode::Normal)
                ),
                NavigationStrategy::ForcedNext => with_retry!(
                    self,
                    "force next page",
                    self.source.advance_to_next_page(AdvanceMode::Forced)
                ),
                NavigationStrategy::JumpToPage => with_retry!(
                    self,
                    "jump to page",
                    self.source.go_to_page(target)
                ),
            };

            match moved {
                Ok(true) => {
                    tokio::time::sleep(self.settings.settle_delay).await;
                    match self.landed_on(target).await {
                        Ok(true) => {}
                        Ok(false) => continue,
                        Err(reason) => return Step::Fail(reason),
                    }
                    if strategy != NavigationStrategy::Next {
                        engine_info!("Reached page {} via {}", target + 1, strategy);
                        self.forced_navigation = true;
                        self.sink.emit(WalkEvent::Fallback {
                            page_index: target,
                            strategy,
                        });
                    }
                    self.state.advance_page();
                    return Step::Fetch;
                }
                Ok(false) => {
                    engine_debug!("Source refused {} to page {}", strategy, target + 1);
                }
                Err(err) if err.is_structural() => {
                    return Step::Fail(FailureReason::Structural(err.message));
                }
                Err(err) => {
                    engine_warn!("{} to page {} failed: {}", strategy, target + 1, err);
                }
            }
        }

        engine_warn!("Every navigation strategy failed at page {}", target);
        self.state.record_failure();
        Step::Stalled
    }

    /// A navigation call can report success without the source moving, as
    /// with a click on a disabled button.
    async fn landed_on(&mut self, target: u32) -> Result<bool, FailureReason> {
        match with_retry!(self, "read page info", self.source.page_info()) {
            Ok(info) if info.current_page_index == target => {
                self.observe_info(info);
                Ok(true)
            }
            Ok(info) => {
                engine_warn!(
                    "Navigation reported success but the source is on page {}, not {}",
                    info.current_page_index + 1,
                    target + 1
                );
                Ok(false)
            }
            Err(err) if err.is_structural() => Err(FailureReason::Structural(err.message)),
            Err(err) => {
                engine_warn!(
                    "Could not confirm page {}, assuming it loaded: {}",
                    target + 1,
                    err
                );
                Ok(true)
            }
        }
    }

    async fn stalled(&mut self) -> Step {
        let failures = self.state.consecutive_failures();
        // Pages a resumed checkpoint already covers yield nothing new; only
        // failures count against them.
        let empty_pages = if self.state.replaying_checkpoint() {
            0
        } else {
            self.state.consecutive_stall_count()
        };
        let consecutive = failures.max(empty_pages);
        let page_index = self.state.page_index();
        self.sink.emit(WalkEvent::Stalled {
            page_index,
            consecutive,
        });

        match stall_action(consecutive, self.settings.stall_threshold) {
            StallAction::GiveUp => {
                engine_warn!(
                    "Stalled on page {} {} times, giving up",
                    page_index + 1,
                    consecutive
                );
                Step::Reconcile(TentativeVerdict::Partial)
            }
            StallAction::Refetch => {
                engine_info!("Stalled on page {}, fetching it again", page_index + 1);
                tokio::time::sleep(self.settings.settle_delay).await;
                Step::Fetch
            }
        }
    }

    fn finish(
        self,
        tentative: TentativeVerdict,
        failure: Option<FailureReason>,
    ) -> (Vec<Record>, WalkOutcome) {
        let outcome = WalkOutcome {
            tentative,
            forced_navigation: self.forced_navigation,
            expected_total: self.last_info.and_then(|info| info.total_records),
            failure,
        };
        let end = if outcome.failure.is_some() {
            WalkPhase::Failed
        } else {
            WalkPhase::Done
        };
        engine_trace!("walk phase: {}", end);
        engine_debug!(
            "Walk ended after {} pages: {:?}",
            self.pages_committed,
            outcome
        );
        (self.state.into_records(), outcome)
    }
}
