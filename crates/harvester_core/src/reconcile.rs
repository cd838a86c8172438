use std::fmt;

use crate::decide::TentativeVerdict;
use crate::record::Record;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    NoRecords { expected: u64 },
    Structural(String),
    Checkpoint(String),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoRecords { expected } => {
                write!(f, "no records extracted, source reports {expected}")
            }
            FailureReason::Structural(message) => write!(f, "structural error: {message}"),
            FailureReason::Checkpoint(message) => write!(f, "checkpoint error: {message}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Complete,
    /// `outstanding` is `expected - actual` when the total is known.
    Partial { outstanding: Option<u64> },
    Failed(FailureReason),
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Complete => write!(f, "complete"),
            SessionStatus::Partial {
                outstanding: Some(n),
            } => write!(f, "partial ({n} outstanding)"),
            SessionStatus::Partial { outstanding: None } => write!(f, "partial"),
            SessionStatus::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkOutcome {
    pub tentative: TentativeVerdict,
    /// A fallback strategy had to be used at least once.
    pub forced_navigation: bool,
    /// Last total the source reported, if it ever reported one.
    pub expected_total: Option<u64>,
    pub failure: Option<FailureReason>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionResult {
    records: Vec<Record>,
    expected_total: Option<u64>,
    status: SessionStatus,
}

impl SessionResult {
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn expected_total(&self) -> Option<u64> {
        self.expected_total
    }

    pub fn actual_total(&self) -> u64 {
        self.records.len() as u64
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == SessionStatus::Complete
    }

    pub fn outstanding(&self) -> Option<u64> {
        match self.status {
            SessionStatus::Partial { outstanding } => outstanding,
            _ => None,
        }
    }
}

/// Over-extraction is accepted as complete.
pub fn reconcile(records: Vec<Record>, outcome: &WalkOutcome) -> SessionResult {
    let actual = records.len() as u64;
    let expected = outcome.expected_total;

    let status = match (&outcome.failure, expected) {
        (Some(reason), _) => SessionStatus::Failed(reason.clone()),
        (None, Some(expected)) if actual == 0 && expected > 0 => {
            SessionStatus::Failed(FailureReason::NoRecords { expected })
        }
        (None, Some(expected)) if actual >= expected => SessionStatus::Complete,
        (None, Some(expected)) => SessionStatus::Partial {
            outstanding: Some(expected - actual),
        },
        (None, None) => {
            if outcome.tentative == TentativeVerdict::Complete && !outcome.forced_navigation {
                SessionStatus::Complete
            } else {
                SessionStatus::Partial { outstanding: None }
            }
        }
    };

    SessionResult {
        records,
        expected_total: expected,
        status,
    }
}
