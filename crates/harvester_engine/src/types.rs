use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct SourceError {
    pub kind: SourceErrorKind,
    pub message: String,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Structural, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    /// Structural errors mean the table is not there at all; retrying is
    /// pointless.
    pub fn is_structural(&self) -> bool {
        self.kind == SourceErrorKind::Structural
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceErrorKind {
    Timeout,
    Network,
    HttpStatus(u16),
    Decode,
    /// The source answered but could not serve the request right now.
    Unavailable,
    Structural,
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceErrorKind::Timeout => write!(f, "timeout"),
            SourceErrorKind::Network => write!(f, "network error"),
            SourceErrorKind::HttpStatus(code) => write!(f, "http status {code}"),
            SourceErrorKind::Decode => write!(f, "decode error"),
            SourceErrorKind::Unavailable => write!(f, "source unavailable"),
            SourceErrorKind::Structural => write!(f, "structural error"),
        }
    }
}

/// How hard to push when asking the source for its next page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceMode {
    /// Use the next-page affordance only if the source offers it.
    Normal,
    /// Issue the advance even though the source marks it unavailable.
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationStrategy {
    Next,
    ForcedNext,
    JumpToPage,
}

impl fmt::Display for NavigationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationStrategy::Next => write!(f, "next page"),
            NavigationStrategy::ForcedNext => write!(f, "forced next page"),
            NavigationStrategy::JumpToPage => write!(f, "jump to page"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkEvent {
    /// A page was normalized and the checkpoint now includes it.
    PageCommitted {
        page_index: u32,
        admitted: usize,
        duplicates: usize,
        extracted: usize,
        expected_total: Option<u64>,
    },
    /// A fallback strategy moved the source forward.
    Fallback {
        page_index: u32,
        strategy: NavigationStrategy,
    },
    Retrying {
        operation: &'static str,
        attempt: u32,
        error: SourceError,
    },
    Stalled {
        page_index: u32,
        consecutive: u32,
    },
}
