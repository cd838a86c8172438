use std::io::Write;

use harvester_engine::{ProgressSink, WalkEvent};

/// Prints one line per committed page on stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutProgressSink;

impl ProgressSink for StdoutProgressSink {
    fn emit(&self, event: WalkEvent) {
        if let Some(line) = progress_line(&event) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{line}");
            let _ = out.flush();
        }
    }
}

pub fn progress_line(event: &WalkEvent) -> Option<String> {
    match event {
        WalkEvent::PageCommitted {
            page_index,
            admitted,
            duplicates,
            extracted,
            expected_total,
        } => {
            let of = expected_total
                .map(|total| format!("/{total}"))
                .unwrap_or_default();
            Some(format!(
                "page {}: +{} new, {} duplicate, {}{} records",
                page_index + 1,
                admitted,
                duplicates,
                extracted,
                of
            ))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harvester_engine::NavigationStrategy;

    #[test]
    fn committed_page_is_one_line() {
        let line = progress_line(&WalkEvent::PageCommitted {
            page_index: 2,
            admitted: 48,
            duplicates: 2,
            extracted: 148,
            expected_total: Some(200),
        });
        assert_eq!(
            line.as_deref(),
            Some("page 3: +48 new, 2 duplicate, 148/200 records")
        );
    }

    #[test]
    fn unknown_total_is_left_out() {
        let line = progress_line(&WalkEvent::PageCommitted {
            page_index: 0,
            admitted: 10,
            duplicates: 0,
            extracted: 10,
            expected_total: None,
        });
        assert_eq!(line.as_deref(), Some("page 1: +10 new, 0 duplicate, 10 records"));
    }

    #[test]
    fn other_events_print_nothing() {
        let event = WalkEvent::Fallback {
            page_index: 3,
            strategy: NavigationStrategy::ForcedNext,
        };
        assert!(progress_line(&event).is_none());
    }
}
