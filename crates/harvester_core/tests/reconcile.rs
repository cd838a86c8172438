use harvester_core::{
    reconcile, FailureReason, Record, SessionStatus, TentativeVerdict, WalkOutcome,
};

fn records(n: usize) -> Vec<Record> {
    (0..n)
        .map(|i| Record::from_pairs([("id", i.to_string())]))
        .collect()
}

fn outcome(expected: Option<u64>, tentative: TentativeVerdict, forced: bool) -> WalkOutcome {
    WalkOutcome {
        tentative,
        forced_navigation: forced,
        expected_total: expected,
        failure: None,
    }
}

#[test]
fn exact_count_is_complete() {
    let result = reconcile(records(3), &outcome(Some(3), TentativeVerdict::Complete, false));
    assert_eq!(result.status(), &SessionStatus::Complete);
    assert_eq!(result.actual_total(), 3);
    assert_eq!(result.expected_total(), Some(3));
}

#[test]
fn over_extraction_is_complete() {
    let result = reconcile(records(205), &outcome(Some(200), TentativeVerdict::Partial, true));
    assert!(result.is_complete());
}

#[test]
fn shortfall_is_partial_with_gap() {
    let result = reconcile(records(150), &outcome(Some(200), TentativeVerdict::Partial, true));
    assert_eq!(
        result.status(),
        &SessionStatus::Partial {
            outstanding: Some(50)
        }
    );
    assert_eq!(result.outstanding(), Some(50));
    assert_eq!(result.records().len(), 150);
}

#[test]
fn empty_result_against_known_total_fails() {
    let result = reconcile(Vec::new(), &outcome(Some(40), TentativeVerdict::Partial, false));
    assert_eq!(
        result.status(),
        &SessionStatus::Failed(FailureReason::NoRecords { expected: 40 })
    );
}

#[test]
fn empty_source_with_zero_total_is_complete() {
    let result = reconcile(Vec::new(), &outcome(Some(0), TentativeVerdict::Complete, false));
    assert!(result.is_complete());
}

#[test]
fn unknown_total_depends_on_natural_exhaustion() {
    let natural = reconcile(records(7), &outcome(None, TentativeVerdict::Complete, false));
    assert!(natural.is_complete());

    let forced = reconcile(records(7), &outcome(None, TentativeVerdict::Complete, true));
    assert_eq!(forced.status(), &SessionStatus::Partial { outstanding: None });

    let stalled = reconcile(records(7), &outcome(None, TentativeVerdict::Partial, false));
    assert_eq!(stalled.status(), &SessionStatus::Partial { outstanding: None });
}

#[test]
fn walk_failure_keeps_records() {
    let mut walk = outcome(Some(10), TentativeVerdict::Partial, false);
    walk.failure = Some(FailureReason::Structural("table missing".into()));

    let result = reconcile(records(4), &walk);
    assert!(matches!(result.status(), SessionStatus::Failed(FailureReason::Structural(_))));
    assert_eq!(result.actual_total(), 4);
}
