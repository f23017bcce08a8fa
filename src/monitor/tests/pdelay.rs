use crate::monitor::pdelay::{PdelayOutcome, PdelayTracker};

const MS: u64 = 1_000_000;

#[test]
fn test_on_time_response() {
    let mut tracker = PdelayTracker::new(100, 10);
    assert_eq!(tracker.record_request(1, 1_000 * MS), 0);
    let outcome = tracker.record_response(1, 1_005 * MS);
    assert_eq!(
        outcome,
        PdelayOutcome::OnTime {
            response_time_ns: 5 * MS
        }
    );
    assert!(outcome.is_success());
}

#[test]
fn test_late_response() {
    let mut tracker = PdelayTracker::new(100, 10);
    tracker.record_request(7, 1_000 * MS);
    let outcome = tracker.record_response(7, 1_012 * MS);
    assert_eq!(
        outcome,
        PdelayOutcome::Late {
            response_time_ns: 12 * MS
        }
    );
    assert!(outcome.is_success());

    let stats = tracker.late_response_statistics();
    assert_eq!(stats.total_responses, 1);
    assert_eq!(stats.total_late_responses, 1);
    assert_eq!(stats.max_late_response_ns, 12 * MS);
    assert_eq!(stats.threshold_ms, 10);
    assert_eq!(stats.recent.len(), 1);
    assert_eq!(stats.recent[0].sequence_id, 7);
}

#[test]
fn test_timed_out_response() {
    let mut tracker = PdelayTracker::new(100, 10);
    tracker.record_request(3, 1_000 * MS);
    let outcome = tracker.record_response(3, 1_150 * MS);
    assert!(matches!(outcome, PdelayOutcome::TimedOut { .. }));
    assert!(!outcome.is_success());
    assert_eq!(tracker.timeout_statistics(1_150 * MS).total_timeouts, 1);
}

#[test]
fn test_unmatched_response() {
    let mut tracker = PdelayTracker::new(100, 10);
    assert_eq!(tracker.record_response(9, 1_000 * MS), PdelayOutcome::Unmatched);
    assert_eq!(tracker.late_response_statistics().unmatched_responses, 1);
}

#[test]
fn test_response_before_request_is_invalid() {
    let mut tracker = PdelayTracker::new(100, 10);
    tracker.record_request(1, 5_000 * MS);
    let outcome = tracker.record_response(1, 4_000 * MS);
    assert_eq!(outcome, PdelayOutcome::Invalid);
    assert!(!outcome.is_success());

    let stats = tracker.late_response_statistics();
    assert_eq!(stats.total_responses, 0);
    assert_eq!(stats.invalid_responses, 1);
    assert_eq!(stats.total_late_responses, 0);

    // The request was answered, so it is neither pending nor lost.
    let timeouts = tracker.timeout_statistics(6_000 * MS);
    assert_eq!(timeouts.pending, 0);
    assert_eq!(timeouts.total_timeouts, 0);
}

#[test]
fn test_lost_requests_expire() {
    let mut tracker = PdelayTracker::new(100, 10);
    tracker.record_request(1, 1_000 * MS);
    tracker.record_request(2, 2_000 * MS);
    // Request 1 aged out before request 2 was sent.
    let stats = tracker.timeout_statistics(2_000 * MS);
    assert_eq!(stats.total_requests, 2);
    assert_eq!(stats.total_timeouts, 1);
    assert_eq!(stats.pending, 1);

    // Request 2 is overdue by now but still pending internally.
    let stats = tracker.timeout_statistics(3_000 * MS);
    assert_eq!(stats.total_timeouts, 2);
    assert_eq!(stats.pending, 0);
    assert!((stats.timeout_ratio() - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_duplicate_sequence_counts_as_lost() {
    let mut tracker = PdelayTracker::new(100, 10);
    tracker.record_request(4, 1_000 * MS);
    assert_eq!(tracker.record_request(4, 1_010 * MS), 1);
    assert_eq!(tracker.timeout_statistics(1_010 * MS).total_timeouts, 1);
}

#[test]
fn test_recent_late_history_bounded() {
    let mut tracker = PdelayTracker::new(100, 10);
    for seq in 0..100u16 {
        let t = u64::from(seq) * 1_000 * MS;
        tracker.record_request(seq, t);
        tracker.record_response(seq, t + 20 * MS);
    }
    let stats = tracker.late_response_statistics();
    assert_eq!(stats.total_late_responses, 100);
    assert_eq!(stats.recent.len(), 32);
    assert_eq!(stats.recent.last().map(|l| l.sequence_id), Some(99));
}

#[test]
fn test_reset() {
    let mut tracker = PdelayTracker::new(100, 10);
    tracker.record_request(1, MS);
    tracker.reset();
    let stats = tracker.timeout_statistics(10_000 * MS);
    assert_eq!(stats.total_requests, 0);
    assert_eq!(stats.pending, 0);
    assert!(stats.timeout_ratio().abs() < f64::EPSILON);
}
