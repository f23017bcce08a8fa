use crate::monitor::ascapable::{AsCapablePolicy, AsCapableTracker, evaluate_ascapable_threshold};

#[test]
fn test_strict_threshold() {
    assert!(!evaluate_ascapable_threshold(
        AsCapablePolicy::Strict,
        true,
        900_000,
        800_000
    ));
    assert!(evaluate_ascapable_threshold(
        AsCapablePolicy::Strict,
        true,
        800_000,
        800_000
    ));
    assert!(!evaluate_ascapable_threshold(
        AsCapablePolicy::Strict,
        false,
        100,
        800_000
    ));
}

#[test]
fn test_flexible_threshold_preserves_state() {
    assert!(evaluate_ascapable_threshold(
        AsCapablePolicy::Flexible,
        true,
        900_000,
        800_000
    ));
    assert!(!evaluate_ascapable_threshold(
        AsCapablePolicy::Flexible,
        false,
        900_000,
        800_000
    ));
}

#[test]
fn test_negative_delay_uses_magnitude() {
    assert!(!evaluate_ascapable_threshold(
        AsCapablePolicy::Strict,
        true,
        -900_000,
        800_000
    ));
}

#[test]
fn test_tracker_requires_successes() {
    let mut tracker = AsCapableTracker::new(AsCapablePolicy::Strict, 800_000, 2);
    assert!(!tracker.is_ascapable());
    tracker.record_success();
    assert!(!tracker.is_ascapable());
    tracker.record_success();
    assert!(tracker.is_ascapable());

    tracker.record_loss();
    assert!(!tracker.is_ascapable());
    assert_eq!(tracker.successes(), 0);
}

#[test]
fn test_tracker_immediate() {
    let tracker = AsCapableTracker::new(AsCapablePolicy::Strict, 800_000, 0);
    assert!(tracker.is_ascapable());
}

#[test]
fn test_tracker_delay_excursion_strict() {
    let mut tracker = AsCapableTracker::new(AsCapablePolicy::Strict, 800_000, 1);
    tracker.record_success();
    assert!(tracker.record_neighbor_prop_delay(500));
    assert!(!tracker.record_neighbor_prop_delay(900_000));
    // Recovers once the delay is back under threshold.
    assert!(tracker.record_neighbor_prop_delay(600));
    assert_eq!(tracker.last_neighbor_prop_delay(), Some(600));
}

#[test]
fn test_tracker_delay_excursion_flexible() {
    let mut tracker = AsCapableTracker::new(AsCapablePolicy::Flexible, 800_000, 1);
    tracker.record_success();
    assert!(tracker.record_neighbor_prop_delay(900_000));
    assert_eq!(tracker.policy(), AsCapablePolicy::Flexible);
}

#[test]
fn test_tracker_mean_delay() {
    let mut tracker = AsCapableTracker::new(AsCapablePolicy::Strict, 800_000, 0);
    assert_eq!(tracker.mean_neighbor_prop_delay(), None);
    tracker.record_neighbor_prop_delay(100);
    tracker.record_neighbor_prop_delay(300);
    assert_eq!(tracker.mean_neighbor_prop_delay(), Some(200.0));

    tracker.reset();
    assert_eq!(tracker.last_neighbor_prop_delay(), None);
}
