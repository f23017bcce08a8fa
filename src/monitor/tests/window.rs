use super::events;
use crate::monitor::window::analyze;
use crate::types::{ClockQualityMetrics, MeasurementMethod, SyncIngressEvent};

#[test]
fn test_mean_and_std_dev() {
    let evs = events(&[10, 20, 30, 40, 50], 125);
    let stats = analyze(evs.iter());

    assert_eq!(stats.count, 5);
    assert_eq!(stats.mean_ns, 30);
    assert_eq!(stats.min_ns, 10);
    assert_eq!(stats.max_ns, 50);
    assert!((stats.std_dev_ns - 14.142).abs() < 0.01);
}

#[test]
fn test_rms() {
    let evs = events(&[3, 4, 5], 125);
    let stats = analyze(evs.iter());
    assert!((stats.rms_ns - 4.082).abs() < 0.01);
}

#[test]
fn test_identical_values_zero_std_dev() {
    let evs = events(&[42; 16], 125);
    let stats = analyze(evs.iter());
    assert_eq!(stats.mean_ns, 42);
    assert!(stats.std_dev_ns.abs() < f64::EPSILON);
    assert!(stats.slope_ppb.abs() < 1e-9);
}

#[test]
fn test_mean_truncates_toward_zero() {
    let evs = events(&[-1, -2], 125);
    let stats = analyze(evs.iter());
    assert_eq!(stats.mean_ns, -1);
}

#[test]
fn test_all_within_boundaries() {
    let evs = events(&[-80, 0, 80], 125);
    let stats = analyze(evs.iter());
    assert!(stats.all_within(80));

    let evs = events(&[-81, 0, 80], 125);
    let stats = analyze(evs.iter());
    assert!(!stats.all_within(80));
}

#[test]
fn test_empty_window() {
    let evs: Vec<SyncIngressEvent> = Vec::new();
    let stats = analyze(evs.iter());
    assert_eq!(stats.count, 0);
    assert!(!stats.all_within(80));
}

#[test]
fn test_invalid_events_excluded() {
    let mut evs = events(&[10, 20, 30], 125);
    evs.push(SyncIngressEvent::new(0, 100, 0, 3, 3));
    let stats = analyze(evs.iter());
    assert_eq!(stats.count, 3);
    assert_eq!(stats.invalid, 1);
    assert_eq!(stats.mean_ns, 20);
}

#[test]
fn test_linear_drift_slope() {
    // 1 ns per 125 ms is 8 ns/s, i.e. 8 ppb.
    let errors: Vec<i64> = (0..80).collect();
    let evs = events(&errors, 125);
    let stats = analyze(evs.iter());
    assert!((stats.slope_ppb - 8.0).abs() < 1e-6);
}

#[test]
fn test_fill_sets_baseline_flag() {
    let evs = events(&[10, -10, 70], 125);
    let stats = analyze(evs.iter());
    let mut metrics = ClockQualityMetrics::empty(MeasurementMethod::IngressReporting);
    stats.fill(&mut metrics);

    assert_eq!(metrics.total_measurements, 3);
    assert_eq!(metrics.max_time_error_ns, 70);
    assert_eq!(metrics.min_time_error_ns, -10);
    assert!(metrics.meets_80ns_requirement);
}
