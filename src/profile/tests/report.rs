use crate::monitor::{LockState, PdelayLateResponseStats, PdelayTimeoutStats};
use crate::profile::{ComplianceProfile, ComplianceReport, ComplianceVerdict, MetricsSource};
use crate::types::{ClockQualityMetrics, MeasurementMethod};

fn metrics(max: i64, min: i64, std_dev: f64, observation: u32) -> ClockQualityMetrics {
    ClockQualityMetrics {
        total_measurements: 480,
        mean_time_error_ns: (max + min) / 2,
        max_time_error_ns: max,
        min_time_error_ns: min,
        std_dev_ns: std_dev,
        observation_window_seconds: observation,
        ..ClockQualityMetrics::empty(MeasurementMethod::IngressReporting)
    }
}

fn locked(after: u32) -> LockState {
    LockState {
        consecutive_good: 100,
        streak_start_ns: None,
        locked: true,
        lock_time_seconds: Some(after),
    }
}

#[test]
fn test_verdict_pass() {
    let verdict = ComplianceVerdict::evaluate(
        &ComplianceProfile::milan(),
        &metrics(70, -75, 20.0, 60),
        &locked(3),
    );
    assert!(verdict.meets_accuracy);
    assert!(verdict.meets_lock_time);
    assert!(verdict.meets_stability);
    assert!(verdict.is_compliant());
}

#[test]
fn test_verdict_uses_profile_bound() {
    let m = metrics(90, -20, 20.0, 60);
    let milan = ComplianceVerdict::evaluate(&ComplianceProfile::milan(), &m, &locked(3));
    let base = ComplianceVerdict::evaluate(&ComplianceProfile::avnu_base(), &m, &locked(3));
    assert!(!milan.meets_accuracy);
    assert!(base.meets_accuracy);
}

#[test]
fn test_verdict_negative_extreme() {
    let m = metrics(10, -81, 20.0, 60);
    let verdict = ComplianceVerdict::evaluate(&ComplianceProfile::milan(), &m, &locked(3));
    assert!(!verdict.meets_accuracy);
}

#[test]
fn test_verdict_immediate_lock() {
    let m = metrics(10, -10, 5.0, 60);
    let automotive = ComplianceProfile::automotive();
    assert!(ComplianceVerdict::evaluate(&automotive, &m, &locked(1)).meets_lock_time);
    assert!(!ComplianceVerdict::evaluate(&automotive, &m, &locked(2)).meets_lock_time);
    assert!(!ComplianceVerdict::evaluate(&automotive, &m, &LockState::default()).meets_lock_time);
}

#[test]
fn test_verdict_stability() {
    let milan = ComplianceProfile::milan();
    assert!(!ComplianceVerdict::evaluate(&milan, &metrics(10, -10, 41.0, 60), &locked(1)).meets_stability);
    assert!(!ComplianceVerdict::evaluate(&milan, &metrics(10, -10, 5.0, 59), &locked(1)).meets_stability);
}

#[test]
fn test_verdict_empty_snapshot_fails() {
    let empty = ClockQualityMetrics::empty(MeasurementMethod::IngressReporting);
    let verdict = ComplianceVerdict::evaluate(&ComplianceProfile::standard(), &empty, &LockState::default());
    assert!(!verdict.meets_accuracy);
    assert!(!verdict.meets_stability);
    assert!(!verdict.is_compliant());
}

#[test]
fn test_report_text() {
    let profile = ComplianceProfile::milan();
    let m = metrics(70, -75, 20.0, 60);
    let lock = locked(3);
    let verdict = ComplianceVerdict::evaluate(&profile, &m, &lock);
    let report = ComplianceReport {
        profile,
        metrics: m,
        window_seconds: 60,
        lock,
        verdict,
        source: MetricsSource::Imported {
            profile_name: "Automotive".to_string(),
        },
        monitoring_enabled: false,
        ascapable: true,
        pdelay_successes: 4,
        timeouts: PdelayTimeoutStats::default(),
        late_responses: PdelayLateResponseStats::default(),
    }
    .to_string();

    assert!(report.contains("Profile: Milan (milan)"));
    assert!(report.contains("Mean Time Error: -2 ns"));
    assert!(report.contains("Lock Time: 3 s (limit 6 s)"));
    assert!(report.contains("imported snapshot (Automotive)"));
    assert!(report.contains("Monitoring: disabled"));
    assert!(report.ends_with("Overall Compliance: PASS"));
}
