use crate::types::metrics::{ClockQualityMetrics, MeasurementMethod};

#[test]
fn test_method_string_roundtrip() {
    for method in MeasurementMethod::ALL {
        let parsed: MeasurementMethod = method.to_string().parse().unwrap();
        assert_eq!(parsed, method);
        assert_eq!(MeasurementMethod::from_byte(method as u8), Some(method));
    }
}

#[test]
fn test_method_parse_is_lenient_about_case_and_dashes() {
    assert_eq!(
        "Reverse-Sync".parse::<MeasurementMethod>().unwrap(),
        MeasurementMethod::ReverseSync
    );
    assert_eq!(
        " PPS_HARDWARE ".parse::<MeasurementMethod>().unwrap(),
        MeasurementMethod::PpsHardware
    );
    assert!("gps".parse::<MeasurementMethod>().is_err());
}

#[test]
fn test_method_unknown_byte() {
    assert_eq!(MeasurementMethod::from_byte(0), None);
    assert_eq!(MeasurementMethod::from_byte(0xFF), None);
}

#[test]
fn test_method_serde_snake_case() {
    let json = serde_json::to_string(&MeasurementMethod::PpsHardware).unwrap();
    assert_eq!(json, "\"pps_hardware\"");
}

#[test]
fn test_empty_snapshot() {
    let metrics = ClockQualityMetrics::empty(MeasurementMethod::Combined);
    assert_eq!(metrics.total_measurements, 0);
    assert_eq!(metrics.mean_time_error_ns, 0);
    assert_eq!(metrics.std_dev_ns, 0.0);
    assert!(!metrics.is_locked);
    assert!(!metrics.meets_80ns_requirement);
    assert!(!metrics.is_compliant());
    assert_eq!(metrics.measurement_method, MeasurementMethod::Combined);
}

#[test]
fn test_is_compliant_requires_all_flags() {
    let mut metrics = ClockQualityMetrics {
        meets_accuracy_requirement: true,
        meets_lock_time_requirement: true,
        meets_stability_requirement: true,
        ..ClockQualityMetrics::default()
    };
    assert!(metrics.is_compliant());

    metrics.meets_lock_time_requirement = false;
    assert!(!metrics.is_compliant());
}
