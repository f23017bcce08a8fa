use crate::types::event::{
    ClockQualityMeasurement, MAX_PLAUSIBLE_TIME_ERROR_NS, PDelayExchange, SyncIngressEvent,
};

// ===== SyncIngressEvent =====

#[test]
fn test_time_error_positive() {
    // 1ms path delay + 50ns error
    let event = SyncIngressEvent::new(1_000_000_000, 1_001_000_050, 1_000_000, 7, 0);
    assert_eq!(event.time_error_ns, 50);
    assert_eq!(event.sequence_id, 7);
    assert!(event.is_valid);
}

#[test]
fn test_time_error_negative() {
    let event = SyncIngressEvent::new(1_000_000_000, 1_000_999_970, 1_000_000, 0, 0);
    assert_eq!(event.time_error_ns, -30);
    assert!(event.is_valid);
}

#[test]
fn test_zero_timestamps_are_valid() {
    let event = SyncIngressEvent::new(0, 1_000, 0, 0, 0);
    assert!(event.is_valid);
    assert_eq!(event.time_error_ns, 1_000);

    let event = SyncIngressEvent::new(0, 0, 0, 0, 0);
    assert!(event.is_valid);
    assert_eq!(event.time_error_ns, 0);
}

#[test]
fn test_implausible_error_flagged_invalid() {
    let master = 10_000_000_000u64;
    let slave = master + u64::try_from(MAX_PLAUSIBLE_TIME_ERROR_NS).unwrap();
    let event = SyncIngressEvent::new(master, slave, 0, 0, 0);
    assert!(!event.is_valid);
}

#[test]
fn test_extreme_timestamps_do_not_overflow() {
    let event = SyncIngressEvent::new(1, u64::MAX, 0, 0, 0);
    assert_eq!(event.time_error_ns, i64::MAX);
    assert!(!event.is_valid);

    let event = SyncIngressEvent::new(u64::MAX, 1, u64::MAX, 0, 0);
    assert_eq!(event.time_error_ns, i64::MIN);
}

#[test]
fn test_within_bound() {
    let event = SyncIngressEvent::new(1_000, 1_080, 0, 0, 0);
    assert!(event.within(80));
    assert!(!event.within(79));

    let event = SyncIngressEvent::new(1_000, 920, 0, 0, 0);
    assert!(event.within(80));
}

#[test]
fn test_from_measurement_preserves_error() {
    let m = ClockQualityMeasurement::new(-45, 5_000_000_000);
    let event = SyncIngressEvent::from_measurement(&m, 3, 9);
    assert_eq!(event.time_error_ns, -45);
    assert_eq!(event.master_tx_ns, 5_000_000_000);
    assert_eq!(event.slave_rx_ns, 4_999_999_955);
    assert_eq!(event.arrival_order, 9);
    assert!(event.is_valid);

    let invalid = ClockQualityMeasurement {
        is_valid: false,
        ..m
    };
    assert!(!SyncIngressEvent::from_measurement(&invalid, 0, 0).is_valid);
}

// ===== PDelayExchange =====

#[test]
fn test_pdelay_path_delay() {
    let delay = 1_000_000u64;
    let t1 = 1_000_000_000u64;
    let t2 = t1 + delay;
    let t3 = t2 + 100_000; // 100us turnaround
    let t4 = t3 + delay;

    let exchange = PDelayExchange::new(t1, t2, t3, t4);
    assert!(exchange.is_valid);
    assert_eq!(exchange.path_delay_ns, delay);
}

#[test]
fn test_pdelay_asymmetric_rounds_down() {
    // round trip 301, turnaround 100 -> (301 - 100) / 2 = 100
    let exchange = PDelayExchange::new(0, 5_000, 5_100, 301);
    assert!(exchange.is_valid);
    assert_eq!(exchange.path_delay_ns, 100);
}

#[test]
fn test_pdelay_response_before_request_invalid() {
    let exchange = PDelayExchange::new(2_000, 2_100, 2_200, 1_000);
    assert!(!exchange.is_valid);
    assert_eq!(exchange.path_delay_ns, 0);
}

#[test]
fn test_pdelay_negative_turnaround_invalid() {
    let exchange = PDelayExchange::new(1_000, 2_000, 1_500, 3_000);
    assert!(!exchange.is_valid);
}
