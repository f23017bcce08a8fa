use std::sync::Arc;
use std::thread;

use super::T0;
use crate::monitor::IngressEventRecorder;
use crate::types::{ClockQualityConfig, ClockQualityMeasurement};

#[test]
fn test_concurrent_record_and_compute() {
    let recorder = Arc::new(IngressEventRecorder::enabled(ClockQualityConfig::default()));
    let writer_recorder = recorder.clone();

    let event_count: u64 = 2_000;

    // Writer thread
    let writer = thread::spawn(move || {
        for i in 0..event_count {
            let ts = T0 + i * 125_000_000;
            writer_recorder.record_measurement(&ClockQualityMeasurement::new(10, ts));
        }
    });

    // Reader thread
    let reader_recorder = recorder.clone();
    let reader = thread::spawn(move || {
        let mut last_total = 0;
        loop {
            let metrics = reader_recorder.compute_metrics(300);
            assert!(metrics.total_measurements >= last_total);
            if metrics.total_measurements > 0 {
                assert_eq!(metrics.mean_time_error_ns, 10);
                assert_eq!(metrics.max_time_error_ns, 10);
            }
            last_total = metrics.total_measurements;

            let recent = reader_recorder.get_recent_measurements(16);
            for pair in recent.windows(2) {
                assert_eq!(pair[1].arrival_order, pair[0].arrival_order + 1);
            }

            if u64::from(last_total) == event_count {
                break;
            }
            thread::yield_now();
        }
    });

    writer.join().unwrap();
    reader.join().unwrap();

    assert_eq!(recorder.event_count(), 2_000);
    assert!(recorder.lock_state().locked);
}
