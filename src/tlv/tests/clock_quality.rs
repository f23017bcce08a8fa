use crate::tlv::clock_quality::{FORMAT_VERSION, decode_clock_quality, encode_clock_quality};
use crate::tlv::codec::{TlvEncoder, TlvError, TlvType};
use crate::types::{ClockQualityMetrics, MeasurementMethod};

fn sample_metrics() -> ClockQualityMetrics {
    ClockQualityMetrics {
        total_measurements: 480,
        invalid_measurements: 3,
        mean_time_error_ns: -12,
        max_time_error_ns: 61,
        min_time_error_ns: -74,
        std_dev_ns: 23.456_789,
        rms_error_ns: 26.1,
        frequency_stability_ppb: -0.75,
        is_locked: true,
        lock_time_seconds: 3,
        observation_window_seconds: 60,
        consecutive_good_measurements: 460,
        meets_80ns_requirement: true,
        meets_accuracy_requirement: true,
        meets_lock_time_requirement: true,
        meets_stability_requirement: false,
        measurement_method: MeasurementMethod::PpsHardware,
    }
}

#[test]
fn test_export_layout() {
    let encoded = encode_clock_quality("Milan", &sample_metrics());
    assert!(encoded.len() > 50);
    assert_eq!(&encoded[..2], &[0x80, 0x01]);
    let inner_len = usize::from(u16::from_be_bytes([encoded[2], encoded[3]]));
    assert_eq!(inner_len, encoded.len() - 4);
}

#[test]
fn test_snapshot_survives_exchange() {
    let metrics = sample_metrics();
    let decoded = decode_clock_quality(&encode_clock_quality("Milan", &metrics)).unwrap();

    assert_eq!(decoded.profile_name, "Milan");
    assert_eq!(decoded.metrics, metrics);
}

#[test]
fn test_every_method_survives_exchange() {
    for method in MeasurementMethod::ALL {
        let metrics = ClockQualityMetrics::empty(method);
        let decoded = decode_clock_quality(&encode_clock_quality("Automotive", &metrics)).unwrap();
        assert_eq!(decoded.metrics.measurement_method, method);
    }
}

#[test]
fn test_every_truncation_rejected() {
    let encoded = encode_clock_quality("Milan", &sample_metrics());
    for len in 0..encoded.len() {
        let result = decode_clock_quality(&encoded[..len]);
        assert!(result.is_err(), "prefix of {len} bytes decoded");
    }
}

#[test]
fn test_truncated_buffer_reports_sizes() {
    let encoded = encode_clock_quality("Milan", &sample_metrics());
    let result = decode_clock_quality(&encoded[..encoded.len() - 10]);
    assert!(matches!(result, Err(TlvError::BufferTooSmall { .. })));
}

#[test]
fn test_trailing_bytes_ignored() {
    let mut encoded = encode_clock_quality("Milan", &sample_metrics());
    encoded.extend_from_slice(&[0xDE, 0xAD]);
    assert!(decode_clock_quality(&encoded).is_ok());
}

#[test]
fn test_unknown_method_rejected() {
    let encoded = TlvEncoder::new()
        .add_u8(TlvType::FormatVersion, FORMAT_VERSION)
        .add_u8(TlvType::MeasurementMethod, 0x7F)
        .wrap(TlvType::ClockQualityContainer)
        .build();
    assert_eq!(
        decode_clock_quality(&encoded),
        Err(TlvError::InvalidValue(TlvType::MeasurementMethod))
    );
}

#[test]
fn test_unknown_version_rejected() {
    let encoded = TlvEncoder::new()
        .add_u8(TlvType::FormatVersion, FORMAT_VERSION + 1)
        .wrap(TlvType::ClockQualityContainer)
        .build();
    assert_eq!(
        decode_clock_quality(&encoded),
        Err(TlvError::InvalidValue(TlvType::FormatVersion))
    );
}

#[test]
fn test_missing_field_rejected() {
    let encoded = TlvEncoder::new()
        .add_u8(TlvType::FormatVersion, FORMAT_VERSION)
        .add_u8(TlvType::MeasurementMethod, 1)
        .wrap(TlvType::ClockQualityContainer)
        .build();
    assert_eq!(
        decode_clock_quality(&encoded),
        Err(TlvError::MissingField(TlvType::LockState))
    );
}

#[test]
fn test_not_a_container() {
    let encoded = TlvEncoder::new()
        .add_u8(TlvType::FormatVersion, FORMAT_VERSION)
        .build();
    assert_eq!(
        decode_clock_quality(&encoded),
        Err(TlvError::UnexpectedType(0x0000))
    );
}
