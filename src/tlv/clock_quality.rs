//! Clock quality snapshot exchange.
//!
//! A snapshot travels as one container record of type `0x8001` whose value
//! is a sequence of sub-records, one per field. Integers and floats are
//! big-endian; floats are carried as their IEEE-754 bit pattern so they
//! survive the round trip exactly.

use super::codec::{TlvDecoder, TlvEncoder, TlvError, TlvType};
use crate::types::{ClockQualityMetrics, MeasurementMethod};

/// Current encoding version
pub const FORMAT_VERSION: u8 = 1;

/// Bits of the [`TlvType::ComplianceFlags`] field
pub mod flags {
    /// Every sample within ±80 ns
    pub const MEETS_80NS: u8 = 0x01;
    /// Every sample within the configured bound
    pub const MEETS_ACCURACY: u8 = 0x02;
    /// Locked within the maximum lock time
    pub const MEETS_LOCK_TIME: u8 = 0x04;
    /// Stability requirement met
    pub const MEETS_STABILITY: u8 = 0x08;
}

/// A decoded snapshot together with the profile that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ClockQualityTlv {
    /// Profile name of the exporting side
    pub profile_name: String,
    /// The snapshot
    pub metrics: ClockQualityMetrics,
}

/// Encode a metrics snapshot.
#[must_use]
pub fn encode_clock_quality(profile_name: &str, metrics: &ClockQualityMetrics) -> Vec<u8> {
    let mut lock_state = [0u8; 5];
    lock_state[0] = u8::from(metrics.is_locked);
    lock_state[1..].copy_from_slice(&metrics.lock_time_seconds.to_be_bytes());

    let encoded = TlvEncoder::new()
        .add_u8(TlvType::FormatVersion, FORMAT_VERSION)
        .add_str(TlvType::ProfileName, profile_name)
        .add_u8(TlvType::MeasurementMethod, metrics.measurement_method as u8)
        .add_u32(TlvType::TotalMeasurements, metrics.total_measurements)
        .add_u32(TlvType::InvalidMeasurements, metrics.invalid_measurements)
        .add_i64(TlvType::MeanTimeError, metrics.mean_time_error_ns)
        .add_i64(TlvType::MaxTimeError, metrics.max_time_error_ns)
        .add_i64(TlvType::MinTimeError, metrics.min_time_error_ns)
        .add_f64(TlvType::StdDev, metrics.std_dev_ns)
        .add_f64(TlvType::RmsError, metrics.rms_error_ns)
        .add_f64(TlvType::FrequencyStability, metrics.frequency_stability_ppb)
        .add(TlvType::LockState, &lock_state)
        .add_u32(
            TlvType::ObservationWindow,
            metrics.observation_window_seconds,
        )
        .add_u32(
            TlvType::ConsecutiveGood,
            metrics.consecutive_good_measurements,
        )
        .add_u8(TlvType::ComplianceFlags, compliance_flags(metrics))
        .wrap(TlvType::ClockQualityContainer)
        .build();

    tracing::debug!(
        profile = profile_name,
        bytes = encoded.len(),
        "Encoded clock quality TLV"
    );
    encoded
}

/// Decode a metrics snapshot.
///
/// # Errors
///
/// Returns error if the buffer is truncated, is not a clock quality
/// container, lacks a field, or carries a field of the wrong size or an
/// unknown version or method.
pub fn decode_clock_quality(data: &[u8]) -> Result<ClockQualityTlv, TlvError> {
    let decoder = TlvDecoder::decode_container(data, TlvType::ClockQualityContainer)?;

    let version = decoder.get_u8(TlvType::FormatVersion)?;
    if version != FORMAT_VERSION {
        return Err(TlvError::InvalidValue(TlvType::FormatVersion));
    }

    let method_byte = decoder.get_u8(TlvType::MeasurementMethod)?;
    let measurement_method = MeasurementMethod::from_byte(method_byte)
        .ok_or(TlvError::InvalidValue(TlvType::MeasurementMethod))?;

    let lock_state = decoder.get_fixed::<5>(TlvType::LockState)?;
    let is_locked = match lock_state[0] {
        0 => false,
        1 => true,
        _ => return Err(TlvError::InvalidValue(TlvType::LockState)),
    };
    let lock_time_seconds =
        u32::from_be_bytes([lock_state[1], lock_state[2], lock_state[3], lock_state[4]]);

    let bits = decoder.get_u8(TlvType::ComplianceFlags)?;

    let metrics = ClockQualityMetrics {
        total_measurements: decoder.get_u32(TlvType::TotalMeasurements)?,
        invalid_measurements: decoder.get_u32(TlvType::InvalidMeasurements)?,
        mean_time_error_ns: decoder.get_i64(TlvType::MeanTimeError)?,
        max_time_error_ns: decoder.get_i64(TlvType::MaxTimeError)?,
        min_time_error_ns: decoder.get_i64(TlvType::MinTimeError)?,
        std_dev_ns: decoder.get_f64(TlvType::StdDev)?,
        rms_error_ns: decoder.get_f64(TlvType::RmsError)?,
        frequency_stability_ppb: decoder.get_f64(TlvType::FrequencyStability)?,
        is_locked,
        lock_time_seconds,
        observation_window_seconds: decoder.get_u32(TlvType::ObservationWindow)?,
        consecutive_good_measurements: decoder.get_u32(TlvType::ConsecutiveGood)?,
        meets_80ns_requirement: bits & flags::MEETS_80NS != 0,
        meets_accuracy_requirement: bits & flags::MEETS_ACCURACY != 0,
        meets_lock_time_requirement: bits & flags::MEETS_LOCK_TIME != 0,
        meets_stability_requirement: bits & flags::MEETS_STABILITY != 0,
        measurement_method,
    };

    let profile_name = decoder.get_str(TlvType::ProfileName)?.to_string();
    tracing::debug!(
        profile = %profile_name,
        total_measurements = metrics.total_measurements,
        "Decoded clock quality TLV"
    );
    Ok(ClockQualityTlv {
        profile_name,
        metrics,
    })
}

fn compliance_flags(metrics: &ClockQualityMetrics) -> u8 {
    let mut bits = 0;
    if metrics.meets_80ns_requirement {
        bits |= flags::MEETS_80NS;
    }
    if metrics.meets_accuracy_requirement {
        bits |= flags::MEETS_ACCURACY;
    }
    if metrics.meets_lock_time_requirement {
        bits |= flags::MEETS_LOCK_TIME;
    }
    if metrics.meets_stability_requirement {
        bits |= flags::MEETS_STABILITY;
    }
    bits
}
