//! Clock quality metrics snapshot and measurement methods.

use serde::{Deserialize, Serialize};

use crate::error::ClockQualityError;

/// How time error samples were obtained.
///
/// Mirrors the measurement methods of the Avnu "802.1AS Recovered Clock
/// Quality Testing" procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MeasurementMethod {
    /// Sync ingress timestamps reported by the device under test.
    #[default]
    IngressReporting = 0x01,
    /// Device under test sends Sync back to the test equipment.
    ReverseSync = 0x02,
    /// Hardware 1PPS output compared against a reference.
    PpsHardware = 0x03,
    /// More than one of the above.
    Combined = 0x04,
}

impl MeasurementMethod {
    /// All methods, in wire-code order.
    pub const ALL: [Self; 4] = [
        Self::IngressReporting,
        Self::ReverseSync,
        Self::PpsHardware,
        Self::Combined,
    ];

    /// Create from the TLV wire code
    #[must_use]
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x01 => Some(Self::IngressReporting),
            0x02 => Some(Self::ReverseSync),
            0x03 => Some(Self::PpsHardware),
            0x04 => Some(Self::Combined),
            _ => None,
        }
    }

    /// Configuration string form.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IngressReporting => "ingress_reporting",
            Self::ReverseSync => "reverse_sync",
            Self::PpsHardware => "pps_hardware",
            Self::Combined => "combined",
        }
    }
}

impl std::fmt::Display for MeasurementMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MeasurementMethod {
    type Err = ClockQualityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| ClockQualityError::UnknownMeasurementMethod {
                value: s.to_string(),
            })
    }
}

/// Snapshot of clock quality over an analysis window.
///
/// Always produced fresh by a compute call. Two snapshots computed without
/// an intervening recording compare equal.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ClockQualityMetrics {
    /// Valid measurements inside the window.
    pub total_measurements: u32,
    /// Measurements inside the window flagged invalid (excluded from statistics).
    pub invalid_measurements: u32,
    /// Integer-truncated mean time error.
    pub mean_time_error_ns: i64,
    /// Largest time error.
    pub max_time_error_ns: i64,
    /// Smallest time error.
    pub min_time_error_ns: i64,
    /// Population standard deviation.
    pub std_dev_ns: f64,
    /// Root mean square of the raw time error.
    pub rms_error_ns: f64,
    /// Least-squares slope of time error over time (ns/s == ppb).
    pub frequency_stability_ppb: f64,
    /// Whether the session has achieved lock.
    pub is_locked: bool,
    /// Seconds from the first sample to the sample that completed the lock streak.
    pub lock_time_seconds: u32,
    /// Span actually covered by the window's samples.
    pub observation_window_seconds: u32,
    /// Current run of in-bound measurements.
    pub consecutive_good_measurements: u32,
    /// Every sample within ±80 ns.
    pub meets_80ns_requirement: bool,
    /// Every sample within the configured accuracy bound.
    pub meets_accuracy_requirement: bool,
    /// Locked within the configured maximum lock time.
    pub meets_lock_time_requirement: bool,
    /// Observed long enough with low enough variance.
    pub meets_stability_requirement: bool,
    /// Method used to obtain the samples.
    pub measurement_method: MeasurementMethod,
}

impl ClockQualityMetrics {
    /// Accuracy bound of the `meets_80ns_requirement` flag.
    pub const BASELINE_ACCURACY_NS: i64 = 80;

    /// Snapshot of an empty window.
    #[must_use]
    pub fn empty(measurement_method: MeasurementMethod) -> Self {
        Self {
            measurement_method,
            ..Self::default()
        }
    }

    /// Whether all headline requirements hold.
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.meets_accuracy_requirement
            && self.meets_lock_time_requirement
            && self.meets_stability_requirement
    }
}
