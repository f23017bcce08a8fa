//! Raw timestamp-exchange events recorded by the ingress monitor.

use serde::{Deserialize, Serialize};

/// Time errors at or beyond this magnitude are treated as bogus input.
pub const MAX_PLAUSIBLE_TIME_ERROR_NS: i64 = 1_000_000_000;

/// A Sync message ingress observation.
///
/// `time_error_ns = (slave_rx_ns - master_tx_ns) - path_delay_ns`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncIngressEvent {
    /// Master transmit time (T1, precise origin timestamp).
    pub master_tx_ns: u64,
    /// Slave receive time (T2).
    pub slave_rx_ns: u64,
    /// Link delay used to correct T2.
    pub path_delay_ns: u64,
    /// Sync sequence ID.
    pub sequence_id: u16,
    /// Position in the recorder's arrival order.
    pub arrival_order: u64,
    /// Derived instantaneous time error.
    pub time_error_ns: i64,
    /// False when the time error is implausibly large.
    pub is_valid: bool,
}

impl SyncIngressEvent {
    /// Build an event from the three ingress timestamps.
    #[must_use]
    pub fn new(
        master_tx_ns: u64,
        slave_rx_ns: u64,
        path_delay_ns: u64,
        sequence_id: u16,
        arrival_order: u64,
    ) -> Self {
        let raw = i128::from(slave_rx_ns) - i128::from(master_tx_ns) - i128::from(path_delay_ns);
        let time_error_ns = clamp_i64(raw);
        let is_valid = time_error_ns.unsigned_abs() < MAX_PLAUSIBLE_TIME_ERROR_NS.unsigned_abs();
        Self {
            master_tx_ns,
            slave_rx_ns,
            path_delay_ns,
            sequence_id,
            arrival_order,
            time_error_ns,
            is_valid,
        }
    }

    /// Build an event from a pre-computed measurement.
    ///
    /// The measurement timestamp becomes the master transmit time and the
    /// path delay is zero, so the time error is carried over exactly.
    #[must_use]
    pub fn from_measurement(
        measurement: &ClockQualityMeasurement,
        sequence_id: u16,
        arrival_order: u64,
    ) -> Self {
        Self {
            master_tx_ns: measurement.timestamp_ns,
            slave_rx_ns: measurement
                .timestamp_ns
                .saturating_add_signed(measurement.time_error_ns),
            path_delay_ns: 0,
            sequence_id,
            arrival_order,
            time_error_ns: measurement.time_error_ns,
            is_valid: measurement.is_valid,
        }
    }

    /// Whether the time error lies within `±bound_ns`.
    #[must_use]
    pub fn within(&self, bound_ns: i64) -> bool {
        self.time_error_ns.unsigned_abs() <= bound_ns.unsigned_abs()
    }
}

/// A pre-computed time error sample, as fed to a profile session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockQualityMeasurement {
    /// Measured time error.
    pub time_error_ns: i64,
    /// When the sample was taken.
    pub timestamp_ns: u64,
    /// False for samples that should be counted but not analysed.
    pub is_valid: bool,
}

impl ClockQualityMeasurement {
    /// A valid measurement.
    #[must_use]
    pub fn new(time_error_ns: i64, timestamp_ns: u64) -> Self {
        Self {
            time_error_ns,
            timestamp_ns,
            is_valid: true,
        }
    }
}

/// A four-timestamp peer delay exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PDelayExchange {
    /// `Pdelay_Req` transmit (initiator clock).
    pub t1_req_tx: u64,
    /// `Pdelay_Req` receive (responder clock).
    pub t2_req_rx: u64,
    /// `Pdelay_Resp` transmit (responder clock).
    pub t3_resp_tx: u64,
    /// `Pdelay_Resp` receive (initiator clock).
    pub t4_resp_rx: u64,
    /// `((t4 - t1) - (t3 - t2)) / 2`, zero when the exchange is invalid.
    pub path_delay_ns: u64,
    /// False when a response precedes its request or the turnaround is negative.
    pub is_valid: bool,
}

impl PDelayExchange {
    /// Build an exchange and derive its path delay.
    #[must_use]
    pub fn new(t1_req_tx: u64, t2_req_rx: u64, t3_resp_tx: u64, t4_resp_rx: u64) -> Self {
        let round_trip = i128::from(t4_resp_rx) - i128::from(t1_req_tx);
        let turnaround = i128::from(t3_resp_tx) - i128::from(t2_req_rx);
        let is_valid = round_trip >= 0 && turnaround >= 0 && round_trip >= turnaround;
        let path_delay_ns = if is_valid {
            u64::try_from((round_trip - turnaround) / 2).unwrap_or(u64::MAX)
        } else {
            0
        };
        Self {
            t1_req_tx,
            t2_req_rx,
            t3_resp_tx,
            t4_resp_rx,
            path_delay_ns,
            is_valid,
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn clamp_i64(value: i128) -> i64 {
    value.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
