mod ascapable;
mod concurrency;
mod pdelay;
mod window;

use crate::types::{ClockQualityMeasurement, SyncIngressEvent};

/// Base timestamp for synthetic streams.
pub(super) const T0: u64 = 1_000_000_000;

/// Events with the given time errors, `interval_ms` apart from `T0`.
pub(super) fn events(errors: &[i64], interval_ms: u64) -> Vec<SyncIngressEvent> {
    errors
        .iter()
        .enumerate()
        .map(|(i, &err)| {
            let ts = T0 + i as u64 * interval_ms * 1_000_000;
            SyncIngressEvent::from_measurement(
                &ClockQualityMeasurement::new(err, ts),
                i as u16,
                i as u64,
            )
        })
        .collect()
}
