mod report;

use crate::profile::ProfileSession;
use crate::types::ClockQualityMeasurement;

/// Base timestamp for synthetic streams.
pub(super) const T0: u64 = 1_000_000_000;

/// Feed `errors` at the 125 ms Sync interval, starting at `T0`.
pub(super) fn feed(session: &ProfileSession, errors: impl IntoIterator<Item = i64>) {
    for (i, err) in errors.into_iter().enumerate() {
        let ts = T0 + i as u64 * 125_000_000;
        session.record_clock_quality_measurement(&ClockQualityMeasurement::new(err, ts));
    }
}
