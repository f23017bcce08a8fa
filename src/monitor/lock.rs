//! Lock detection over the time error stream.
//!
//! A clock is locked once `streak_length` consecutive valid measurements
//! fall within `±accuracy_bound_ns`. Lock is sticky for the session: later
//! violations reset the streak but not the locked flag.

use crate::types::SyncIngressEvent;

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Point-in-time view of the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LockState {
    /// Current run of in-bound measurements.
    pub consecutive_good: u32,
    /// Timestamp of the first measurement in the current run.
    pub streak_start_ns: Option<u64>,
    /// Whether lock has been achieved this session.
    pub locked: bool,
    /// Seconds from monitoring start to the measurement completing the lock streak.
    pub lock_time_seconds: Option<u32>,
}

/// Incremental lock detector.
#[derive(Debug, Clone)]
pub struct LockDetector {
    accuracy_bound_ns: i64,
    streak_length: u32,
    monitoring_start_ns: Option<u64>,
    state: LockState,
}

impl LockDetector {
    /// Default bound for a good measurement.
    pub const DEFAULT_ACCURACY_BOUND_NS: i64 = 80;

    /// Default number of consecutive good measurements for lock.
    pub const DEFAULT_STREAK_LENGTH: u32 = 20;

    /// Create a detector.
    #[must_use]
    pub fn new(accuracy_bound_ns: i64, streak_length: u32) -> Self {
        Self {
            accuracy_bound_ns,
            streak_length: streak_length.max(1),
            monitoring_start_ns: None,
            state: LockState::default(),
        }
    }

    /// Rebuild detector state from a full event history.
    ///
    /// Produces the same state as feeding the events to [`Self::observe`]
    /// one at a time.
    #[must_use]
    pub fn replay<'a, I>(accuracy_bound_ns: i64, streak_length: u32, events: I) -> Self
    where
        I: IntoIterator<Item = &'a SyncIngressEvent>,
    {
        let mut detector = Self::new(accuracy_bound_ns, streak_length);
        for event in events {
            detector.observe(event);
        }
        detector
    }

    /// Feed one event. Returns `true` if this event completed the lock streak.
    ///
    /// Invalid events are ignored.
    pub fn observe(&mut self, event: &SyncIngressEvent) -> bool {
        if !event.is_valid {
            return false;
        }
        let timestamp = event.master_tx_ns;
        let start = *self.monitoring_start_ns.get_or_insert(timestamp);

        if !event.within(self.accuracy_bound_ns) {
            if self.state.consecutive_good > 0 {
                tracing::trace!(
                    time_error_ns = event.time_error_ns,
                    streak = self.state.consecutive_good,
                    "Lock streak broken"
                );
            }
            self.state.consecutive_good = 0;
            self.state.streak_start_ns = None;
            return false;
        }

        self.state.consecutive_good = self.state.consecutive_good.saturating_add(1);
        self.state.streak_start_ns.get_or_insert(timestamp);

        if self.state.locked || self.state.consecutive_good < self.streak_length {
            return false;
        }

        let elapsed_secs = timestamp.saturating_sub(start) / NANOS_PER_SEC;
        let lock_time = u32::try_from(elapsed_secs).unwrap_or(u32::MAX);
        self.state.locked = true;
        self.state.lock_time_seconds = Some(lock_time);
        tracing::info!(
            lock_time_seconds = lock_time,
            streak = self.state.consecutive_good,
            bound_ns = self.accuracy_bound_ns,
            "Clock locked"
        );
        true
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> LockState {
        self.state
    }

    /// Whether lock has been achieved.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.state.locked
    }

    /// Current run of in-bound measurements.
    #[must_use]
    pub fn consecutive_good(&self) -> u32 {
        self.state.consecutive_good
    }

    /// Lock time, if locked.
    #[must_use]
    pub fn lock_time_seconds(&self) -> Option<u32> {
        self.state.lock_time_seconds
    }

    /// Timestamp of the first valid event seen.
    #[must_use]
    pub fn monitoring_start_ns(&self) -> Option<u64> {
        self.monitoring_start_ns
    }

    /// Configured accuracy bound.
    #[must_use]
    pub fn accuracy_bound_ns(&self) -> i64 {
        self.accuracy_bound_ns
    }

    /// Configured streak length.
    #[must_use]
    pub fn streak_length(&self) -> u32 {
        self.streak_length
    }

    /// Forget all history.
    pub fn reset(&mut self) {
        self.monitoring_start_ns = None;
        self.state = LockState::default();
    }
}

impl Default for LockDetector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ACCURACY_BOUND_NS, Self::DEFAULT_STREAK_LENGTH)
    }
}
