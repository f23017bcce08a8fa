//! Ingress event recorder.
//!
//! Collects Sync ingress events and PDelay exchanges for one monitoring
//! session and computes windowed clock quality metrics on demand.
//!
//! All methods take `&self`: one thread may record while another computes
//! metrics. Appends and snapshot reads are serialised by a single mutex, so
//! a snapshot always reflects a complete prefix of the event log.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::ascapable::{AsCapablePolicy, AsCapableTracker, evaluate_ascapable_threshold};
use super::lock::{LockDetector, LockState};
use super::pdelay::{PdelayLateResponseStats, PdelayOutcome, PdelayTimeoutStats, PdelayTracker};
use super::window;
use crate::types::{
    ClockQualityConfig, ClockQualityMeasurement, ClockQualityMetrics, PDelayExchange,
    SyncIngressEvent,
};

const NANOS_PER_SEC: u64 = 1_000_000_000;

/// Recorder for one monitoring session.
pub struct IngressEventRecorder {
    config: ClockQualityConfig,
    state: Mutex<RecorderState>,
}

struct RecorderState {
    enabled: bool,
    interval_ms: u32,
    /// Arrival-ordered event log, pruned from the front by timestamp.
    events: VecDeque<SyncIngressEvent>,
    /// Adjacent pairs in `events` whose timestamps go backwards.
    inversions: usize,
    next_arrival: u64,
    next_sequence: u16,
    /// Largest `master_tx_ns` among valid events.
    latest_ns: Option<u64>,
    /// Largest timestamp seen on any input; reference "now" for PDelay timeouts.
    latest_any_ns: u64,
    evicted: u64,
    pdelay_exchanges: VecDeque<PDelayExchange>,
    last_path_delay_ns: Option<u64>,
    lock: LockDetector,
    pdelay: PdelayTracker,
    ascapable: AsCapableTracker,
}

impl RecorderState {
    fn new(config: &ClockQualityConfig) -> Self {
        Self {
            enabled: false,
            interval_ms: config.measurement_interval_ms,
            events: VecDeque::new(),
            inversions: 0,
            next_arrival: 0,
            next_sequence: 0,
            latest_ns: None,
            latest_any_ns: 0,
            evicted: 0,
            pdelay_exchanges: VecDeque::with_capacity(IngressEventRecorder::PDELAY_HISTORY),
            last_path_delay_ns: None,
            lock: LockDetector::new(config.accuracy_bound_ns, config.lock_streak_length),
            pdelay: PdelayTracker::new(config.pdelay_timeout_ms, config.late_response_threshold_ms),
            ascapable: AsCapableTracker::new(
                config.ascapable_policy,
                config.neighbor_prop_delay_threshold_ns,
                config.min_pdelay_successes,
            ),
        }
    }

    fn push(&mut self, event: SyncIngressEvent, retention_ns: u64) {
        if self
            .events
            .back()
            .is_some_and(|back| event.master_tx_ns < back.master_tx_ns)
        {
            self.inversions += 1;
        }
        if event.is_valid {
            self.latest_ns = Some(self.latest_ns.map_or(event.master_tx_ns, |l| l.max(event.master_tx_ns)));
        } else {
            tracing::warn!(
                master_tx_ns = event.master_tx_ns,
                slave_rx_ns = event.slave_rx_ns,
                time_error_ns = event.time_error_ns,
                "Recording implausible Sync ingress timestamps as invalid"
            );
        }
        self.latest_any_ns = self.latest_any_ns.max(event.master_tx_ns);
        self.lock.observe(&event);
        tracing::trace!(
            sequence_id = event.sequence_id,
            time_error_ns = event.time_error_ns,
            "Sync ingress recorded"
        );
        self.events.push_back(event);
        self.evict(retention_ns);
    }

    fn evict(&mut self, retention_ns: u64) {
        let Some(latest) = self.latest_ns else {
            return;
        };
        let cutoff = latest.saturating_sub(retention_ns);
        let before = self.events.len();
        while self
            .events
            .front()
            .is_some_and(|front| front.master_tx_ns < cutoff)
        {
            self.pop_front();
        }
        // Expired events can hide behind a newer front while the log is out of order.
        if self.inversions > 0 && self.events.iter().any(|e| e.master_tx_ns < cutoff) {
            self.events.retain(|e| e.master_tx_ns >= cutoff);
            self.inversions = count_inversions(&self.events);
        }
        let evicted = before - self.events.len();
        if evicted > 0 {
            self.evicted += evicted as u64;
            tracing::trace!(evicted, retained = self.events.len(), "Evicted expired events");
        }
    }

    fn pop_front(&mut self) {
        if let (Some(first), Some(second)) = (self.events.front(), self.events.get(1)) {
            if second.master_tx_ns < first.master_tx_ns {
                self.inversions -= 1;
            }
        }
        self.events.pop_front();
    }

    fn is_time_ordered(&self) -> bool {
        self.inversions == 0
    }

    fn next_sequence(&mut self) -> u16 {
        let seq = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        seq
    }

    fn next_arrival(&mut self) -> u64 {
        let arrival = self.next_arrival;
        self.next_arrival += 1;
        arrival
    }
}

fn count_inversions(events: &VecDeque<SyncIngressEvent>) -> usize {
    events
        .iter()
        .zip(events.iter().skip(1))
        .filter(|(a, b)| b.master_tx_ns < a.master_tx_ns)
        .count()
}

impl IngressEventRecorder {
    /// Number of PDelay exchanges kept for inspection.
    pub const PDELAY_HISTORY: usize = 64;

    /// Create a disabled recorder.
    #[must_use]
    pub fn new(config: ClockQualityConfig) -> Self {
        let state = RecorderState::new(&config);
        Self {
            config,
            state: Mutex::new(state),
        }
    }

    /// Create a recorder that is already enabled at the configured interval.
    #[must_use]
    pub fn enabled(config: ClockQualityConfig) -> Self {
        let recorder = Self::new(config);
        recorder.enable(recorder.config.measurement_interval_ms);
        recorder
    }

    fn state(&self) -> MutexGuard<'_, RecorderState> {
        // State is only mutated under the lock and every mutation leaves it
        // consistent, so a poisoned guard is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn retention_ns(&self) -> u64 {
        u64::from(self.config.retention_seconds) * NANOS_PER_SEC
    }

    /// Start (or continue) recording with a nominal reporting interval.
    pub fn enable(&self, interval_ms: u32) {
        let mut state = self.state();
        state.enabled = true;
        state.interval_ms = interval_ms.max(1);
        tracing::info!(interval_ms = state.interval_ms, "Clock quality recording enabled");
    }

    /// Stop recording and discard all accumulated state.
    pub fn disable(&self) {
        let mut state = self.state();
        let discarded = state.events.len();
        *state = RecorderState::new(&self.config);
        tracing::info!(discarded, "Clock quality recording disabled");
    }

    /// Whether the recorder accepts events.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.state().enabled
    }

    /// Configuration this recorder was built with.
    #[must_use]
    pub fn config(&self) -> &ClockQualityConfig {
        &self.config
    }

    /// Record a Sync ingress event.
    ///
    /// Out-of-order and bogus timestamps are accepted; the latter are flagged
    /// invalid. Returns `false` only if the recorder is disabled.
    pub fn record_sync_ingress(&self, master_tx_ns: u64, slave_rx_ns: u64, path_delay_ns: u64) -> bool {
        let mut state = self.state();
        if !state.enabled {
            return false;
        }
        let seq = state.next_sequence();
        let arrival = state.next_arrival();
        let event = SyncIngressEvent::new(master_tx_ns, slave_rx_ns, path_delay_ns, seq, arrival);
        state.push(event, self.retention_ns());
        true
    }

    /// Record a Sync ingress event carrying its own sequence ID.
    pub fn record_sync_ingress_with_sequence(
        &self,
        master_tx_ns: u64,
        slave_rx_ns: u64,
        path_delay_ns: u64,
        sequence_id: u16,
    ) -> bool {
        let mut state = self.state();
        if !state.enabled {
            return false;
        }
        let arrival = state.next_arrival();
        state.next_sequence = sequence_id.wrapping_add(1);
        let event =
            SyncIngressEvent::new(master_tx_ns, slave_rx_ns, path_delay_ns, sequence_id, arrival);
        state.push(event, self.retention_ns());
        true
    }

    /// Record a pre-computed time error measurement.
    pub fn record_measurement(&self, measurement: &ClockQualityMeasurement) -> bool {
        let mut state = self.state();
        if !state.enabled {
            return false;
        }
        let seq = state.next_sequence();
        let arrival = state.next_arrival();
        let event = SyncIngressEvent::from_measurement(measurement, seq, arrival);
        state.push(event, self.retention_ns());
        true
    }

    /// Record a four-timestamp PDelay exchange.
    ///
    /// A valid exchange updates the current path delay and counts as a
    /// PDelay success for asCapable.
    pub fn record_pdelay_exchange(&self, t1: u64, t2: u64, t3: u64, t4: u64) -> bool {
        let mut state = self.state();
        if !state.enabled {
            return false;
        }
        let exchange = PDelayExchange::new(t1, t2, t3, t4);
        if exchange.is_valid {
            state.last_path_delay_ns = Some(exchange.path_delay_ns);
            state.ascapable.record_success();
        } else {
            tracing::warn!(t1, t2, t3, t4, "Recording inconsistent PDelay exchange as invalid");
        }
        state.latest_any_ns = state.latest_any_ns.max(t4).max(t1);
        if state.pdelay_exchanges.len() >= Self::PDELAY_HISTORY {
            state.pdelay_exchanges.pop_front();
        }
        state.pdelay_exchanges.push_back(exchange);
        true
    }

    /// Record a transmitted `Pdelay_Req`.
    pub fn record_pdelay_request(&self, sequence_id: u16, request_ns: u64) -> bool {
        let mut state = self.state();
        if !state.enabled {
            return false;
        }
        state.latest_any_ns = state.latest_any_ns.max(request_ns);
        if state.pdelay.record_request(sequence_id, request_ns) > 0 {
            state.ascapable.record_loss();
        }
        true
    }

    /// Record a received `Pdelay_Resp` and classify it.
    ///
    /// Timed-out and invalid responses end the current asCapable success
    /// run. Returns `None` if the recorder is disabled.
    pub fn record_pdelay_response(&self, sequence_id: u16, response_ns: u64) -> Option<PdelayOutcome> {
        let mut state = self.state();
        if !state.enabled {
            return None;
        }
        state.latest_any_ns = state.latest_any_ns.max(response_ns);
        let outcome = state.pdelay.record_response(sequence_id, response_ns);
        if matches!(outcome, PdelayOutcome::TimedOut { .. } | PdelayOutcome::Invalid) {
            state.ascapable.record_loss();
        }
        Some(outcome)
    }

    /// Record a request and its response in one call.
    pub fn record_pdelay_sequence(
        &self,
        sequence_id: u16,
        request_ns: u64,
        response_ns: u64,
    ) -> Option<PdelayOutcome> {
        if !self.record_pdelay_request(sequence_id, request_ns) {
            return None;
        }
        self.record_pdelay_response(sequence_id, response_ns)
    }

    /// Feed a neighborPropDelay sample; returns the resulting asCapable.
    pub fn record_neighbor_prop_delay(&self, delay_ns: u64) -> bool {
        let mut state = self.state();
        if !state.enabled {
            return state.ascapable.is_ascapable();
        }
        state.ascapable.record_neighbor_prop_delay(delay_ns)
    }

    /// Evaluate asCapable for one delay under this recorder's policy.
    #[must_use]
    pub fn evaluate_ascapable_threshold(
        &self,
        current_ascapable: bool,
        measured_delay_ns: i64,
        threshold_ns: i64,
    ) -> bool {
        evaluate_ascapable_threshold(
            self.config.ascapable_policy,
            current_ascapable,
            measured_delay_ns,
            threshold_ns,
        )
    }

    /// asCapable policy in effect.
    #[must_use]
    pub fn ascapable_policy(&self) -> AsCapablePolicy {
        self.config.ascapable_policy
    }

    /// Current asCapable state.
    #[must_use]
    pub fn is_ascapable(&self) -> bool {
        self.state().ascapable.is_ascapable()
    }

    /// Successful PDelay exchanges in the current run.
    #[must_use]
    pub fn pdelay_successes(&self) -> u32 {
        self.state().ascapable.successes()
    }

    /// Lost-response statistics, relative to the latest timestamp seen.
    #[must_use]
    pub fn get_timeout_statistics(&self) -> PdelayTimeoutStats {
        let state = self.state();
        state.pdelay.timeout_statistics(state.latest_any_ns)
    }

    /// Lost-response statistics relative to an explicit current time.
    #[must_use]
    pub fn get_timeout_statistics_at(&self, now_ns: u64) -> PdelayTimeoutStats {
        self.state().pdelay.timeout_statistics(now_ns)
    }

    /// Late-response statistics.
    #[must_use]
    pub fn get_late_response_statistics(&self) -> PdelayLateResponseStats {
        self.state().pdelay.late_response_statistics()
    }

    /// The last `n` Sync ingress events in arrival order.
    #[must_use]
    pub fn get_recent_measurements(&self, n: usize) -> Vec<SyncIngressEvent> {
        let state = self.state();
        let skip = state.events.len().saturating_sub(n);
        state.events.iter().skip(skip).copied().collect()
    }

    /// The last `n` PDelay exchanges in arrival order.
    #[must_use]
    pub fn get_recent_pdelay_exchanges(&self, n: usize) -> Vec<PDelayExchange> {
        let state = self.state();
        let skip = state.pdelay_exchanges.len().saturating_sub(n);
        state.pdelay_exchanges.iter().skip(skip).copied().collect()
    }

    /// Path delay from the most recent valid PDelay exchange.
    #[must_use]
    pub fn last_path_delay_ns(&self) -> Option<u64> {
        self.state().last_path_delay_ns
    }

    /// Events currently retained.
    #[must_use]
    pub fn event_count(&self) -> usize {
        self.state().events.len()
    }

    /// Events dropped by time-based pruning.
    #[must_use]
    pub fn evicted_count(&self) -> u64 {
        self.state().evicted
    }

    /// Whether the retained log is sorted by master timestamp.
    #[must_use]
    pub fn is_time_ordered(&self) -> bool {
        self.state().is_time_ordered()
    }

    /// Incrementally maintained lock state.
    #[must_use]
    pub fn lock_state(&self) -> LockState {
        self.state().lock.state()
    }

    /// Lock state recomputed from the retained event log.
    ///
    /// Matches [`Self::lock_state`] as long as no events have been evicted.
    #[must_use]
    pub fn recompute_lock_state(&self) -> LockState {
        self.lock_state_with(self.config.accuracy_bound_ns, self.config.lock_streak_length)
    }

    /// Lock state the retained event log yields under different thresholds.
    #[must_use]
    pub fn lock_state_with(&self, accuracy_bound_ns: i64, streak_length: u32) -> LockState {
        let state = self.state();
        LockDetector::replay(accuracy_bound_ns, streak_length, state.events.iter()).state()
    }

    /// Compute metrics over the default analysis window.
    #[must_use]
    pub fn compute_default_metrics(&self) -> ClockQualityMetrics {
        self.compute_metrics(self.config.analysis_window_seconds)
    }

    /// Compute metrics over the last `window_seconds` of events.
    ///
    /// The window ends at the latest valid event timestamp. Windows longer
    /// than the retention period are clamped to it.
    #[must_use]
    pub fn compute_metrics(&self, window_seconds: u32) -> ClockQualityMetrics {
        let state = self.state();
        let mut metrics = ClockQualityMetrics::empty(self.config.measurement_method);

        let window_seconds = window_seconds.min(self.config.retention_seconds);
        let Some(latest) = state.latest_ns else {
            metrics.invalid_measurements = u32::try_from(state.events.len()).unwrap_or(u32::MAX);
            return metrics;
        };
        let cutoff = latest.saturating_sub(u64::from(window_seconds) * NANOS_PER_SEC);

        let start = if state.is_time_ordered() {
            state.events.partition_point(|e| e.master_tx_ns < cutoff)
        } else {
            0
        };
        let in_window = state
            .events
            .range(start..)
            .filter(move |e| e.master_tx_ns >= cutoff && e.master_tx_ns <= latest);

        let stats = window::analyze(in_window);
        if stats.count == 0 {
            metrics.invalid_measurements = stats.invalid;
            return metrics;
        }
        stats.fill(&mut metrics);
        metrics.meets_accuracy_requirement = stats.all_within(self.config.accuracy_bound_ns);

        let lock = state.lock.state();
        metrics.is_locked = lock.locked;
        metrics.lock_time_seconds = lock.lock_time_seconds.unwrap_or(0);
        metrics.consecutive_good_measurements = lock.consecutive_good;
        metrics.meets_lock_time_requirement =
            lock.locked && metrics.lock_time_seconds <= self.config.max_lock_time_seconds;

        let interval_ns = u64::from(state.interval_ms) * 1_000_000;
        let covered_secs = (stats.span_ns() + interval_ns) / NANOS_PER_SEC;
        metrics.observation_window_seconds =
            u32::try_from(covered_secs).unwrap_or(u32::MAX).min(window_seconds);
        metrics.meets_stability_requirement = metrics.observation_window_seconds
            >= self.config.stability_window_seconds
            && metrics.std_dev_ns <= self.config.max_stability_std_dev_ns;

        metrics
    }
}

impl Default for IngressEventRecorder {
    fn default() -> Self {
        Self::new(ClockQualityConfig::default())
    }
}

impl std::fmt::Debug for IngressEventRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("IngressEventRecorder")
            .field("enabled", &state.enabled)
            .field("interval_ms", &state.interval_ms)
            .field("events", &state.events.len())
            .field("locked", &state.lock.is_locked())
            .field("method", &self.config.measurement_method)
            .finish_non_exhaustive()
    }
}
