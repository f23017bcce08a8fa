//! A monitoring session certified against one compliance profile.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::params::{ComplianceProfile, ProfileKind};
use super::report::{ComplianceReport, ComplianceVerdict, MetricsSource};
use crate::error::Result;
use crate::monitor::{
    IngressEventRecorder, LockState, PdelayLateResponseStats, PdelayOutcome, PdelayTimeoutStats,
};
use crate::tlv::{ClockQualityTlv, decode_clock_quality, encode_clock_quality};
use crate::types::{ClockQualityConfig, ClockQualityMeasurement, ClockQualityMetrics};

/// Session state for one port or domain running a profile.
///
/// The profile is shared read-only; the monitoring flag, recorder and any
/// imported snapshot belong to this session. All methods take `&self`, so
/// a session can be shared between a recording thread and a reporting
/// thread behind an `Arc`.
pub struct ProfileSession {
    profile: Arc<ComplianceProfile>,
    monitoring: AtomicBool,
    recorder: IngressEventRecorder,
    imported: Mutex<Option<ClockQualityTlv>>,
}

impl ProfileSession {
    /// Create a session with default recorder settings.
    #[must_use]
    pub fn new(profile: Arc<ComplianceProfile>) -> Self {
        let config = profile.recorder_config(&ClockQualityConfig::default());
        Self::build(profile, config)
    }

    /// Create a session for a preset profile.
    #[must_use]
    pub fn preset(kind: ProfileKind) -> Self {
        Self::new(Arc::new(ComplianceProfile::preset(kind)))
    }

    /// Create a session whose recorder starts from `base`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the profile or the combined recorder
    /// configuration is inconsistent.
    pub fn with_config(profile: Arc<ComplianceProfile>, base: &ClockQualityConfig) -> Result<Self> {
        profile.validate()?;
        let config = profile.recorder_config(base);
        config.validate()?;
        Ok(Self::build(profile, config))
    }

    fn build(profile: Arc<ComplianceProfile>, config: ClockQualityConfig) -> Self {
        Self {
            profile,
            monitoring: AtomicBool::new(false),
            recorder: IngressEventRecorder::enabled(config),
            imported: Mutex::new(None),
        }
    }

    fn imported(&self) -> MutexGuard<'_, Option<ClockQualityTlv>> {
        self.imported.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The session's profile
    #[must_use]
    pub fn profile(&self) -> &ComplianceProfile {
        &self.profile
    }

    /// Shared handle to the session's profile
    #[must_use]
    pub fn shared_profile(&self) -> Arc<ComplianceProfile> {
        Arc::clone(&self.profile)
    }

    /// The underlying recorder
    #[must_use]
    pub fn recorder(&self) -> &IngressEventRecorder {
        &self.recorder
    }

    /// Start accepting measurements.
    pub fn enable_monitoring(&self) {
        if !self.monitoring.swap(true, Ordering::AcqRel) {
            tracing::info!(profile = %self.profile.name, "Clock quality monitoring enabled");
        }
    }

    /// Stop accepting measurements and discard everything recorded.
    pub fn disable_monitoring(&self) {
        if self.monitoring.swap(false, Ordering::AcqRel) {
            tracing::info!(profile = %self.profile.name, "Clock quality monitoring disabled");
        }
        self.recorder.disable();
        self.recorder.enable(self.recorder.config().measurement_interval_ms);
        *self.imported() = None;
    }

    /// Whether measurements are being accepted
    #[must_use]
    pub fn is_clock_quality_monitoring_enabled(&self) -> bool {
        self.monitoring.load(Ordering::Acquire)
    }

    /// Feed a pre-computed measurement. Returns `false` while monitoring is off.
    pub fn record_clock_quality_measurement(&self, measurement: &ClockQualityMeasurement) -> bool {
        self.is_clock_quality_monitoring_enabled() && self.recorder.record_measurement(measurement)
    }

    /// Feed raw Sync ingress timestamps. Returns `false` while monitoring is off.
    pub fn record_sync_ingress(&self, master_tx_ns: u64, slave_rx_ns: u64, path_delay_ns: u64) -> bool {
        self.is_clock_quality_monitoring_enabled()
            && self
                .recorder
                .record_sync_ingress(master_tx_ns, slave_rx_ns, path_delay_ns)
    }

    /// Feed a PDelay exchange. Returns `false` while monitoring is off.
    pub fn record_pdelay_exchange(&self, t1: u64, t2: u64, t3: u64, t4: u64) -> bool {
        self.is_clock_quality_monitoring_enabled()
            && self.recorder.record_pdelay_exchange(t1, t2, t3, t4)
    }

    /// Feed a PDelay request/response pair. Returns `None` while monitoring is off.
    pub fn record_pdelay_sequence(
        &self,
        sequence_id: u16,
        request_ns: u64,
        response_ns: u64,
    ) -> Option<PdelayOutcome> {
        if !self.is_clock_quality_monitoring_enabled() {
            return None;
        }
        self.recorder
            .record_pdelay_sequence(sequence_id, request_ns, response_ns)
    }

    /// Feed a neighborPropDelay sample and return the resulting asCapable.
    pub fn record_neighbor_prop_delay(&self, delay_ns: u64) -> bool {
        if !self.is_clock_quality_monitoring_enabled() {
            return self.recorder.is_ascapable();
        }
        self.recorder.record_neighbor_prop_delay(delay_ns)
    }

    /// Current asCapable
    #[must_use]
    pub fn is_ascapable(&self) -> bool {
        self.recorder.is_ascapable()
    }

    /// Whether enough PDelay exchanges succeeded for this profile
    #[must_use]
    pub fn pdelay_successes_sufficient(&self) -> bool {
        self.recorder.pdelay_successes() >= self.profile.required_pdelay_successes()
    }

    /// Lost-response statistics
    #[must_use]
    pub fn get_timeout_statistics(&self) -> PdelayTimeoutStats {
        self.recorder.get_timeout_statistics()
    }

    /// Late-response statistics against the profile's threshold
    #[must_use]
    pub fn get_late_response_statistics(&self) -> PdelayLateResponseStats {
        self.recorder.get_late_response_statistics()
    }

    /// Metrics over the last `window_seconds`, or the full retained history.
    ///
    /// While the session has recorded nothing, an imported snapshot (if
    /// any) is returned instead.
    #[must_use]
    pub fn get_clock_quality_metrics(&self, window_seconds: Option<u32>) -> ClockQualityMetrics {
        if let Some((metrics, _)) = self.imported_if_idle() {
            return metrics;
        }
        let window = window_seconds.unwrap_or(self.recorder.config().retention_seconds);
        self.recorder.compute_metrics(window)
    }

    fn imported_if_idle(&self) -> Option<(ClockQualityMetrics, String)> {
        if self.recorder.event_count() > 0 {
            return None;
        }
        self.imported()
            .as_ref()
            .map(|tlv| (tlv.metrics.clone(), tlv.profile_name.clone()))
    }

    /// Metrics, lock state and source used to judge `profile`.
    ///
    /// Local metrics cover the most recent verdict window, so convergence
    /// before it does not count against accuracy.
    fn evidence(&self, profile: &ComplianceProfile) -> (ClockQualityMetrics, LockState, MetricsSource) {
        if let Some((metrics, profile_name)) = self.imported_if_idle() {
            let lock = LockState {
                consecutive_good: metrics.consecutive_good_measurements,
                streak_start_ns: None,
                locked: metrics.is_locked,
                lock_time_seconds: metrics.is_locked.then_some(metrics.lock_time_seconds),
            };
            return (metrics, lock, MetricsSource::Imported { profile_name });
        }

        let metrics = self
            .recorder
            .compute_metrics(profile.verdict_window_seconds());
        let own = &self.profile;
        let lock = if profile.accuracy_requirement_ns == own.accuracy_requirement_ns
            && profile.lock_streak_length == own.lock_streak_length
        {
            self.recorder.lock_state()
        } else {
            self.recorder
                .lock_state_with(profile.accuracy_requirement_ns, profile.lock_streak_length)
        };
        (metrics, lock, MetricsSource::Local)
    }

    /// Judge this session's measurements against any profile.
    #[must_use]
    pub fn verdict_against(&self, profile: &ComplianceProfile) -> ComplianceVerdict {
        let (metrics, lock, _) = self.evidence(profile);
        ComplianceVerdict::evaluate(profile, &metrics, &lock)
    }

    /// Whether the session meets its own profile.
    #[must_use]
    pub fn validate_certification_compliance(&self) -> bool {
        let verdict = self.verdict_against(&self.profile);
        tracing::debug!(
            profile = %self.profile.name,
            accuracy = verdict.meets_accuracy,
            lock_time = verdict.meets_lock_time,
            stability = verdict.meets_stability,
            "Evaluated certification compliance"
        );
        verdict.is_compliant()
    }

    /// Whether the session meets the Milan preset.
    #[must_use]
    pub fn validate_milan_requirements(&self) -> bool {
        self.verdict_against(&ComplianceProfile::milan())
            .is_compliant()
    }

    /// Whether the session meets the Automotive preset, including its
    /// near-immediate lock requirement.
    #[must_use]
    pub fn validate_automotive_requirements(&self) -> bool {
        self.verdict_against(&ComplianceProfile::automotive())
            .is_compliant()
    }

    /// Collect everything the compliance report shows.
    #[must_use]
    pub fn compliance_report(&self) -> ComplianceReport {
        let (metrics, lock, source) = self.evidence(&self.profile);
        let verdict = ComplianceVerdict::evaluate(&self.profile, &metrics, &lock);
        ComplianceReport {
            profile: (*self.profile).clone(),
            metrics,
            window_seconds: self.profile.verdict_window_seconds(),
            lock,
            verdict,
            source,
            monitoring_enabled: self.is_clock_quality_monitoring_enabled(),
            ascapable: self.is_ascapable(),
            pdelay_successes: self.recorder.pdelay_successes(),
            timeouts: self.get_timeout_statistics(),
            late_responses: self.get_late_response_statistics(),
        }
    }

    /// Render the compliance report as text.
    #[must_use]
    pub fn generate_compliance_report(&self) -> String {
        self.compliance_report().to_string()
    }

    /// Encode the full-history metrics snapshot for external test equipment.
    #[must_use]
    pub fn export_clock_quality_tlv(&self) -> Vec<u8> {
        let metrics = self.get_clock_quality_metrics(None);
        encode_clock_quality(&self.profile.name, &metrics)
    }

    /// Decode a snapshot and install it in this session.
    ///
    /// The installed snapshot is reported while this session has no local
    /// measurements. A rejected buffer leaves the session unchanged.
    ///
    /// # Errors
    ///
    /// Returns a TLV error if the buffer is truncated or malformed.
    pub fn import_clock_quality_tlv(&self, data: &[u8]) -> Result<ClockQualityMetrics> {
        let decoded = decode_clock_quality(data).inspect_err(|e| {
            tracing::warn!(error = %e, len = data.len(), "Rejected clock quality TLV");
        })?;
        tracing::debug!(
            profile = %self.profile.name,
            from = %decoded.profile_name,
            "Imported clock quality snapshot"
        );
        let metrics = decoded.metrics.clone();
        *self.imported() = Some(decoded);
        Ok(metrics)
    }

    /// The most recently imported snapshot
    #[must_use]
    pub fn imported_snapshot(&self) -> Option<ClockQualityTlv> {
        self.imported().clone()
    }
}

impl std::fmt::Debug for ProfileSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileSession")
            .field("profile", &self.profile.name)
            .field("monitoring", &self.is_clock_quality_monitoring_enabled())
            .field("recorder", &self.recorder)
            .finish_non_exhaustive()
    }
}
