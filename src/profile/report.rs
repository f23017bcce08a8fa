//! Compliance verdicts and the human-readable report.

use std::fmt;

use super::params::ComplianceProfile;
use crate::monitor::{LockState, PdelayLateResponseStats, PdelayTimeoutStats};
use crate::types::ClockQualityMetrics;

/// Pass/fail verdict of one profile over one metrics snapshot
#[derive(Debug, Clone, PartialEq)]
pub struct ComplianceVerdict {
    /// Profile the verdict was evaluated against
    pub profile_name: String,
    /// Every sample within the profile's accuracy requirement
    pub meets_accuracy: bool,
    /// Locked no later than the profile allows
    pub meets_lock_time: bool,
    /// Observed long enough with low enough variance
    pub meets_stability: bool,
}

impl ComplianceVerdict {
    /// Evaluate `metrics` and `lock` against `profile`.
    ///
    /// An empty snapshot fails every requirement.
    #[must_use]
    pub fn evaluate(
        profile: &ComplianceProfile,
        metrics: &ClockQualityMetrics,
        lock: &LockState,
    ) -> Self {
        let has_data = metrics.total_measurements > 0;
        let bound = profile.accuracy_requirement_ns.unsigned_abs();
        let meets_accuracy = has_data
            && metrics.max_time_error_ns.unsigned_abs() <= bound
            && metrics.min_time_error_ns.unsigned_abs() <= bound;
        let meets_lock_time = lock.locked
            && lock
                .lock_time_seconds
                .is_some_and(|t| t <= profile.effective_max_lock_time_seconds());
        let meets_stability = has_data
            && metrics.observation_window_seconds >= profile.min_stability_window_seconds
            && metrics.std_dev_ns <= profile.stability_std_dev_limit_ns();

        Self {
            profile_name: profile.name.clone(),
            meets_accuracy,
            meets_lock_time,
            meets_stability,
        }
    }

    /// Whether every requirement holds
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.meets_accuracy && self.meets_lock_time && self.meets_stability
    }
}

/// Where the reported metrics came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsSource {
    /// Measurements recorded by this session
    Local,
    /// Snapshot imported from a peer
    Imported {
        /// Profile name carried by the snapshot
        profile_name: String,
    },
}

/// Everything the text report shows
#[derive(Debug, Clone)]
pub struct ComplianceReport {
    /// Profile the session runs
    pub profile: ComplianceProfile,
    /// Snapshot over the analysis window
    pub metrics: ClockQualityMetrics,
    /// Requested analysis window
    pub window_seconds: u32,
    /// Lock state used for the verdict
    pub lock: LockState,
    /// Verdict for the session's profile
    pub verdict: ComplianceVerdict,
    /// Origin of `metrics`
    pub source: MetricsSource,
    /// Session monitoring flag
    pub monitoring_enabled: bool,
    /// Current asCapable
    pub ascapable: bool,
    /// PDelay successes in the current run
    pub pdelay_successes: u32,
    /// Lost-response statistics
    pub timeouts: PdelayTimeoutStats,
    /// Late-response statistics
    pub late_responses: PdelayLateResponseStats,
}

fn pass_fail(ok: bool) -> &'static str {
    if ok { "PASS" } else { "FAIL" }
}

fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}

impl fmt::Display for ComplianceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.profile;
        let m = &self.metrics;

        writeln!(f, "=== gPTP Clock Quality Compliance Report ===")?;
        writeln!(f, "Profile: {} ({})", p.name, p.kind.key())?;
        writeln!(f, "Measurement Method: {}", m.measurement_method)?;
        writeln!(
            f,
            "Monitoring: {}",
            if self.monitoring_enabled { "enabled" } else { "disabled" }
        )?;
        match &self.source {
            MetricsSource::Local => writeln!(f, "Source: local measurements")?,
            MetricsSource::Imported { profile_name } => {
                writeln!(f, "Source: imported snapshot ({profile_name})")?;
            }
        }
        writeln!(
            f,
            "Sync Interval: {} ms, PDelay Interval: {} ms, Announce Interval: {} ms",
            p.nominal_sync_interval_ms(),
            p.nominal_pdelay_interval_ms(),
            p.nominal_announce_interval_ms()
        )?;
        writeln!(f)?;

        writeln!(f, "--- Time Error Statistics ---")?;
        writeln!(f, "Analysis Window: {} s", self.window_seconds)?;
        writeln!(f, "Observation Window: {} s", m.observation_window_seconds)?;
        writeln!(
            f,
            "Measurements: {} valid, {} invalid",
            m.total_measurements, m.invalid_measurements
        )?;
        writeln!(f, "Mean Time Error: {} ns", m.mean_time_error_ns)?;
        writeln!(f, "Max Time Error: {} ns", m.max_time_error_ns)?;
        writeln!(f, "Min Time Error: {} ns", m.min_time_error_ns)?;
        writeln!(f, "Std Deviation: {:.2} ns", m.std_dev_ns)?;
        writeln!(f, "RMS Time Error: {:.2} ns", m.rms_error_ns)?;
        writeln!(f, "Frequency Stability: {:.3} ppb", m.frequency_stability_ppb)?;
        writeln!(f)?;

        writeln!(f, "--- Lock Statistics ---")?;
        writeln!(f, "Locked: {}", yes_no(self.lock.locked))?;
        match self.lock.lock_time_seconds {
            Some(t) => writeln!(
                f,
                "Lock Time: {t} s (limit {} s)",
                p.effective_max_lock_time_seconds()
            )?,
            None => writeln!(
                f,
                "Lock Time: not locked (limit {} s)",
                p.effective_max_lock_time_seconds()
            )?,
        }
        writeln!(
            f,
            "Consecutive Good Measurements: {} (lock after {})",
            self.lock.consecutive_good, p.lock_streak_length
        )?;
        writeln!(f)?;

        writeln!(f, "--- PDelay ---")?;
        writeln!(
            f,
            "asCapable: {} ({} successes, {} to {} required, {} policy)",
            yes_no(self.ascapable),
            self.pdelay_successes,
            p.min_pdelay_successes,
            p.max_pdelay_successes,
            if p.flexible_threshold_policy { "flexible" } else { "strict" }
        )?;
        writeln!(
            f,
            "Lost Responses: {} of {} requests (timeout {} ms)",
            self.timeouts.total_timeouts, self.timeouts.total_requests, self.timeouts.timeout_ms
        )?;
        writeln!(
            f,
            "Late Responses: {} of {} responses (threshold {} ms)",
            self.late_responses.total_late_responses,
            self.late_responses.total_responses,
            self.late_responses.threshold_ms
        )?;
        writeln!(
            f,
            "Unmatched Responses: {}, Invalid Responses: {}",
            self.late_responses.unmatched_responses, self.late_responses.invalid_responses
        )?;
        writeln!(f)?;

        let v = &self.verdict;
        writeln!(f, "--- Compliance ---")?;
        writeln!(
            f,
            "Accuracy (+/-{} ns): {}",
            p.accuracy_requirement_ns,
            pass_fail(v.meets_accuracy)
        )?;
        writeln!(
            f,
            "Lock Time (<= {} s): {}",
            p.effective_max_lock_time_seconds(),
            pass_fail(v.meets_lock_time)
        )?;
        writeln!(
            f,
            "Stability (>= {} s, std dev <= {:.1} ns): {}",
            p.min_stability_window_seconds,
            p.stability_std_dev_limit_ns(),
            pass_fail(v.meets_stability)
        )?;
        writeln!(
            f,
            "80 ns Baseline: {}",
            pass_fail(m.meets_80ns_requirement)
        )?;
        write!(f, "Overall Compliance: {}", pass_fail(v.is_compliant()))
    }
}
