//! Named compliance profiles and their parameters.

use serde::{Deserialize, Serialize};

use crate::error::{ClockQualityError, Result};
use crate::monitor::AsCapablePolicy;
use crate::types::ClockQualityConfig;

/// Lock time allowed for profiles that require immediate asCapable.
pub const IMMEDIATE_LOCK_TIME_SECONDS: u32 = 1;

/// Lock streak shared by every preset.
///
/// Presets differ only in the bound a sample must meet, so a tighter
/// profile can never lock before a looser one. Eight 125 ms Sync samples
/// fit inside the immediate lock budget.
pub const PRESET_LOCK_STREAK_LENGTH: u32 = 8;

/// Shortest window every verdict is evaluated over.
///
/// Profiles judging the same stream see the same samples; a profile's
/// `min_stability_window_seconds` only sets how much of it must be observed.
pub const VERDICT_WINDOW_SECONDS: u32 = 60;

/// Known interoperability profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    /// Avnu Milan (pro/consumer audio)
    Milan,
    /// Automotive Ethernet AVB
    Automotive,
    /// Avnu base/ProAV functional interoperability
    AvnuBase,
    /// Plain IEEE 802.1AS
    Standard,
}

impl ProfileKind {
    /// All profiles
    pub const ALL: [Self; 4] = [Self::Milan, Self::Automotive, Self::AvnuBase, Self::Standard];

    /// Configuration key (`"milan"`, `"avnu-base"`, ...)
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::Milan => "milan",
            Self::Automotive => "automotive",
            Self::AvnuBase => "avnu-base",
            Self::Standard => "standard",
        }
    }

    /// Display name used in reports and TLV exchange
    #[must_use]
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Milan => "Milan",
            Self::Automotive => "Automotive",
            Self::AvnuBase => "AVnu Base",
            Self::Standard => "Standard",
        }
    }
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for ProfileKind {
    type Err = ClockQualityError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|k| k.key() == normalized)
            .ok_or_else(|| ClockQualityError::UnknownProfile {
                name: s.to_string(),
            })
    }
}

/// Parameter set a clock is certified against.
///
/// Profiles are plain values. A session shares one behind an `Arc` and
/// never mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceProfile {
    /// Which preset this profile derives from
    pub kind: ProfileKind,
    /// Name shown in reports
    pub name: String,
    /// Every sample must lie within `±accuracy_requirement_ns`
    pub accuracy_requirement_ns: i64,
    /// `Pdelay_Resp` slower than this is late
    pub late_response_threshold_ms: u32,
    /// Lock must be achieved within this many seconds
    pub max_lock_time_seconds: u32,
    /// Minimum observation span for the stability verdict
    pub min_stability_window_seconds: u32,
    /// asCapable without waiting for PDelay successes
    pub requires_immediate_ascapable: bool,
    /// neighborPropDelay threshold for asCapable
    pub neighbor_prop_delay_threshold_ns: i64,
    /// Tolerate neighborPropDelay excursions
    pub flexible_threshold_policy: bool,
    /// Fewest PDelay successes before asCapable
    pub min_pdelay_successes: u32,
    /// Most PDelay successes an implementation may wait for
    pub max_pdelay_successes: u32,
    /// Consecutive in-bound samples that constitute lock
    pub lock_streak_length: u32,
    /// log2 of the Sync interval in seconds
    pub sync_interval_log: i8,
    /// log2 of the PDelay interval in seconds
    pub pdelay_interval_log: i8,
    /// log2 of the Announce interval in seconds
    pub announce_interval_log: i8,
}

impl ComplianceProfile {
    /// Build a preset
    #[must_use]
    pub fn preset(kind: ProfileKind) -> Self {
        match kind {
            ProfileKind::Milan => Self::milan(),
            ProfileKind::Automotive => Self::automotive(),
            ProfileKind::AvnuBase => Self::avnu_base(),
            ProfileKind::Standard => Self::standard(),
        }
    }

    /// Look up a preset by configuration key
    ///
    /// # Errors
    ///
    /// Returns `UnknownProfile` if no preset has that key.
    pub fn from_name(name: &str) -> Result<Self> {
        name.parse().map(Self::preset)
    }

    /// Milan: ±80 ns, lock within 6 s, flexible asCapable
    #[must_use]
    pub fn milan() -> Self {
        Self {
            kind: ProfileKind::Milan,
            name: ProfileKind::Milan.display_name().to_string(),
            accuracy_requirement_ns: 80,
            late_response_threshold_ms: 15,
            max_lock_time_seconds: 6,
            min_stability_window_seconds: 60,
            requires_immediate_ascapable: false,
            neighbor_prop_delay_threshold_ns: 800_000,
            flexible_threshold_policy: true,
            min_pdelay_successes: 2,
            max_pdelay_successes: 10,
            lock_streak_length: PRESET_LOCK_STREAK_LENGTH,
            sync_interval_log: -3,
            pdelay_interval_log: 0,
            announce_interval_log: 1,
        }
    }

    /// Automotive: ±50 ns, immediate asCapable
    #[must_use]
    pub fn automotive() -> Self {
        Self {
            kind: ProfileKind::Automotive,
            name: ProfileKind::Automotive.display_name().to_string(),
            accuracy_requirement_ns: 50,
            late_response_threshold_ms: 15,
            max_lock_time_seconds: 1,
            min_stability_window_seconds: 60,
            requires_immediate_ascapable: true,
            neighbor_prop_delay_threshold_ns: 800_000,
            flexible_threshold_policy: false,
            min_pdelay_successes: 1,
            max_pdelay_successes: 1,
            lock_streak_length: PRESET_LOCK_STREAK_LENGTH,
            sync_interval_log: -3,
            pdelay_interval_log: 0,
            announce_interval_log: 0,
        }
    }

    /// AVnu Base: ±100 ns, 2 to 10 PDelay successes
    #[must_use]
    pub fn avnu_base() -> Self {
        Self {
            kind: ProfileKind::AvnuBase,
            name: ProfileKind::AvnuBase.display_name().to_string(),
            accuracy_requirement_ns: 100,
            late_response_threshold_ms: 10,
            max_lock_time_seconds: 10,
            min_stability_window_seconds: 30,
            requires_immediate_ascapable: false,
            neighbor_prop_delay_threshold_ns: 800_000,
            flexible_threshold_policy: true,
            min_pdelay_successes: 2,
            max_pdelay_successes: 10,
            lock_streak_length: PRESET_LOCK_STREAK_LENGTH,
            sync_interval_log: -3,
            pdelay_interval_log: 0,
            announce_interval_log: 0,
        }
    }

    /// Plain 802.1AS: ±1 µs
    #[must_use]
    pub fn standard() -> Self {
        Self {
            kind: ProfileKind::Standard,
            name: ProfileKind::Standard.display_name().to_string(),
            accuracy_requirement_ns: 1_000,
            late_response_threshold_ms: 10,
            max_lock_time_seconds: 10,
            min_stability_window_seconds: 60,
            requires_immediate_ascapable: false,
            neighbor_prop_delay_threshold_ns: 800_000,
            flexible_threshold_policy: false,
            min_pdelay_successes: 2,
            max_pdelay_successes: 2,
            lock_streak_length: PRESET_LOCK_STREAK_LENGTH,
            sync_interval_log: -3,
            pdelay_interval_log: 0,
            announce_interval_log: 0,
        }
    }

    /// Override the accuracy requirement
    #[must_use]
    pub fn with_accuracy_requirement_ns(mut self, accuracy_ns: i64) -> Self {
        self.accuracy_requirement_ns = accuracy_ns;
        self
    }

    /// Override the maximum lock time
    #[must_use]
    pub fn with_max_lock_time_seconds(mut self, seconds: u32) -> Self {
        self.max_lock_time_seconds = seconds;
        self
    }

    /// Override the minimum stability window
    #[must_use]
    pub fn with_min_stability_window_seconds(mut self, seconds: u32) -> Self {
        self.min_stability_window_seconds = seconds;
        self
    }

    /// Override the late-response threshold
    #[must_use]
    pub fn with_late_response_threshold_ms(mut self, threshold_ms: u32) -> Self {
        self.late_response_threshold_ms = threshold_ms;
        self
    }

    /// Override the PDelay success bounds
    #[must_use]
    pub fn with_pdelay_successes(mut self, min: u32, max: u32) -> Self {
        self.min_pdelay_successes = min;
        self.max_pdelay_successes = max;
        self
    }

    /// Override the lock streak length
    #[must_use]
    pub fn with_lock_streak_length(mut self, length: u32) -> Self {
        self.lock_streak_length = length;
        self
    }

    /// Rename the profile
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the parameters for consistency.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(ClockQualityError::invalid_config("name", "must not be empty"));
        }
        if self.accuracy_requirement_ns <= 0 {
            return Err(ClockQualityError::invalid_config(
                "accuracy_requirement_ns",
                "must be positive",
            ));
        }
        if self.neighbor_prop_delay_threshold_ns <= 0 {
            return Err(ClockQualityError::invalid_config(
                "neighbor_prop_delay_threshold_ns",
                "must be positive",
            ));
        }
        if self.min_pdelay_successes > self.max_pdelay_successes {
            return Err(ClockQualityError::invalid_config(
                "min_pdelay_successes",
                format!(
                    "{} exceeds max_pdelay_successes ({})",
                    self.min_pdelay_successes, self.max_pdelay_successes
                ),
            ));
        }
        if self.lock_streak_length == 0 {
            return Err(ClockQualityError::invalid_config(
                "lock_streak_length",
                "must be non-zero",
            ));
        }
        if self.min_stability_window_seconds == 0 {
            return Err(ClockQualityError::invalid_config(
                "min_stability_window_seconds",
                "must be non-zero",
            ));
        }
        if !(-7..=7).contains(&self.sync_interval_log) {
            return Err(ClockQualityError::invalid_config(
                "sync_interval_log",
                format!("{} is outside -7..=7", self.sync_interval_log),
            ));
        }
        Ok(())
    }

    /// asCapable policy for neighborPropDelay excursions
    #[must_use]
    pub fn ascapable_policy(&self) -> AsCapablePolicy {
        if self.flexible_threshold_policy {
            AsCapablePolicy::Flexible
        } else {
            AsCapablePolicy::Strict
        }
    }

    /// Largest standard deviation that still counts as stable
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        reason = "Accuracy requirements are far below 2^52"
    )]
    pub fn stability_std_dev_limit_ns(&self) -> f64 {
        self.accuracy_requirement_ns as f64 / 2.0
    }

    /// Window a verdict for this profile is evaluated over
    #[must_use]
    pub fn verdict_window_seconds(&self) -> u32 {
        VERDICT_WINDOW_SECONDS.max(self.min_stability_window_seconds)
    }

    /// Lock time bound including the immediate-asCapable restriction
    #[must_use]
    pub fn effective_max_lock_time_seconds(&self) -> u32 {
        if self.requires_immediate_ascapable {
            self.max_lock_time_seconds.min(IMMEDIATE_LOCK_TIME_SECONDS)
        } else {
            self.max_lock_time_seconds
        }
    }

    /// PDelay successes required before asserting asCapable
    #[must_use]
    pub fn required_pdelay_successes(&self) -> u32 {
        if self.requires_immediate_ascapable {
            0
        } else {
            self.min_pdelay_successes
        }
    }

    /// Whether asserting asCapable after `count` successes is allowed
    #[must_use]
    pub fn accepts_pdelay_success_count(&self, count: u32) -> bool {
        (self.min_pdelay_successes..=self.max_pdelay_successes).contains(&count)
    }

    /// Sync interval in milliseconds
    #[must_use]
    pub fn nominal_sync_interval_ms(&self) -> u32 {
        interval_ms(self.sync_interval_log)
    }

    /// PDelay interval in milliseconds
    #[must_use]
    pub fn nominal_pdelay_interval_ms(&self) -> u32 {
        interval_ms(self.pdelay_interval_log)
    }

    /// Announce interval in milliseconds
    #[must_use]
    pub fn nominal_announce_interval_ms(&self) -> u32 {
        interval_ms(self.announce_interval_log)
    }

    /// Recorder configuration for a session running this profile.
    ///
    /// Profile thresholds replace the corresponding fields of `base`; the
    /// analysis window and retention are widened to cover the verdict
    /// window. A measurement interval that differs from the default (for
    /// example one set through `GPTP_CLOCK_QUALITY_INTERVAL`) is kept,
    /// otherwise the profile's Sync interval applies.
    #[must_use]
    pub fn recorder_config(&self, base: &ClockQualityConfig) -> ClockQualityConfig {
        let window = base
            .analysis_window_seconds
            .max(self.verdict_window_seconds());
        let measurement_interval_ms =
            if base.measurement_interval_ms == ClockQualityConfig::default().measurement_interval_ms {
                self.nominal_sync_interval_ms()
            } else {
                base.measurement_interval_ms
            };
        ClockQualityConfig {
            measurement_interval_ms,
            analysis_window_seconds: window,
            retention_seconds: base.retention_seconds.max(window),
            accuracy_bound_ns: self.accuracy_requirement_ns,
            lock_streak_length: self.lock_streak_length,
            max_lock_time_seconds: self.effective_max_lock_time_seconds(),
            stability_window_seconds: self.min_stability_window_seconds,
            max_stability_std_dev_ns: self.stability_std_dev_limit_ns(),
            late_response_threshold_ms: self.late_response_threshold_ms,
            pdelay_timeout_ms: base
                .pdelay_timeout_ms
                .max(self.late_response_threshold_ms.saturating_add(1)),
            neighbor_prop_delay_threshold_ns: self.neighbor_prop_delay_threshold_ns,
            ascapable_policy: self.ascapable_policy(),
            min_pdelay_successes: self.required_pdelay_successes(),
            ..base.clone()
        }
    }
}

impl Default for ComplianceProfile {
    fn default() -> Self {
        Self::standard()
    }
}

fn interval_ms(log: i8) -> u32 {
    let scale = 2u32.checked_pow(u32::from(log.unsigned_abs()));
    if log >= 0 {
        scale
            .and_then(|s| s.checked_mul(1_000))
            .unwrap_or(u32::MAX)
    } else {
        scale.map_or(0, |s| 1_000 / s).max(1)
    }
}
