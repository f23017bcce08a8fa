use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ClockQualityError, Result};
use crate::monitor::AsCapablePolicy;
use crate::types::MeasurementMethod;

/// Environment variable overriding the measurement method
pub const ENV_METHOD: &str = "GPTP_CLOCK_QUALITY_METHOD";
/// Environment variable overriding the measurement interval (ms)
pub const ENV_INTERVAL: &str = "GPTP_CLOCK_QUALITY_INTERVAL";
/// Environment variable overriding the analysis window (s)
pub const ENV_WINDOW: &str = "GPTP_CLOCK_QUALITY_WINDOW";

/// Configuration for clock quality recording and analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockQualityConfig {
    /// Nominal interval between measurements (default: 125ms)
    pub measurement_interval_ms: u32,

    /// Default analysis window (default: 300 seconds)
    pub analysis_window_seconds: u32,

    /// How long events are retained; the longest supported window (default: 300 seconds)
    pub retention_seconds: u32,

    /// Method used to obtain samples (default: ingress reporting)
    pub measurement_method: MeasurementMethod,

    /// Time error bound for a "good" measurement (default: 80ns)
    pub accuracy_bound_ns: i64,

    /// Consecutive good measurements needed for lock (default: 20)
    pub lock_streak_length: u32,

    /// Maximum acceptable lock time (default: 6 seconds)
    pub max_lock_time_seconds: u32,

    /// Minimum observation span for stability (default: 300 seconds)
    pub stability_window_seconds: u32,

    /// Maximum standard deviation considered stable (default: 40ns)
    pub max_stability_std_dev_ns: f64,

    /// Pending `Pdelay_Req` without response after this long is lost (default: 100ms)
    pub pdelay_timeout_ms: u32,

    /// Responses slower than this are late (default: 10ms)
    pub late_response_threshold_ms: u32,

    /// neighborPropDelay threshold for asCapable (default: 800us)
    pub neighbor_prop_delay_threshold_ns: i64,

    /// Behavior when neighborPropDelay exceeds the threshold (default: strict)
    pub ascapable_policy: AsCapablePolicy,

    /// Successful PDelay exchanges before asCapable is asserted (default: 2)
    pub min_pdelay_successes: u32,
}

impl Default for ClockQualityConfig {
    fn default() -> Self {
        Self {
            measurement_interval_ms: 125,
            analysis_window_seconds: 300,
            retention_seconds: 300,
            measurement_method: MeasurementMethod::IngressReporting,
            accuracy_bound_ns: 80,
            lock_streak_length: 20,
            max_lock_time_seconds: 6,
            stability_window_seconds: 300,
            max_stability_std_dev_ns: 40.0,
            pdelay_timeout_ms: 100,
            late_response_threshold_ms: 10,
            neighbor_prop_delay_threshold_ns: 800_000,
            ascapable_policy: AsCapablePolicy::Strict,
            min_pdelay_successes: 2,
        }
    }
}

impl ClockQualityConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> ClockQualityConfigBuilder {
        ClockQualityConfigBuilder::default()
    }

    /// Check the configuration for out-of-range or inconsistent values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.measurement_interval_ms == 0 {
            return Err(ClockQualityError::invalid_config(
                "measurement_interval_ms",
                "must be non-zero",
            ));
        }
        if self.analysis_window_seconds == 0 {
            return Err(ClockQualityError::invalid_config(
                "analysis_window_seconds",
                "must be non-zero",
            ));
        }
        if self.retention_seconds < self.analysis_window_seconds {
            return Err(ClockQualityError::invalid_config(
                "retention_seconds",
                format!(
                    "{} is shorter than the analysis window ({})",
                    self.retention_seconds, self.analysis_window_seconds
                ),
            ));
        }
        if self.accuracy_bound_ns <= 0 {
            return Err(ClockQualityError::invalid_config(
                "accuracy_bound_ns",
                "must be positive",
            ));
        }
        if self.lock_streak_length == 0 {
            return Err(ClockQualityError::invalid_config(
                "lock_streak_length",
                "must be non-zero",
            ));
        }
        if !self.max_stability_std_dev_ns.is_finite() || self.max_stability_std_dev_ns < 0.0 {
            return Err(ClockQualityError::invalid_config(
                "max_stability_std_dev_ns",
                "must be a non-negative number",
            ));
        }
        if self.late_response_threshold_ms >= self.pdelay_timeout_ms {
            return Err(ClockQualityError::invalid_config(
                "late_response_threshold_ms",
                format!(
                    "{}ms must be below the PDelay timeout ({}ms)",
                    self.late_response_threshold_ms, self.pdelay_timeout_ms
                ),
            ));
        }
        Ok(())
    }

    /// Apply overrides from `GPTP_CLOCK_QUALITY_*` environment variables.
    ///
    /// Returns whether any override was applied.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn apply_env_overrides(&mut self) -> Result<bool> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    pub(crate) fn apply_overrides<F>(&mut self, lookup: F) -> Result<bool>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = false;

        if let Some(value) = lookup(ENV_METHOD) {
            self.measurement_method = value.parse()?;
            applied = true;
        }
        if let Some(value) = lookup(ENV_INTERVAL) {
            self.measurement_interval_ms = value.trim().parse().map_err(|_| {
                ClockQualityError::invalid_config(ENV_INTERVAL, format!("not a number: {value}"))
            })?;
            applied = true;
        }
        if let Some(value) = lookup(ENV_WINDOW) {
            let window: u32 = value.trim().parse().map_err(|_| {
                ClockQualityError::invalid_config(ENV_WINDOW, format!("not a number: {value}"))
            })?;
            self.analysis_window_seconds = window;
            self.retention_seconds = self.retention_seconds.max(window);
            applied = true;
        }

        if applied {
            tracing::debug!(
                method = %self.measurement_method,
                interval_ms = self.measurement_interval_ms,
                window_s = self.analysis_window_seconds,
                "Clock quality config overridden from environment"
            );
        }
        Ok(applied)
    }

    /// Load a configuration from a JSON file and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or fails validation.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        let config: Self = serde_json::from_slice(&bytes)?;
        config.validate()?;
        tracing::info!(path = %path.as_ref().display(), "Loaded clock quality config");
        Ok(config)
    }

    /// Save the configuration as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let bytes = serde_json::to_vec_pretty(self)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Nominal measurement interval in nanoseconds
    #[must_use]
    pub fn measurement_interval_ns(&self) -> u64 {
        u64::from(self.measurement_interval_ms) * 1_000_000
    }
}

/// Builder for `ClockQualityConfig`
#[derive(Debug, Clone, Default)]
pub struct ClockQualityConfigBuilder {
    config: ClockQualityConfig,
}

impl ClockQualityConfigBuilder {
    /// Set nominal measurement interval
    #[must_use]
    pub fn measurement_interval_ms(mut self, interval_ms: u32) -> Self {
        self.config.measurement_interval_ms = interval_ms;
        self
    }

    /// Set default analysis window
    #[must_use]
    pub fn analysis_window_seconds(mut self, seconds: u32) -> Self {
        self.config.analysis_window_seconds = seconds;
        self
    }

    /// Set event retention
    #[must_use]
    pub fn retention_seconds(mut self, seconds: u32) -> Self {
        self.config.retention_seconds = seconds;
        self
    }

    /// Set measurement method
    #[must_use]
    pub fn measurement_method(mut self, method: MeasurementMethod) -> Self {
        self.config.measurement_method = method;
        self
    }

    /// Set accuracy bound for good measurements
    #[must_use]
    pub fn accuracy_bound_ns(mut self, bound_ns: i64) -> Self {
        self.config.accuracy_bound_ns = bound_ns;
        self
    }

    /// Set lock streak length
    #[must_use]
    pub fn lock_streak_length(mut self, length: u32) -> Self {
        self.config.lock_streak_length = length;
        self
    }

    /// Set maximum lock time
    #[must_use]
    pub fn max_lock_time_seconds(mut self, seconds: u32) -> Self {
        self.config.max_lock_time_seconds = seconds;
        self
    }

    /// Set stability observation window and std-dev limit
    #[must_use]
    pub fn stability(mut self, window_seconds: u32, max_std_dev_ns: f64) -> Self {
        self.config.stability_window_seconds = window_seconds;
        self.config.max_stability_std_dev_ns = max_std_dev_ns;
        self
    }

    /// Set PDelay timeout and late response threshold
    #[must_use]
    pub fn pdelay_thresholds(mut self, timeout_ms: u32, late_response_ms: u32) -> Self {
        self.config.pdelay_timeout_ms = timeout_ms;
        self.config.late_response_threshold_ms = late_response_ms;
        self
    }

    /// Set neighborPropDelay threshold and asCapable policy
    #[must_use]
    pub fn ascapable(mut self, threshold_ns: i64, policy: AsCapablePolicy) -> Self {
        self.config.neighbor_prop_delay_threshold_ns = threshold_ns;
        self.config.ascapable_policy = policy;
        self
    }

    /// Set PDelay successes required for asCapable
    #[must_use]
    pub fn min_pdelay_successes(mut self, count: u32) -> Self {
        self.config.min_pdelay_successes = count;
        self
    }

    /// Build the configuration
    #[must_use]
    pub fn build(self) -> ClockQualityConfig {
        self.config
    }
}
