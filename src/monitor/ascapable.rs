//! asCapable evaluation against the neighborPropDelay threshold.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// How a port reacts when neighborPropDelay exceeds its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AsCapablePolicy {
    /// De-assert asCapable as soon as the threshold is exceeded.
    #[default]
    Strict,
    /// Tolerate excursions; asCapable is never forced false by delay alone.
    Flexible,
}

/// Evaluate asCapable for a single neighborPropDelay measurement.
///
/// Under [`AsCapablePolicy::Strict`] the result is `false` once
/// `|measured_delay_ns| > threshold_ns`; otherwise `current_ascapable` is
/// returned unchanged.
#[must_use]
pub fn evaluate_ascapable_threshold(
    policy: AsCapablePolicy,
    current_ascapable: bool,
    measured_delay_ns: i64,
    threshold_ns: i64,
) -> bool {
    match policy {
        AsCapablePolicy::Strict => {
            if measured_delay_ns.unsigned_abs() > threshold_ns.unsigned_abs() {
                false
            } else {
                current_ascapable
            }
        }
        AsCapablePolicy::Flexible => current_ascapable,
    }
}

/// Tracks asCapable from PDelay successes and neighborPropDelay samples.
#[derive(Debug, Clone)]
pub struct AsCapableTracker {
    policy: AsCapablePolicy,
    threshold_ns: i64,
    required_successes: u32,
    successes: u32,
    delay_exceeded: bool,
    samples: VecDeque<u64>,
}

impl AsCapableTracker {
    /// Number of neighborPropDelay samples kept.
    pub const SAMPLE_HISTORY: usize = 64;

    /// Create a tracker.
    ///
    /// With `required_successes == 0` asCapable is asserted immediately.
    #[must_use]
    pub fn new(policy: AsCapablePolicy, threshold_ns: i64, required_successes: u32) -> Self {
        Self {
            policy,
            threshold_ns,
            required_successes,
            successes: 0,
            delay_exceeded: false,
            samples: VecDeque::with_capacity(Self::SAMPLE_HISTORY),
        }
    }

    /// Count a successful PDelay exchange.
    pub fn record_success(&mut self) {
        self.successes = self.successes.saturating_add(1);
    }

    /// Count a lost PDelay response; restarts the success run.
    pub fn record_loss(&mut self) {
        self.successes = 0;
    }

    /// Feed a neighborPropDelay sample and return the resulting asCapable.
    pub fn record_neighbor_prop_delay(&mut self, delay_ns: u64) -> bool {
        if self.samples.len() >= Self::SAMPLE_HISTORY {
            self.samples.pop_front();
        }
        self.samples.push_back(delay_ns);

        let measured = i64::try_from(delay_ns).unwrap_or(i64::MAX);
        self.delay_exceeded =
            !evaluate_ascapable_threshold(self.policy, true, measured, self.threshold_ns);
        if self.delay_exceeded {
            tracing::debug!(
                delay_ns,
                threshold_ns = self.threshold_ns,
                "neighborPropDelay above threshold, asCapable de-asserted"
            );
        }
        self.is_ascapable()
    }

    fn qualified(&self) -> bool {
        self.successes >= self.required_successes
    }

    /// Current asCapable state.
    #[must_use]
    pub fn is_ascapable(&self) -> bool {
        self.qualified() && !self.delay_exceeded
    }

    /// Successful exchanges in the current run.
    #[must_use]
    pub fn successes(&self) -> u32 {
        self.successes
    }

    /// Most recent neighborPropDelay sample.
    #[must_use]
    pub fn last_neighbor_prop_delay(&self) -> Option<u64> {
        self.samples.back().copied()
    }

    /// Mean of retained neighborPropDelay samples.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_neighbor_prop_delay(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let sum: u128 = self.samples.iter().map(|&d| u128::from(d)).sum();
        Some(sum as f64 / self.samples.len() as f64)
    }

    /// Configured policy.
    #[must_use]
    pub fn policy(&self) -> AsCapablePolicy {
        self.policy
    }

    /// Clear all state.
    pub fn reset(&mut self) {
        self.successes = 0;
        self.delay_exceeded = false;
        self.samples.clear();
    }
}
