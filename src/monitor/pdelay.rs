//! PDelay request/response bookkeeping and lost/late response detection

use std::collections::{HashMap, VecDeque};

const NANOS_PER_MILLI: u64 = 1_000_000;

/// Classification of a `Pdelay_Resp`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdelayOutcome {
    /// Response arrived within the late-response threshold
    OnTime {
        /// Request-to-response time
        response_time_ns: u64,
    },
    /// Response arrived after the late-response threshold but before timeout
    Late {
        /// Request-to-response time
        response_time_ns: u64,
    },
    /// Response arrived after the timeout; the request was already lost
    TimedOut {
        /// Request-to-response time
        response_time_ns: u64,
    },
    /// No pending request carries this sequence ID
    Unmatched,
    /// Response timestamped before its request
    Invalid,
}

impl PdelayOutcome {
    /// Whether the exchange counts towards asCapable
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::OnTime { .. } | Self::Late { .. })
    }
}

/// Information about a late response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LateResponseInfo {
    /// Sequence ID of the exchange
    pub sequence_id: u16,
    /// Request-to-response time
    pub response_time_ns: u64,
}

/// Lost-response statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PdelayTimeoutStats {
    /// Requests recorded
    pub total_requests: u64,
    /// Requests whose response never arrived in time
    pub total_timeouts: u64,
    /// Requests still awaiting a response and not yet timed out
    pub pending: u64,
    /// Configured timeout
    pub timeout_ms: u32,
}

impl PdelayTimeoutStats {
    /// Fraction of requests lost (0.0 to 1.0)
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        reason = "Precision loss acceptable for ratio calculation"
    )]
    pub fn timeout_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.total_timeouts as f64 / self.total_requests as f64
    }
}

/// Late-response statistics
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PdelayLateResponseStats {
    /// Responses matched to a request
    pub total_responses: u64,
    /// Responses slower than the threshold
    pub total_late_responses: u64,
    /// Responses carrying an unknown sequence ID
    pub unmatched_responses: u64,
    /// Responses timestamped before their request
    pub invalid_responses: u64,
    /// Slowest late response seen
    pub max_late_response_ns: u64,
    /// Configured threshold
    pub threshold_ms: u32,
    /// Most recent late responses
    pub recent: Vec<LateResponseInfo>,
}

/// Tracks outstanding `Pdelay_Req` messages by sequence ID
#[derive(Debug, Clone)]
pub struct PdelayTracker {
    /// Outstanding requests: sequence ID -> request time
    pending: HashMap<u16, u64>,
    timeout_ms: u32,
    late_threshold_ms: u32,
    total_requests: u64,
    total_responses: u64,
    total_timeouts: u64,
    total_late: u64,
    unmatched: u64,
    invalid: u64,
    max_late_response_ns: u64,
    recent_late: VecDeque<LateResponseInfo>,
    max_history: usize,
}

impl PdelayTracker {
    /// Create a new tracker
    #[must_use]
    pub fn new(timeout_ms: u32, late_threshold_ms: u32) -> Self {
        Self {
            pending: HashMap::new(),
            timeout_ms,
            late_threshold_ms,
            total_requests: 0,
            total_responses: 0,
            total_timeouts: 0,
            total_late: 0,
            unmatched: 0,
            invalid: 0,
            max_late_response_ns: 0,
            recent_late: VecDeque::with_capacity(32),
            max_history: 32,
        }
    }

    fn timeout_ns(&self) -> u64 {
        u64::from(self.timeout_ms) * NANOS_PER_MILLI
    }

    fn late_threshold_ns(&self) -> u64 {
        u64::from(self.late_threshold_ms) * NANOS_PER_MILLI
    }

    /// Record a transmitted request.
    ///
    /// Returns how many earlier requests were declared lost as a result,
    /// either because they aged past the timeout or because this request
    /// reuses their sequence ID.
    pub fn record_request(&mut self, sequence_id: u16, request_ns: u64) -> u64 {
        self.total_requests += 1;
        let mut lost = self.expire(request_ns);
        if self.pending.insert(sequence_id, request_ns).is_some() {
            self.total_timeouts += 1;
            lost += 1;
        }
        lost
    }

    /// Record a received response and classify it
    pub fn record_response(&mut self, sequence_id: u16, response_ns: u64) -> PdelayOutcome {
        let Some(request_ns) = self.pending.remove(&sequence_id) else {
            self.unmatched += 1;
            tracing::debug!(sequence_id, "Pdelay_Resp without matching request");
            return PdelayOutcome::Unmatched;
        };

        let Some(response_time_ns) = response_ns.checked_sub(request_ns) else {
            self.invalid += 1;
            tracing::warn!(
                sequence_id,
                request_ns,
                response_ns,
                "Pdelay_Resp precedes its request"
            );
            return PdelayOutcome::Invalid;
        };
        if response_time_ns > self.timeout_ns() {
            self.total_timeouts += 1;
            tracing::debug!(sequence_id, response_time_ns, "Pdelay_Resp after timeout");
            return PdelayOutcome::TimedOut { response_time_ns };
        }

        self.total_responses += 1;
        if response_time_ns > self.late_threshold_ns() {
            self.total_late += 1;
            self.max_late_response_ns = self.max_late_response_ns.max(response_time_ns);
            if self.recent_late.len() >= self.max_history {
                self.recent_late.pop_front();
            }
            self.recent_late.push_back(LateResponseInfo {
                sequence_id,
                response_time_ns,
            });
            tracing::debug!(
                sequence_id,
                response_time_ns,
                threshold_ms = self.late_threshold_ms,
                "Late Pdelay_Resp"
            );
            return PdelayOutcome::Late { response_time_ns };
        }
        PdelayOutcome::OnTime { response_time_ns }
    }

    /// Declare requests older than the timeout at `now_ns` lost.
    ///
    /// Returns the number of requests expired.
    pub fn expire(&mut self, now_ns: u64) -> u64 {
        let timeout_ns = self.timeout_ns();
        let before = self.pending.len();
        self.pending
            .retain(|_, &mut request_ns| now_ns.saturating_sub(request_ns) <= timeout_ns);
        let expired = (before - self.pending.len()) as u64;
        if expired > 0 {
            self.total_timeouts += expired;
            tracing::debug!(expired, "Pdelay_Req timed out without response");
        }
        expired
    }

    /// Lost-response statistics as of `now_ns`.
    ///
    /// Pending requests already older than the timeout are counted as lost.
    #[must_use]
    pub fn timeout_statistics(&self, now_ns: u64) -> PdelayTimeoutStats {
        let timeout_ns = self.timeout_ns();
        let overdue = self
            .pending
            .values()
            .filter(|&&request_ns| now_ns.saturating_sub(request_ns) > timeout_ns)
            .count() as u64;
        PdelayTimeoutStats {
            total_requests: self.total_requests,
            total_timeouts: self.total_timeouts + overdue,
            pending: self.pending.len() as u64 - overdue,
            timeout_ms: self.timeout_ms,
        }
    }

    /// Late-response statistics
    #[must_use]
    pub fn late_response_statistics(&self) -> PdelayLateResponseStats {
        PdelayLateResponseStats {
            total_responses: self.total_responses,
            total_late_responses: self.total_late,
            unmatched_responses: self.unmatched,
            invalid_responses: self.invalid,
            max_late_response_ns: self.max_late_response_ns,
            threshold_ms: self.late_threshold_ms,
            recent: self.recent_late.iter().copied().collect(),
        }
    }

    /// Reset the tracker
    pub fn reset(&mut self) {
        self.pending.clear();
        self.total_requests = 0;
        self.total_responses = 0;
        self.total_timeouts = 0;
        self.total_late = 0;
        self.unmatched = 0;
        self.invalid = 0;
        self.max_late_response_ns = 0;
        self.recent_late.clear();
    }
}
