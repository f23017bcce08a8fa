//! Ingress monitoring: event recording, windowed statistics, lock
//! detection and PDelay/asCapable tracking.

pub mod ascapable;
pub mod lock;
pub mod pdelay;
pub mod recorder;
pub mod window;

#[cfg(test)]
mod tests;

pub use ascapable::{AsCapablePolicy, AsCapableTracker, evaluate_ascapable_threshold};
pub use lock::{LockDetector, LockState};
pub use pdelay::{
    LateResponseInfo, PdelayLateResponseStats, PdelayOutcome, PdelayTimeoutStats, PdelayTracker,
};
pub use recorder::IngressEventRecorder;
pub use window::{WindowStats, analyze};
