//! Compliance profiles, per-session certification and reporting.

pub mod params;
pub mod report;
pub mod session;

#[cfg(test)]
mod tests;

pub use params::{
    ComplianceProfile, IMMEDIATE_LOCK_TIME_SECONDS, PRESET_LOCK_STREAK_LENGTH, ProfileKind,
    VERDICT_WINDOW_SECONDS,
};
pub use report::{ComplianceReport, ComplianceVerdict, MetricsSource};
pub use session::ProfileSession;
