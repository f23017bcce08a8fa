//! # gptp-clock-quality
//!
//! Clock quality measurement and certification for gPTP (IEEE 802.1AS).
//!
//! ## Features
//!
//! - Windowed time error statistics from Sync ingress timestamps
//! - Lock detection with configurable bound and streak length
//! - PDelay lost/late response tracking and asCapable evaluation
//! - Milan, Automotive, AVnu Base and Standard compliance profiles
//! - Text compliance reports and a binary TLV snapshot for test equipment
//!
//! ## Example
//!
//! ```rust
//! use gptp_clock_quality::{ClockQualityMeasurement, ProfileKind, ProfileSession};
//!
//! let session = ProfileSession::preset(ProfileKind::Milan);
//! session.enable_monitoring();
//!
//! for i in 0..640u64 {
//!     let timestamp_ns = 1_000_000_000 + i * 125_000_000;
//!     session.record_clock_quality_measurement(&ClockQualityMeasurement::new(12, timestamp_ns));
//! }
//!
//! let metrics = session.get_clock_quality_metrics(Some(60));
//! assert_eq!(metrics.mean_time_error_ns, 12);
//! assert!(session.validate_certification_compliance());
//!
//! let tlv = session.export_clock_quality_tlv();
//! let peer = ProfileSession::preset(ProfileKind::Standard);
//! peer.import_clock_quality_tlv(&tlv).unwrap();
//! ```
//!
//! # Architecture
//!
//! Data flows one way:
//!
//! - **monitor**: `IngressEventRecorder` turns raw events into metrics
//! - **profile**: `ProfileSession` judges metrics against a `ComplianceProfile`
//! - **tlv**: snapshots are exchanged independently of both

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
/// Error types
pub mod error;
/// Core types
pub mod types;

pub mod monitor;
pub mod profile;
pub mod tlv;

// Re-exports
pub use error::{ClockQualityError, Result};
pub use monitor::{AsCapablePolicy, IngressEventRecorder, LockState, PdelayOutcome};
pub use profile::{ComplianceProfile, ComplianceReport, ComplianceVerdict, ProfileKind, ProfileSession};
pub use tlv::{ClockQualityTlv, TlvError};
pub use types::{
    ClockQualityConfig, ClockQualityMeasurement, ClockQualityMetrics, MeasurementMethod,
    PDelayExchange, SyncIngressEvent,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude for common imports
///
/// Convenient re-exports
pub mod prelude {
    pub use crate::{
        ClockQualityConfig, ClockQualityError, ClockQualityMeasurement, ClockQualityMetrics,
        ComplianceProfile, IngressEventRecorder, MeasurementMethod, ProfileKind, ProfileSession,
    };
}
