//! Core types module

pub mod config;
pub mod event;
pub mod metrics;

#[cfg(test)]
mod tests;

pub use config::{ClockQualityConfig, ClockQualityConfigBuilder};
pub use event::{
    ClockQualityMeasurement, MAX_PLAUSIBLE_TIME_ERROR_NS, PDelayExchange, SyncIngressEvent,
};
pub use metrics::{ClockQualityMetrics, MeasurementMethod};
