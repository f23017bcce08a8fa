use std::io;
use thiserror::Error;

use crate::tlv::TlvError;

/// Errors that can occur during clock quality operations
#[derive(Debug, Error)]
pub enum ClockQualityError {
    /// TLV buffer could not be decoded
    #[error("TLV decode error: {0}")]
    Tlv(#[from] TlvError),

    // ===== Configuration Errors =====
    /// A configuration value is out of range or inconsistent
    #[error("invalid configuration: {field} - {message}")]
    InvalidConfig {
        /// The offending field
        field: String,
        /// Description of the problem
        message: String,
    },

    /// No preset exists with the given name
    #[error("unknown profile: {name}")]
    UnknownProfile {
        /// The requested profile name
        name: String,
    },

    /// Measurement method string could not be parsed
    #[error("unknown measurement method: {value}")]
    UnknownMeasurementMethod {
        /// The string that failed to parse
        value: String,
    },

    // ===== I/O Errors =====
    /// Configuration file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration (de)serialization failed
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the failure
        message: String,
    },
}

impl ClockQualityError {
    /// Check if this error came from decoding an external buffer
    #[must_use]
    pub fn is_decode_error(&self) -> bool {
        matches!(self, Self::Tlv(_))
    }

    /// Check if this error indicates bad caller-supplied configuration
    #[must_use]
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidConfig { .. }
                | Self::UnknownProfile { .. }
                | Self::UnknownMeasurementMethod { .. }
        )
    }

    pub(crate) fn invalid_config(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ClockQualityError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Result type alias for clock quality operations
pub type Result<T> = std::result::Result<T, ClockQualityError>;
