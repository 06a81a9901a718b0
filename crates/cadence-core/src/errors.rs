//! Unified error system for Cadence
//!
//! A single error type shared by every layer. Per-concern errors (time, motion,
//! lease, validation) convert into it so callers can use `?` across crate seams.

use serde::{Deserialize, Serialize};

/// Unified error type for all Cadence operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum CadenceError {
    /// Invalid input or configuration
    #[error("Invalid: {message}")]
    Invalid {
        /// Error message describing the invalid input
        message: String,
    },

    /// Resource not found
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Lease or ownership check denied the operation
    #[error("Permission denied: {message}")]
    PermissionDenied {
        /// Error message describing the ownership issue
        message: String,
    },

    /// The motion controller rejected or failed a command
    #[error("Motion controller error: {message}")]
    Motion {
        /// Error message describing the controller failure
        message: String,
    },

    /// Lease arbiter could not be reached or answered inconsistently
    #[error("Lease error: {message}")]
    Lease {
        /// Error message describing the lease failure
        message: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message describing the serialization failure
        message: String,
    },

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {message}")]
    Config {
        /// Error message describing the configuration issue
        message: String,
    },

    /// Internal system error
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl CadenceError {
    /// Create an invalid input error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a permission denied error
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a motion controller error
    pub fn motion(message: impl Into<String>) -> Self {
        Self::Motion {
            message: message.into(),
        }
    }

    /// Create a lease error
    pub fn lease(message: impl Into<String>) -> Self {
        Self::Lease {
            message: message.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Standard Result type for Cadence operations
pub type Result<T> = std::result::Result<T, CadenceError>;

impl From<serde_json::Error> for CadenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<toml::de::Error> for CadenceError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(err.to_string())
    }
}

impl From<std::io::Error> for CadenceError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::not_found(err.to_string()),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(err.to_string()),
            _ => Self::internal(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = CadenceError::invalid("test message");
        assert!(matches!(err, CadenceError::Invalid { .. }));
        assert_eq!(err.to_string(), "Invalid: test message");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "catalog.toml");
        let err = CadenceError::from(io_err);
        assert!(matches!(err, CadenceError::NotFound { .. }));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        assert!(matches!(
            CadenceError::from(json_err),
            CadenceError::Serialization { .. }
        ));
    }
}
