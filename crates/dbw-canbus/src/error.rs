//! CAN bus error types.

use thiserror::Error;

/// Errors that can occur during CAN bus operations.
#[derive(Debug, Error)]
pub enum CanError {
    #[error("CAN interface error: {0}")]
    Interface(String),

    #[error("failed to open CAN channel {channel}: {reason}")]
    Open { channel: String, reason: String },

    #[error("CAN bus is closed")]
    Closed,

    #[error("Response timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Invalid send parameters: {0}")]
    InvalidParams(String),
}

/// Convenience alias for CAN bus results.
pub type CanResult<T> = Result<T, CanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = CanError::Timeout { timeout_ms: 100 };
        assert_eq!(err.to_string(), "Response timeout after 100ms");

        let err = CanError::Open {
            channel: "can0".into(),
            reason: "No such device".into(),
        };
        assert_eq!(
            err.to_string(),
            "failed to open CAN channel can0: No such device"
        );
    }
}
