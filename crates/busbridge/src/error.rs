// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by the marshalling engine and the dispatch registry.

use thiserror::Error;

/// Errors returned by busbridge operations.
///
/// Wire and shape errors are fatal to the message or call being processed;
/// registry errors are configuration errors raised at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    // ========================================================================
    // Marshalling Errors
    // ========================================================================
    /// Bytes do not decode to the declared type (truncated buffer, bad length
    /// prefix, invalid discriminant, non-zero padding).
    #[error("Malformed wire data at offset {offset}: {reason}")]
    MalformedWireData { offset: usize, reason: String },

    /// A native value or candidate signature disagrees with a type descriptor.
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Number of top-level values differs from the declared argument count.
    #[error("Argument count mismatch: expected {expected}, found {found}")]
    ArgumentCountMismatch { expected: usize, found: usize },

    /// A wire-format bound (array or string length) was exceeded while encoding.
    #[error("Encoding overflow: {0}")]
    EncodingOverflow(String),

    /// A signature string is not a valid sequence of complete types.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// A bus, interface or member name or an object path is malformed.
    #[error("Invalid name: {0}")]
    InvalidName(String),

    // ========================================================================
    // Registry Errors
    // ========================================================================
    /// Notification name was never bound to a signal.
    #[error("Unknown notification name: {0}")]
    UnknownNotificationName(String),

    /// Notification name is already bound to a different signal.
    #[error("Notification name '{name}' already bound to {existing_interface}.{existing_signal}")]
    NotificationNameConflict {
        name: String,
        existing_signal: String,
        existing_interface: String,
    },

    /// Argument filter cannot apply to the signal it was registered for.
    #[error("Invalid argument filter: {0}")]
    InvalidFilter(String),

    // ========================================================================
    // Collaborator Errors
    // ========================================================================
    /// The transport collaborator refused a frame or match rule.
    #[error("Transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Shorthand for [`Error::MalformedWireData`].
    pub(crate) fn malformed(offset: usize, reason: impl Into<String>) -> Self {
        Error::MalformedWireData {
            offset,
            reason: reason.into(),
        }
    }

    /// True for errors caused by the bytes of an incoming frame.
    pub fn is_wire_error(&self) -> bool {
        matches!(
            self,
            Error::MalformedWireData { .. } | Error::ArgumentCountMismatch { .. }
        )
    }
}

/// Convenient alias for API results using the crate `Error` type.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = Error::malformed(12, "unexpected end of buffer");
        assert_eq!(
            err.to_string(),
            "Malformed wire data at offset 12: unexpected end of buffer"
        );

        let err = Error::ArgumentCountMismatch {
            expected: 2,
            found: 1,
        };
        assert_eq!(err.to_string(), "Argument count mismatch: expected 2, found 1");

        let err = Error::NotificationNameConflict {
            name: "ClockTicked".into(),
            existing_signal: "Tick".into(),
            existing_interface: "org.demo.Clock".into(),
        };
        assert!(err.to_string().contains("org.demo.Clock.Tick"));
    }

    #[test]
    fn test_wire_error_classification() {
        assert!(Error::malformed(0, "x").is_wire_error());
        assert!(!Error::TypeMismatch("x".into()).is_wire_error());
        assert!(!Error::UnknownNotificationName("x".into()).is_wire_error());
    }
}
