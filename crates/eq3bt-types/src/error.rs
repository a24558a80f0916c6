//! Error types for status-frame validation in eq3bt-types.

use thiserror::Error;

/// Errors that can occur when validating or decoding a status notification.
///
/// This error type is platform-agnostic and does not include BLE-specific
/// errors (those belong in eq3bt-core).
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FrameError {
    /// The notification carried no payload at all.
    #[error("status notification carried no data")]
    Empty,

    /// The payload ended before the temperature field.
    #[error("status frame too short: expected at least {expected} bytes, got {actual}")]
    TooShort {
        /// Minimum number of bytes a status frame must contain.
        expected: usize,
        /// Number of bytes actually received.
        actual: usize,
    },

    /// The first byte was not the status-reply header.
    #[error("unexpected status header {actual:#04x}, expected {expected:#04x}")]
    UnexpectedHeader {
        /// The header byte every status frame starts with.
        expected: u8,
        /// The byte actually received at offset 0.
        actual: u8,
    },
}

/// Result type alias using eq3bt-types' FrameError type.
pub type FrameResult<T> = std::result::Result<T, FrameError>;
