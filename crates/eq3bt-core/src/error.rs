//! Error types for eq3bt-core.
//!
//! This module defines all error types that can occur when driving an eQ-3
//! thermostat via Bluetooth Low Energy.
//!
//! # Recovery
//!
//! | Error Type | Strategy | Rationale |
//! |------------|----------|-----------|
//! | [`Error::Bluetooth`] | Reconnect, poll again | Link-level failure, state was invalidated |
//! | [`Error::NotConnected`] | Reconnect | Connection was lost |
//! | [`Error::Timeout`] | Poll again later | Device sleeps aggressively between advertisements |
//! | [`Error::Frame`] | Poll again later | Truncated or foreign notification |
//! | [`Error::CharacteristicNotFound`] | Do not retry | Wrong device or incompatible firmware |
//! | [`Error::LockNotSupported`] | Do not retry | Capability is off for this model |
//! | [`Error::InvalidValue`] | Do not retry | Caller sent the wrong value type |
//!
//! No error is fatal to the driver instance itself: a later poll or set can
//! succeed normally, and cached state is invalidated before every status
//! exchange, so readers never observe values older than a failure.

use std::time::Duration;

use thiserror::Error;
use uuid::Uuid;

use eq3bt_types::FrameError;

/// Errors that can occur when communicating with an eQ-3 thermostat.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Bluetooth Low Energy error, propagated from the transport unchanged.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// The status notification failed validation or decoding.
    #[error("Status frame rejected: {0}")]
    Frame(#[from] FrameError),

    /// Operation attempted while the underlying connection is gone.
    #[error("Not connected to thermostat")]
    NotConnected,

    /// Required BLE characteristic not found on the connected peripheral.
    #[error("Characteristic not found: {uuid} (searched {characteristic_count} characteristics)")]
    CharacteristicNotFound {
        /// The UUID that was not found.
        uuid: Uuid,
        /// Number of characteristics the peripheral exposed.
        characteristic_count: usize,
    },

    /// Operation timed out.
    #[error("Operation '{operation}' timed out after {duration:?}")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The timeout duration.
        duration: Duration,
    },

    /// Lock command issued to a thermostat not configured with a child lock.
    #[error("Thermostat model has no child lock")]
    LockNotSupported,

    /// A port received a value of the wrong type.
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl Error {
    /// Create a timeout error with operation context.
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a characteristic not found error.
    pub fn characteristic_not_found(uuid: Uuid, characteristic_count: usize) -> Self {
        Self::CharacteristicNotFound {
            uuid,
            characteristic_count,
        }
    }

    /// Create an invalid value error.
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue(message.into())
    }
}

/// Result type alias using eq3bt-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
