//! Platform-agnostic protocol types for Eqiva eQ-3 BLE radiator thermostats.
//!
//! This crate provides the wire-level types shared by anything that speaks
//! the eQ-3 protocol: the decoded status frame, the cached thermostat state,
//! the half-degree temperature codec, and the device's GATT UUIDs. It has no
//! BLE dependency; the transport lives in eq3bt-core.
//!
//! # Features
//!
//! - Status-notification decoding with explicit validation errors
//! - Cached-state struct with uniform invalidation
//! - Temperature codec and range constants
//! - UUID constants for the thermostat's BLE characteristics
//!
//! # Example
//!
//! ```
//! use eq3bt_types::Status;
//!
//! // A status notification as the device sends it:
//! // header, ?, flags, ?, ?, temperature in half degrees.
//! let frame = [0x02, 0x00, 0x25, 0x00, 0x00, 0x28];
//! let status = Status::from_bytes(&frame)?;
//!
//! assert!(status.manual);
//! assert!(status.boost);
//! assert_eq!(status.temperature, 20.0);
//! # Ok::<(), eq3bt_types::FrameError>(())
//! ```

pub mod error;
pub mod types;
pub mod uuid;

pub use error::{FrameError, FrameResult};
pub use types::{
    MIN_STATUS_BYTES, Status, TEMP_MAX, TEMP_MIN, TEMP_STEP, ThermostatState,
    decode_temperature, encode_temperature,
};
pub use crate::uuid as uuids;
