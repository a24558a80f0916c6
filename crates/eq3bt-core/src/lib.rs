//! Core BLE driver library for Eqiva eQ-3 radiator thermostats.
//!
//! This crate implements the eQ-3 proprietary protocol: it encodes command
//! frames, sends them over the thermostat's GATT command characteristic, and
//! decodes the status notifications the device answers with. Connection
//! management stays with the caller; the driver speaks through a narrow
//! [`Transport`] seam.
//!
//! # Features
//!
//! - **Status polling**: timestamped status request, single-notification
//!   reply, strict frame validation
//! - **Commands**: target temperature, manual mode, boost heating, child lock
//! - **Cached state**: last-known values invalidated before every poll, so
//!   readers never see data older than a failure
//! - **Transports**: [`BleTransport`] over `btleplug` for hardware,
//!   [`MockTransport`] for tests and offline development
//! - **Attribute ports**: per-attribute accessors carrying declared metadata
//!   (kind, writability, range/step/unit) for host frameworks
//!
//! # Command frames
//!
//! | Frame | Meaning |
//! |-------|---------|
//! | `[0x41, temp × 2]` | set target temperature |
//! | `[0x40, 0x40/0x00]` | manual mode on/off |
//! | `[0x45, 0x01/0x00]` | boost on/off |
//! | `[0x80, 0x01/0x00]` | child lock on/off |
//! | `[0x03, YY, MM, DD, hh, mm, ss]` | status request |
//!
//! The device answers a status request with one notification
//! `[0x02, _, flags, _, _, temp × 2]`.
//!
//! # Quick Start
//!
//! ```
//! use eq3bt_core::{MockTransport, Thermostat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Drives the protocol against the in-memory transport; swap in
//!     // `BleTransport` for real hardware (see the crate examples).
//!     let transport = MockTransport::new();
//!     transport
//!         .push_notification([0x02, 0x00, 0x04, 0x00, 0x00, 0x2D])
//!         .await;
//!
//!     let thermostat = Thermostat::new(transport);
//!     thermostat.poll().await?;
//!     assert_eq!(thermostat.temperature().await, Some(22.5));
//!     assert_eq!(thermostat.boost().await, Some(true));
//!
//!     thermostat.set_temperature(21.5).await?;
//!     Ok(())
//! }
//! ```

pub mod ble;
pub mod commands;
pub mod error;
pub mod mock;
pub mod port;
pub mod thermostat;
pub mod transport;

// Re-export the protocol types and UUID constants from eq3bt-types.
pub use eq3bt_types::uuid as uuids;
pub use eq3bt_types::{FrameError, Status, ThermostatState};

// Core exports
pub use ble::{BleTransport, TransportConfig};
pub use error::{Error, Result};
pub use mock::MockTransport;
pub use port::{Attribute, Port, PortSpec, Value, ValueKind, WRITE_QUEUE_LEN};
pub use thermostat::{Thermostat, ThermostatConfig};
pub use transport::Transport;

/// Type alias for a shared thermostat reference.
///
/// [`Thermostat`] intentionally does not implement `Clone` (one driver per
/// device connection); wrap it in `Arc` to share it across tasks and to build
/// ports, which bind to `Arc<Thermostat<T>>`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use eq3bt_core::{MockTransport, SharedThermostat, Thermostat};
///
/// let shared: SharedThermostat<MockTransport> =
///     Arc::new(Thermostat::new(MockTransport::new()));
/// let ports = Thermostat::ports(&shared);
/// assert_eq!(ports.len(), 3);
/// ```
pub type SharedThermostat<T> = std::sync::Arc<Thermostat<T>>;
