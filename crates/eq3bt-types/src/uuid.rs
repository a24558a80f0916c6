//! Bluetooth UUIDs for Eqiva eQ-3 thermostats.
//!
//! This module contains the UUIDs needed to communicate with an eQ-3
//! radiator thermostat over Bluetooth Low Energy. Older tooling addressed
//! these endpoints by raw GATT handle; the handle each UUID resolves to on
//! stock firmware is noted for cross-reference.

use uuid::{Uuid, uuid};

/// Vendor service exposing the thermostat control characteristics.
pub const THERMOSTAT_SERVICE: Uuid = uuid!("3e135142-654f-9090-134a-a6ff5bb77046");

/// Command characteristic: every command frame is written here.
///
/// GATT handle `0x0411` on stock firmware.
pub const COMMAND: Uuid = uuid!("3fa4585a-ce4a-3bad-db4b-b8df8179ea09");

/// Status characteristic: the device notifies status frames here in
/// response to a command write.
///
/// GATT handle `0x0421` on stock firmware.
pub const STATUS: Uuid = uuid!("d0e8434d-cd29-0996-af41-6c90f4e0eb2a");
