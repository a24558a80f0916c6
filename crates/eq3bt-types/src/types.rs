//! Status frames and cached state for eQ-3 thermostats.
//!
//! The eQ-3 wire protocol is a handful of fixed-offset byte fields with no
//! checksums and no multi-frame assembly: every status notification starts
//! with a header byte, carries a bit-flags byte at offset 2, and the target
//! temperature (in half degrees) at offset 5.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

// --- Status frame layout ---

/// Header byte of every status notification sent by the device.
pub const STATUS_HEADER: u8 = 0x02;

/// Minimum number of bytes required to decode a [`Status`].
pub const MIN_STATUS_BYTES: usize = 6;

/// Offset of the bit-flags byte within a status frame.
pub const FLAGS_OFFSET: usize = 2;

/// Offset of the half-degree temperature byte within a status frame.
pub const TEMPERATURE_OFFSET: usize = 5;

/// Flags bit: device is in manual (non-scheduled) mode.
pub const MANUAL_MASK: u8 = 0x01;

/// Flags bit: boost heating is active.
pub const BOOST_MASK: u8 = 0x04;

/// Flags bit: the physical child lock is engaged (lock-capable models only).
pub const LOCK_MASK: u8 = 0x20;

// --- Target temperature range ---

/// Lowest target temperature the valve accepts, in °C.
pub const TEMP_MIN: f32 = 5.0;

/// Highest target temperature the valve accepts, in °C.
pub const TEMP_MAX: f32 = 30.0;

/// Granularity of the target temperature, in °C.
pub const TEMP_STEP: f32 = 0.5;

/// Encode a target temperature as the half-degree byte the device expects.
///
/// The device counts in half degrees: 21.5 °C is sent as 43. Out-of-range
/// values are not rejected here; the declared port metadata makes range
/// enforcement the calling host's responsibility.
#[must_use]
pub fn encode_temperature(celsius: f32) -> u8 {
    (celsius * 2.0).round() as u8
}

/// Decode a half-degree temperature byte into degrees Celsius.
#[must_use]
pub fn decode_temperature(raw: u8) -> f32 {
    f32::from(raw) / 2.0
}

/// One decoded status notification.
///
/// Produced by [`Status::from_bytes`] from the payload the device notifies in
/// response to a status request. `locked` reflects bit 5 of the flags byte;
/// on models without a child lock that bit carries no meaning and callers
/// should ignore the field.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Status {
    /// Device is in manual (non-scheduled) mode.
    pub manual: bool,
    /// Boost heating is active.
    pub boost: bool,
    /// Physical child lock is engaged.
    pub locked: bool,
    /// Target temperature in °C.
    pub temperature: f32,
}

impl Status {
    /// Parse a `Status` from a raw notification payload.
    ///
    /// The byte format is:
    /// - byte 0: header, always `0x02`
    /// - byte 2: bit flags (bit 0 manual, bit 2 boost, bit 5 locked)
    /// - byte 5: target temperature in half degrees
    ///
    /// Bytes 1, 3 and 4 are not consumed by this driver.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::Empty`] if `data` contains no bytes at all,
    /// [`FrameError::TooShort`] if it contains fewer than
    /// [`MIN_STATUS_BYTES`] (6) bytes, and [`FrameError::UnexpectedHeader`]
    /// if byte 0 is not [`STATUS_HEADER`].
    #[must_use = "parsing returns a Result that should be handled"]
    pub fn from_bytes(data: &[u8]) -> Result<Self, FrameError> {
        use bytes::Buf;

        if data.is_empty() {
            return Err(FrameError::Empty);
        }
        if data.len() < MIN_STATUS_BYTES {
            return Err(FrameError::TooShort {
                expected: MIN_STATUS_BYTES,
                actual: data.len(),
            });
        }

        let mut buf = data;
        let header = buf.get_u8();
        if header != STATUS_HEADER {
            return Err(FrameError::UnexpectedHeader {
                expected: STATUS_HEADER,
                actual: header,
            });
        }
        buf.advance(FLAGS_OFFSET - 1);
        let flags = buf.get_u8();
        buf.advance(TEMPERATURE_OFFSET - FLAGS_OFFSET - 1);
        let temp_raw = buf.get_u8();

        Ok(Status {
            manual: flags & MANUAL_MASK != 0,
            boost: flags & BOOST_MASK != 0,
            locked: flags & LOCK_MASK != 0,
            temperature: decode_temperature(temp_raw),
        })
    }
}

/// Last-known thermostat state, one `Option` per attribute.
///
/// Each field is either the value from the most recent successful status
/// decode (or successful optimistic set), or `None` if no successful decode
/// has happened since the last [`clear`](Self::clear). Readers treat `None`
/// as "no value", never as a default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThermostatState {
    /// Target temperature in °C, [`TEMP_MIN`]..=[`TEMP_MAX`] at
    /// [`TEMP_STEP`] resolution.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub temperature: Option<f32>,
    /// Manual (non-scheduled) mode.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub manual: Option<bool>,
    /// Boost heating.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub boost: Option<bool>,
    /// Physical child lock. Only ever `Some` on lock-capable models.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub locked: Option<bool>,
}

impl ThermostatState {
    /// Reset every field to `None`.
    ///
    /// Called before a status exchange starts so a reader can never observe
    /// values older than a failure of that exchange.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True if no field holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.temperature.is_none()
            && self.manual.is_none()
            && self.boost.is_none()
            && self.locked.is_none()
    }
}
