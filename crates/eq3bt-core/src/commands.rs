//! BLE command frames for eQ-3 thermostats.
//!
//! This module contains the command bytes of the eQ-3 BLE protocol and pure
//! builders for the outgoing frames. Every command is written to the command
//! characteristic; the device answers a [`STATUS_REQUEST`] with a single
//! notification on the status characteristic.

use time::OffsetDateTime;

use eq3bt_types::encode_temperature;

/// Set target temperature command.
/// Format: `[SET_TEMPERATURE, half_degrees]`
pub const SET_TEMPERATURE: u8 = 0x41;

/// Set operating mode command.
/// Format: `[SET_MODE, MODE_MANUAL | MODE_AUTO]`
pub const SET_MODE: u8 = 0x40;

/// Mode payload: manual (fixed set temperature, no schedule).
pub const MODE_MANUAL: u8 = 0x40;

/// Mode payload: automatic (follow the programmed schedule).
pub const MODE_AUTO: u8 = 0x00;

/// Enable/disable boost heating command.
/// Format: `[SET_BOOST, enabled]`
/// enabled: 0x00 = off, 0x01 = on
pub const SET_BOOST: u8 = 0x45;

/// Engage/release the physical child lock command.
/// Format: `[SET_LOCK, enabled]`
/// enabled: 0x00 = released, 0x01 = engaged
pub const SET_LOCK: u8 = 0x80;

/// Request a status notification.
/// Format: `[STATUS_REQUEST, year-2000, month, day, hour, minute, second]`
/// The timestamp also sets the device clock; month and day are 1-based,
/// the time is 24-hour.
pub const STATUS_REQUEST: u8 = 0x03;

/// Build a set-temperature frame.
///
/// The temperature is sent in half degrees: `set_temperature(21.5)` yields
/// `[0x41, 43]`.
#[must_use]
pub fn set_temperature(celsius: f32) -> [u8; 2] {
    [SET_TEMPERATURE, encode_temperature(celsius)]
}

/// Build a set-mode frame selecting manual or automatic operation.
#[must_use]
pub fn set_manual(enabled: bool) -> [u8; 2] {
    [SET_MODE, if enabled { MODE_MANUAL } else { MODE_AUTO }]
}

/// Build a boost on/off frame.
#[must_use]
pub fn set_boost(enabled: bool) -> [u8; 2] {
    [SET_BOOST, u8::from(enabled)]
}

/// Build a child-lock on/off frame.
#[must_use]
pub fn set_locked(enabled: bool) -> [u8; 2] {
    [SET_LOCK, u8::from(enabled)]
}

/// Build a status-request frame carrying `now` as the device clock.
///
/// All fields are single bytes; the year is sent as an offset from 2000,
/// which covers realistic clock years without overflow handling.
#[must_use]
pub fn status_request(now: OffsetDateTime) -> [u8; 7] {
    [
        STATUS_REQUEST,
        (now.year() - 2000) as u8,
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_command_values() {
        assert_eq!(SET_TEMPERATURE, 0x41);
        assert_eq!(SET_MODE, 0x40);
        assert_eq!(MODE_MANUAL, 0x40);
        assert_eq!(MODE_AUTO, 0x00);
        assert_eq!(SET_BOOST, 0x45);
        assert_eq!(SET_LOCK, 0x80);
        assert_eq!(STATUS_REQUEST, 0x03);
    }

    #[test]
    fn test_set_temperature_frame() {
        assert_eq!(set_temperature(21.5), [0x41, 43]);
        assert_eq!(set_temperature(5.0), [0x41, 10]);
        assert_eq!(set_temperature(30.0), [0x41, 60]);
    }

    #[test]
    fn test_set_manual_frames() {
        assert_eq!(set_manual(true), [0x40, 0x40]);
        assert_eq!(set_manual(false), [0x40, 0x00]);
    }

    #[test]
    fn test_set_boost_frames() {
        assert_eq!(set_boost(true), [0x45, 0x01]);
        assert_eq!(set_boost(false), [0x45, 0x00]);
    }

    #[test]
    fn test_set_locked_frames() {
        assert_eq!(set_locked(true), [0x80, 0x01]);
        assert_eq!(set_locked(false), [0x80, 0x00]);
    }

    #[test]
    fn test_status_request_frame() {
        let now = datetime!(2024-03-07 14:05:09 UTC);

        assert_eq!(status_request(now), [0x03, 24, 3, 7, 14, 5, 9]);
    }

    #[test]
    fn test_status_request_year_offset() {
        let century_start = datetime!(2000-01-01 00:00:00 UTC);
        let late = datetime!(2255-12-31 23:59:59 UTC);

        assert_eq!(status_request(century_start), [0x03, 0, 1, 1, 0, 0, 0]);
        assert_eq!(status_request(late), [0x03, 255, 12, 31, 23, 59, 59]);
    }
}
