//! eQ-3 thermostat driver.
//!
//! This module provides the protocol state machine for a single thermostat:
//! building command frames, running the status exchange, and maintaining the
//! cached last-known state with stale-state invalidation.
//!
//! The driver owns no connection. It speaks through a [`Transport`] and can
//! therefore run against [`BleTransport`](crate::BleTransport) on real
//! hardware or [`MockTransport`](crate::MockTransport) in tests.

use time::OffsetDateTime;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::commands;
use crate::error::{Error, Result};
use crate::transport::Transport;
use eq3bt_types::{Status, ThermostatState, uuids};

/// Configuration for a thermostat driver instance.
///
/// The eQ-3 family ships with and without a physical child lock; the
/// difference is a capability flag here, not a separate driver type.
///
/// # Example
///
/// ```
/// use eq3bt_core::ThermostatConfig;
///
/// let config = ThermostatConfig::default().supports_lock(true);
/// assert!(config.supports_lock);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ThermostatConfig {
    /// Whether the device model has a physical child lock.
    ///
    /// When off, [`Thermostat::set_locked`] refuses to run and the lock bit
    /// of status frames is ignored.
    pub supports_lock: bool,
}

impl ThermostatConfig {
    /// Create a new config with default values (no child lock).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the device model has a physical child lock.
    #[must_use]
    pub fn supports_lock(mut self, supports_lock: bool) -> Self {
        self.supports_lock = supports_lock;
        self
    }
}

/// Driver for one eQ-3 radiator thermostat.
///
/// Owns the decoded device state and implements the wire protocol. All
/// state readers return the value of the most recent successful status
/// decode (or optimistic set), or `None` when the last poll failed or has
/// not happened yet. A failed poll invalidates the cache before the
/// exchange starts, so readers never observe values older than the failure.
///
/// Transport exchanges are serialized internally: the driver performs one
/// outstanding operation at a time even when callers overlap.
///
/// # Example
///
/// ```
/// use eq3bt_core::{MockTransport, Thermostat};
///
/// #[tokio::main]
/// async fn main() -> eq3bt_core::Result<()> {
///     let transport = MockTransport::new();
///     transport
///         .push_notification([0x02, 0x00, 0x01, 0x00, 0x00, 0x2A])
///         .await;
///
///     let thermostat = Thermostat::new(transport);
///     assert_eq!(thermostat.temperature().await, None);
///
///     thermostat.poll().await?;
///     assert_eq!(thermostat.temperature().await, Some(21.0));
///     assert_eq!(thermostat.manual().await, Some(true));
///     Ok(())
/// }
/// ```
pub struct Thermostat<T: Transport> {
    /// The BLE transport this driver speaks through.
    transport: T,
    /// Capability configuration.
    config: ThermostatConfig,
    /// Cached last-known state.
    state: RwLock<ThermostatState>,
    /// Serializes transport exchanges. Held across "send command, await
    /// matching notification" so two exchanges can never interleave on the
    /// same connection.
    exchange: Mutex<()>,
}

impl<T: Transport> std::fmt::Debug for Thermostat<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thermostat")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Thermostat<T> {
    /// Create a driver with the default configuration (no child lock).
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, ThermostatConfig::default())
    }

    /// Create a driver with a custom configuration.
    pub fn with_config(transport: T, config: ThermostatConfig) -> Self {
        Self {
            transport,
            config,
            state: RwLock::new(ThermostatState::default()),
            exchange: Mutex::new(()),
        }
    }

    /// The driver's configuration.
    pub fn config(&self) -> &ThermostatConfig {
        &self.config
    }

    // --- Cached state access (never touches the transport) ---

    /// Last-known target temperature in °C.
    pub async fn temperature(&self) -> Option<f32> {
        self.state.read().await.temperature
    }

    /// Last-known manual mode.
    pub async fn manual(&self) -> Option<bool> {
        self.state.read().await.manual
    }

    /// Last-known boost state.
    pub async fn boost(&self) -> Option<bool> {
        self.state.read().await.boost
    }

    /// Last-known child-lock state. Always `None` on models without a lock.
    pub async fn locked(&self) -> Option<bool> {
        self.state.read().await.locked
    }

    /// Snapshot of the whole cached state.
    pub async fn state(&self) -> ThermostatState {
        *self.state.read().await
    }

    // --- Commands ---

    /// Set the target temperature.
    ///
    /// Sends `[0x41, half_degrees]` and, once the transport confirms the
    /// write, caches `celsius` as the new temperature. On failure the cache
    /// keeps its previous value; the device presumably still holds it.
    ///
    /// Values are expected in 5.0..=30.0 °C at 0.5 resolution; the driver
    /// does not enforce this, the declared port metadata does.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn set_temperature(&self, celsius: f32) -> Result<()> {
        debug!("setting temperature to {:.1} degrees", celsius);

        let frame = commands::set_temperature(celsius);
        let _exchange = self.exchange.lock().await;
        self.transport.write(uuids::COMMAND, &frame).await?;
        self.state.write().await.temperature = Some(celsius);

        debug!("successfully set temperature");
        Ok(())
    }

    /// Switch manual (fixed temperature) mode on or off.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn set_manual(&self, enabled: bool) -> Result<()> {
        debug!("setting manual mode to {}", enabled);

        let frame = commands::set_manual(enabled);
        let _exchange = self.exchange.lock().await;
        self.transport.write(uuids::COMMAND, &frame).await?;
        self.state.write().await.manual = Some(enabled);

        debug!("successfully set manual mode");
        Ok(())
    }

    /// Switch boost heating on or off.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn set_boost(&self, enabled: bool) -> Result<()> {
        debug!("setting boost mode to {}", enabled);

        let frame = commands::set_boost(enabled);
        let _exchange = self.exchange.lock().await;
        self.transport.write(uuids::COMMAND, &frame).await?;
        self.state.write().await.boost = Some(enabled);

        debug!("successfully set boost mode");
        Ok(())
    }

    /// Engage or release the physical child lock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LockNotSupported`] without touching the transport
    /// when the configuration has no child lock.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn set_locked(&self, enabled: bool) -> Result<()> {
        if !self.config.supports_lock {
            return Err(Error::LockNotSupported);
        }

        debug!("setting lock to {}", enabled);

        let frame = commands::set_locked(enabled);
        let _exchange = self.exchange.lock().await;
        self.transport.write(uuids::COMMAND, &frame).await?;
        self.state.write().await.locked = Some(enabled);

        debug!("successfully set lock");
        Ok(())
    }

    /// Refresh the cached state from the device.
    ///
    /// Invalidates every cached field, sends a status request carrying the
    /// current local time, awaits the single matching notification (zero
    /// transport retries, so an unresponsive device surfaces immediately),
    /// validates and decodes it, and republishes fresh state.
    ///
    /// # Errors
    ///
    /// Transport failures propagate unchanged; a malformed notification
    /// yields [`Error::Frame`]. In every failure case the cached fields stay
    /// `None`, so readers see "no value" rather than stale data.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn poll(&self) -> Result<()> {
        let _exchange = self.exchange.lock().await;

        // Invalidate before anything touches the transport: a reader during
        // or after a failed poll must never see pre-failure values.
        self.state.write().await.clear();

        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        let request = commands::status_request(now);

        let data = self
            .transport
            .write_await_notify(uuids::COMMAND, uuids::STATUS, &request, 0)
            .await?;

        let status = Status::from_bytes(&data)?;

        let mut state = self.state.write().await;
        state.temperature = Some(status.temperature);
        state.manual = Some(status.manual);
        state.boost = Some(status.boost);
        // The lock bit carries no meaning on lock-less hardware.
        state.locked = self.config.supports_lock.then_some(status.locked);

        debug!(
            temperature = status.temperature,
            manual = status.manual,
            boost = status.boost,
            locked = status.locked,
            "status decoded"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use eq3bt_types::FrameError;
    use std::time::Duration;

    /// A status frame with every flag set and 20.0°C target.
    const STATUS_ALL_FLAGS: [u8; 6] = [0x02, 0x00, 0x25, 0x00, 0x00, 0x28];

    fn lock_capable(transport: MockTransport) -> Thermostat<MockTransport> {
        Thermostat::with_config(transport, ThermostatConfig::default().supports_lock(true))
    }

    #[tokio::test]
    async fn test_poll_decodes_and_caches_status() {
        let transport = MockTransport::new();
        transport.push_notification(STATUS_ALL_FLAGS).await;
        let thermostat = lock_capable(transport);

        thermostat.poll().await.unwrap();

        assert_eq!(thermostat.temperature().await, Some(20.0));
        assert_eq!(thermostat.manual().await, Some(true));
        assert_eq!(thermostat.boost().await, Some(true));
        assert_eq!(thermostat.locked().await, Some(true));
    }

    #[tokio::test]
    async fn test_poll_sends_timestamped_status_request() {
        let transport = MockTransport::new();
        transport.push_notification(STATUS_ALL_FLAGS).await;
        let thermostat = Thermostat::new(transport);

        thermostat.poll().await.unwrap();

        let (uuid, frame) = thermostat.transport.last_write().await.unwrap();
        assert_eq!(uuid, uuids::COMMAND);
        assert_eq!(frame.len(), 7);
        assert_eq!(frame[0], commands::STATUS_REQUEST);
        // Calendar fields of the local clock.
        assert!((1..=12).contains(&frame[2]));
        assert!((1..=31).contains(&frame[3]));
        assert!(frame[4] < 24);
        assert!(frame[5] < 60);
        assert!(frame[6] < 60);
    }

    #[tokio::test]
    async fn test_poll_with_short_payload_clears_state() {
        let transport = MockTransport::new();
        transport.push_notification(STATUS_ALL_FLAGS).await;
        transport.push_notification([0x02, 0x00, 0x25]).await;
        let thermostat = lock_capable(transport);

        // Seed the cache with a successful poll, then fail one.
        thermostat.poll().await.unwrap();
        let err = thermostat.poll().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Frame(FrameError::TooShort {
                expected: 6,
                actual: 3
            })
        ));
        assert_eq!(thermostat.temperature().await, None);
        assert_eq!(thermostat.boost().await, None);
        assert_eq!(thermostat.manual().await, None);
        assert_eq!(thermostat.locked().await, None);
    }

    #[tokio::test]
    async fn test_poll_with_empty_payload_fails_empty() {
        let transport = MockTransport::new();
        transport.push_notification([]).await;
        let thermostat = Thermostat::new(transport);

        let err = thermostat.poll().await.unwrap_err();

        assert!(matches!(err, Error::Frame(FrameError::Empty)));
        assert!(thermostat.state().await.is_empty());
    }

    #[tokio::test]
    async fn test_poll_with_wrong_header_fails() {
        let transport = MockTransport::new();
        transport
            .push_notification([0x42, 0x00, 0x25, 0x00, 0x00, 0x28])
            .await;
        let thermostat = Thermostat::new(transport);

        let err = thermostat.poll().await.unwrap_err();

        assert!(matches!(
            err,
            Error::Frame(FrameError::UnexpectedHeader { actual: 0x42, .. })
        ));
        assert_eq!(thermostat.temperature().await, None);
    }

    #[tokio::test]
    async fn test_poll_transport_failure_clears_state() {
        let transport = MockTransport::new();
        transport.push_notification(STATUS_ALL_FLAGS).await;
        let thermostat = Thermostat::new(transport);

        thermostat.poll().await.unwrap();
        assert_eq!(thermostat.temperature().await, Some(20.0));

        thermostat.transport.set_should_fail(true);
        let err = thermostat.poll().await.unwrap_err();

        assert!(matches!(err, Error::NotConnected));
        assert!(thermostat.state().await.is_empty());
    }

    #[tokio::test]
    async fn test_poll_requests_zero_transport_retries() {
        let transport = MockTransport::new();
        transport.set_transient_failures(1);
        transport.push_notification(STATUS_ALL_FLAGS).await;
        let thermostat = Thermostat::new(transport);

        // With any retry budget the queued notification would make this
        // succeed; the driver must not request one.
        assert!(thermostat.poll().await.is_err());
    }

    #[tokio::test]
    async fn test_poll_ignores_lock_bit_without_capability() {
        let transport = MockTransport::new();
        transport.push_notification(STATUS_ALL_FLAGS).await;
        let thermostat = Thermostat::new(transport);

        thermostat.poll().await.unwrap();

        assert_eq!(thermostat.locked().await, None);
        assert_eq!(thermostat.manual().await, Some(true));
    }

    #[tokio::test]
    async fn test_set_temperature_sends_frame_and_caches() {
        let transport = MockTransport::new();
        let thermostat = Thermostat::new(transport);

        thermostat.set_temperature(21.5).await.unwrap();

        assert_eq!(
            thermostat.transport.last_write().await,
            Some((uuids::COMMAND, vec![0x41, 43]))
        );
        assert_eq!(thermostat.temperature().await, Some(21.5));
    }

    #[tokio::test]
    async fn test_set_manual_sends_mode_frames() {
        let transport = MockTransport::new();
        let thermostat = Thermostat::new(transport);

        thermostat.set_manual(true).await.unwrap();
        assert_eq!(
            thermostat.transport.last_write().await,
            Some((uuids::COMMAND, vec![0x40, 0x40]))
        );
        assert_eq!(thermostat.manual().await, Some(true));

        thermostat.set_manual(false).await.unwrap();
        assert_eq!(
            thermostat.transport.last_write().await,
            Some((uuids::COMMAND, vec![0x40, 0x00]))
        );
        assert_eq!(thermostat.manual().await, Some(false));
    }

    #[tokio::test]
    async fn test_set_boost_sends_frame_and_caches() {
        let transport = MockTransport::new();
        let thermostat = Thermostat::new(transport);

        thermostat.set_boost(true).await.unwrap();

        assert_eq!(
            thermostat.transport.last_write().await,
            Some((uuids::COMMAND, vec![0x45, 0x01]))
        );
        assert_eq!(thermostat.boost().await, Some(true));
    }

    #[tokio::test]
    async fn test_set_locked_sends_frame_and_caches() {
        let transport = MockTransport::new();
        let thermostat = lock_capable(transport);

        thermostat.set_locked(true).await.unwrap();

        assert_eq!(
            thermostat.transport.last_write().await,
            Some((uuids::COMMAND, vec![0x80, 0x01]))
        );
        assert_eq!(thermostat.locked().await, Some(true));
    }

    #[tokio::test]
    async fn test_set_locked_without_capability_errors() {
        let transport = MockTransport::new();
        let thermostat = Thermostat::new(transport);

        let err = thermostat.set_locked(true).await.unwrap_err();

        assert!(matches!(err, Error::LockNotSupported));
        // The transport was never touched.
        assert_eq!(thermostat.transport.write_count().await, 0);
        assert_eq!(thermostat.locked().await, None);
    }

    #[tokio::test]
    async fn test_failed_setter_leaves_previous_value() {
        let transport = MockTransport::new();
        transport.push_notification(STATUS_ALL_FLAGS).await;
        let thermostat = Thermostat::new(transport);

        thermostat.poll().await.unwrap();
        assert_eq!(thermostat.temperature().await, Some(20.0));

        thermostat.transport.set_should_fail(true);
        let err = thermostat.set_temperature(25.0).await.unwrap_err();

        assert!(matches!(err, Error::NotConnected));
        // Last-known-good is preserved; the device presumably still holds it.
        assert_eq!(thermostat.temperature().await, Some(20.0));
    }

    #[tokio::test]
    async fn test_concurrent_operations_never_interleave() {
        let transport = MockTransport::new();
        transport.set_latency(Duration::from_millis(20));
        transport.push_notification(STATUS_ALL_FLAGS).await;
        let thermostat = Thermostat::new(transport);

        let (poll, set) = tokio::join!(thermostat.poll(), thermostat.set_boost(true));
        poll.unwrap();
        set.unwrap();

        // The exchange guard kept one operation inside the transport at a
        // time even though both ran concurrently.
        assert_eq!(thermostat.transport.max_in_flight(), 1);
        assert_eq!(thermostat.transport.write_count().await, 2);
    }
}
