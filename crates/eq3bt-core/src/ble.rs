//! btleplug-backed transport for eQ-3 thermostats.
//!
//! [`BleTransport`] implements [`Transport`] over an already-connected
//! [`Peripheral`]. It deliberately does no connection management: pairing,
//! service discovery and reconnection are the caller's job, matching the
//! host-framework split the driver is written for. The caller hands over a
//! connected peripheral with services discovered; this type resolves the two
//! thermostat characteristics once and then only writes and listens.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::transport::Transport;
use eq3bt_types::uuids;

/// Default timeout for BLE characteristic write operations.
const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout awaiting the status notification after a write.
const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for transport timeouts.
///
/// The driver itself imposes no timeouts; whatever is configured here is the
/// whole cancellation policy for an exchange. Increase the values in
/// challenging RF environments (concrete walls, interference).
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use eq3bt_core::TransportConfig;
///
/// let config = TransportConfig::default()
///     .write_timeout(Duration::from_secs(15))
///     .notify_timeout(Duration::from_secs(20));
/// assert_eq!(config.write_timeout, Duration::from_secs(15));
/// ```
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Timeout for BLE write operations.
    pub write_timeout: Duration,
    /// Timeout awaiting a notification after a command write.
    pub notify_timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            write_timeout: DEFAULT_WRITE_TIMEOUT,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
        }
    }
}

impl TransportConfig {
    /// Create a new transport config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the write timeout.
    #[must_use]
    pub fn write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = timeout;
        self
    }

    /// Set the notification timeout.
    #[must_use]
    pub fn notify_timeout(mut self, timeout: Duration) -> Self {
        self.notify_timeout = timeout;
        self
    }
}

/// [`Transport`] implementation over a connected BLE peripheral.
///
/// # Note on Clone
///
/// This struct intentionally does not implement `Clone`. A `BleTransport`
/// subscribes and unsubscribes on the status characteristic as exchanges run;
/// two clones doing that concurrently would fight over the subscription. To
/// share one connection, share the transport behind `Arc`; the driver
/// already serializes exchanges.
pub struct BleTransport {
    /// The underlying BLE peripheral, connected with services discovered.
    peripheral: Peripheral,
    /// The thermostat characteristics, resolved once at construction.
    characteristics: HashMap<Uuid, Characteristic>,
    /// Timeout configuration.
    config: TransportConfig,
}

impl std::fmt::Debug for BleTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BleTransport")
            .field("config", &self.config)
            .field("characteristics", &self.characteristics.keys())
            .finish_non_exhaustive()
    }
}

impl BleTransport {
    /// Create a transport over `peripheral` with default timeouts.
    ///
    /// The peripheral must already be connected and have its services
    /// discovered.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CharacteristicNotFound`] if the peripheral does not
    /// expose the eQ-3 command and status characteristics, either because
    /// services were not discovered yet or because this is not an eQ-3
    /// thermostat.
    pub fn new(peripheral: Peripheral) -> Result<Self> {
        Self::with_config(peripheral, TransportConfig::default())
    }

    /// Create a transport over `peripheral` with custom timeouts.
    ///
    /// # Errors
    ///
    /// Same as [`BleTransport::new`].
    pub fn with_config(peripheral: Peripheral, config: TransportConfig) -> Result<Self> {
        let available = peripheral.characteristics();
        let mut characteristics = HashMap::new();

        for uuid in [uuids::COMMAND, uuids::STATUS] {
            let characteristic = available
                .iter()
                .find(|c| c.uuid == uuid)
                .cloned()
                .ok_or_else(|| Error::characteristic_not_found(uuid, available.len()))?;
            characteristics.insert(uuid, characteristic);
        }

        Ok(Self {
            peripheral,
            characteristics,
            config,
        })
    }

    fn characteristic(&self, uuid: Uuid) -> Result<&Characteristic> {
        self.characteristics
            .get(&uuid)
            .ok_or_else(|| Error::characteristic_not_found(uuid, self.characteristics.len()))
    }

    /// One write-then-notify round trip. The caller handles re-attempts.
    async fn exchange(
        &self,
        write_characteristic: Uuid,
        notify_characteristic: Uuid,
        payload: &[u8],
    ) -> Result<Vec<u8>> {
        let notify_char = self.characteristic(notify_characteristic)?;

        self.peripheral.subscribe(notify_char).await?;

        // Forward the first matching notification into a channel; the stream
        // must exist before the write so nothing is lost.
        let mut stream = self.peripheral.notifications().await?;
        let (tx, mut rx) = mpsc::channel::<Vec<u8>>(8);
        let forwarder = tokio::spawn(async move {
            while let Some(notification) = stream.next().await {
                if notification.uuid == notify_characteristic {
                    let _ = tx.try_send(notification.value);
                    break;
                }
            }
        });

        let result = self
            .write_then_recv(write_characteristic, payload, &mut rx)
            .await;

        forwarder.abort();
        if let Err(e) = self.peripheral.unsubscribe(notify_char).await {
            debug!(error = %e, "unsubscribe after status exchange failed");
        }

        result
    }

    async fn write_then_recv(
        &self,
        write_characteristic: Uuid,
        payload: &[u8],
        rx: &mut mpsc::Receiver<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        self.write(write_characteristic, payload).await?;

        match timeout(self.config.notify_timeout, rx.recv()).await {
            Ok(Some(data)) => {
                debug!(len = data.len(), "received status notification");
                Ok(data)
            }
            // The notification stream ended before anything matched: the
            // peripheral is gone.
            Ok(None) => Err(Error::NotConnected),
            Err(_) => Err(Error::timeout(
                "status notification",
                self.config.notify_timeout,
            )),
        }
    }
}

#[async_trait]
impl Transport for BleTransport {
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        let characteristic = self.characteristic(characteristic)?;
        timeout(
            self.config.write_timeout,
            self.peripheral
                .write(characteristic, payload, WriteType::WithResponse),
        )
        .await
        .map_err(|_| Error::Timeout {
            operation: format!("write characteristic {}", characteristic.uuid),
            duration: self.config.write_timeout,
        })??;
        Ok(())
    }

    async fn write_await_notify(
        &self,
        write_characteristic: Uuid,
        notify_characteristic: Uuid,
        payload: &[u8],
        retries: u32,
    ) -> Result<Vec<u8>> {
        let mut attempt = 0;
        loop {
            match self
                .exchange(write_characteristic, notify_characteristic, payload)
                .await
            {
                Ok(data) => return Ok(data),
                Err(e) if attempt < retries => {
                    attempt += 1;
                    warn!(attempt, retries, error = %e, "status exchange failed, re-attempting");
                }
                Err(e) => return Err(e),
            }
        }
    }
}
