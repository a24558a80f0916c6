//! Trait abstraction over the BLE transport.
//!
//! This module provides the [`Transport`] trait the thermostat driver speaks
//! through. The driver never touches btleplug directly: it hands frames to a
//! `Transport` and gets notification payloads back, which keeps the protocol
//! logic testable against [`MockTransport`](crate::MockTransport) and leaves
//! connection management to the caller.

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;

/// Write access to a connected eQ-3 thermostat's GATT characteristics.
///
/// Implementations decide timeout and cancellation policy; the driver imposes
/// none of its own. The driver always requests zero `retries` for the status
/// exchange so an unresponsive device surfaces immediately instead of being
/// masked by silent re-attempts.
///
/// # Example
///
/// ```
/// use eq3bt_core::{Result, Transport};
/// use eq3bt_types::uuids;
///
/// async fn ping<T: Transport>(transport: &T) -> Result<()> {
///     transport.write(uuids::COMMAND, &[0x45, 0x00]).await
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Write a command frame, fire-and-forget.
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()>;

    /// Write a command frame, then await exactly one notification on
    /// `notify_characteristic`.
    ///
    /// On failure the whole exchange may be re-attempted up to `retries`
    /// extra times before the error is surfaced.
    async fn write_await_notify(
        &self,
        write_characteristic: Uuid,
        notify_characteristic: Uuid,
        payload: &[u8],
        retries: u32,
    ) -> Result<Vec<u8>>;
}

/// A shared transport is a transport. Lets a caller hand the driver one
/// handle and keep another, e.g. to inspect a
/// [`MockTransport`](crate::MockTransport) the driver is running against.
#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        (**self).write(characteristic, payload).await
    }

    async fn write_await_notify(
        &self,
        write_characteristic: Uuid,
        notify_characteristic: Uuid,
        payload: &[u8],
        retries: u32,
    ) -> Result<Vec<u8>> {
        (**self)
            .write_await_notify(write_characteristic, notify_characteristic, payload, retries)
            .await
    }
}
