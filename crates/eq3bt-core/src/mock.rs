//! Mock transport implementation for testing.
//!
//! This module provides a mock [`Transport`] that can be used for unit
//! testing without requiring actual BLE hardware.
//!
//! # Features
//!
//! - **Write recording**: Every frame that reaches the transport is captured
//! - **Canned notifications**: Queue the payloads `write_await_notify` serves
//! - **Failure injection**: Persistent or transient (fail N, then succeed)
//! - **Latency simulation**: Artificial delays to expose interleaving
//!
//! # Example
//!
//! ```
//! use eq3bt_core::{MockTransport, Transport};
//! use eq3bt_types::uuids;
//!
//! #[tokio::main]
//! async fn main() {
//!     let transport = MockTransport::new();
//!     transport
//!         .push_notification([0x02, 0x00, 0x01, 0x00, 0x00, 0x2A])
//!         .await;
//!
//!     let data = transport
//!         .write_await_notify(uuids::COMMAND, uuids::STATUS, &[0x03, 24, 1, 1, 0, 0, 0], 0)
//!         .await
//!         .unwrap();
//!     assert_eq!(data[0], 0x02);
//! }
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::transport::Transport;

/// A mock BLE transport for testing.
///
/// Failed operations return [`Error::NotConnected`], standing in for
/// whatever opaque failure a real link would produce.
#[derive(Default)]
pub struct MockTransport {
    /// Every write that reached the transport, in order.
    writes: RwLock<Vec<(Uuid, Vec<u8>)>>,
    /// Queued notification payloads, served FIFO by `write_await_notify`.
    notifications: RwLock<VecDeque<Vec<u8>>>,
    /// When set, every operation fails.
    should_fail: AtomicBool,
    /// Number of operations to fail before succeeding again.
    remaining_failures: AtomicU32,
    /// Simulated per-operation latency in milliseconds (0 = no delay).
    latency_ms: AtomicU64,
    /// Operations currently inside the transport.
    in_flight: AtomicU32,
    /// Highest concurrent in-flight count ever observed.
    max_in_flight: AtomicU32,
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("should_fail", &self.should_fail.load(Ordering::Relaxed))
            .field(
                "remaining_failures",
                &self.remaining_failures.load(Ordering::Relaxed),
            )
            .finish_non_exhaustive()
    }
}

/// Decrements the in-flight counter when an operation leaves the transport,
/// whichever way it leaves.
struct FlightGuard<'a>(&'a AtomicU32);

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockTransport {
    /// Create a new mock transport that succeeds with no latency.
    pub fn new() -> Self {
        Self::default()
    }

    fn enter(&self) -> FlightGuard<'_> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        FlightGuard(&self.in_flight)
    }

    async fn simulate_latency(&self) {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
    }

    fn check_should_fail(&self) -> Result<()> {
        // Transient failures are consumed first
        if self.remaining_failures.load(Ordering::Relaxed) > 0 {
            self.remaining_failures.fetch_sub(1, Ordering::Relaxed);
            return Err(Error::NotConnected);
        }

        if self.should_fail.load(Ordering::Relaxed) {
            Err(Error::NotConnected)
        } else {
            Ok(())
        }
    }

    async fn record_write(&self, characteristic: Uuid, payload: &[u8]) {
        self.writes
            .write()
            .await
            .push((characteristic, payload.to_vec()));
    }

    // --- Test control methods ---

    /// Queue a notification payload for the next `write_await_notify`.
    pub async fn push_notification(&self, payload: impl Into<Vec<u8>>) {
        self.notifications.write().await.push_back(payload.into());
    }

    /// Snapshot of every write performed so far.
    pub async fn writes(&self) -> Vec<(Uuid, Vec<u8>)> {
        self.writes.read().await.clone()
    }

    /// The most recent write, if any.
    pub async fn last_write(&self) -> Option<(Uuid, Vec<u8>)> {
        self.writes.read().await.last().cloned()
    }

    /// Number of writes performed so far.
    pub async fn write_count(&self) -> usize {
        self.writes.read().await.len()
    }

    /// Forget all recorded writes.
    pub async fn clear_writes(&self) {
        self.writes.write().await.clear();
    }

    /// Make every operation fail (or succeed again).
    pub fn set_should_fail(&self, fail: bool) {
        self.should_fail.store(fail, Ordering::Relaxed);
    }

    /// Fail the next `count` operations, then succeed again.
    pub fn set_transient_failures(&self, count: u32) {
        self.remaining_failures.store(count, Ordering::Relaxed);
    }

    /// Delay every operation by `latency`.
    ///
    /// Set to `Duration::ZERO` to disable latency simulation.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// Highest number of operations ever observed inside the transport at
    /// the same time. Stays at 1 when callers serialize correctly.
    pub fn max_in_flight(&self) -> u32 {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn write(&self, characteristic: Uuid, payload: &[u8]) -> Result<()> {
        let _guard = self.enter();
        self.simulate_latency().await;
        self.check_should_fail()?;

        self.record_write(characteristic, payload).await;
        Ok(())
    }

    async fn write_await_notify(
        &self,
        write_characteristic: Uuid,
        _notify_characteristic: Uuid,
        payload: &[u8],
        retries: u32,
    ) -> Result<Vec<u8>> {
        let _guard = self.enter();

        let mut attempt = 0;
        loop {
            self.simulate_latency().await;
            match self.check_should_fail() {
                Ok(()) => break,
                Err(_) if attempt < retries => attempt += 1,
                Err(e) => return Err(e),
            }
        }

        self.record_write(write_characteristic, payload).await;

        match self.notifications.write().await.pop_front() {
            Some(data) => Ok(data),
            // Nothing queued: behave like a device that never answered.
            None => Err(Error::timeout("status notification", Duration::ZERO)),
        }
    }
}
