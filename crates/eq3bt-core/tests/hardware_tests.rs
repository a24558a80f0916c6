//! Hardware integration tests for eq3bt-core
//!
//! These tests require a real eQ-3 thermostat in range and should be run
//! with:
//! ```
//! cargo test --package eq3bt-core --test hardware_tests -- --ignored --nocapture
//! ```
//!
//! Configure the device via environment variables:
//! - `EQ3_DEVICE`: the thermostat's Bluetooth address (or advertised name,
//!   usually `CC-RT-BLE`)
//! - `EQ3_HAS_LOCK`: set to `1` if the device has a physical child lock
//!
//! Example:
//! ```
//! EQ3_DEVICE="00:1A:22:12:34:56" cargo test --package eq3bt-core --test hardware_tests -- --ignored --nocapture
//! ```
//!
//! The command tests change the thermostat's settings and restore them
//! afterwards where possible.

use std::env;
use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::Manager;
use eq3bt_core::{BleTransport, Thermostat, ThermostatConfig};
use tokio::time::{sleep, timeout};

/// Default timeout for BLE operations.
const BLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for a single status exchange.
const POLL_TIMEOUT: Duration = Duration::from_secs(15);

/// Get the thermostat address from the environment.
fn get_device() -> Option<String> {
    env::var("EQ3_DEVICE").ok().filter(|s| !s.is_empty())
}

/// Whether the configured device has a physical child lock.
fn device_has_lock() -> bool {
    env::var("EQ3_HAS_LOCK").is_ok_and(|v| v == "1")
}

/// Scan for the thermostat and build a driver over it.
async fn connect_thermostat(
    identifier: &str,
) -> Result<Thermostat<BleTransport>, Box<dyn std::error::Error>> {
    let manager = Manager::new().await?;
    let adapter = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or("no Bluetooth adapter available")?;

    adapter.start_scan(ScanFilter::default()).await?;
    sleep(Duration::from_secs(5)).await;
    adapter.stop_scan().await?;

    for peripheral in adapter.peripherals().await? {
        let address = peripheral.address().to_string();
        let name = peripheral
            .properties()
            .await?
            .and_then(|properties| properties.local_name);
        if address.eq_ignore_ascii_case(identifier) || name.as_deref() == Some(identifier) {
            peripheral.connect().await?;
            peripheral.discover_services().await?;
            let transport = BleTransport::new(peripheral)?;
            let config = ThermostatConfig::default().supports_lock(device_has_lock());
            return Ok(Thermostat::with_config(transport, config));
        }
    }

    Err(format!("device {identifier} not found").into())
}

// =============================================================================
// Status Tests
// =============================================================================

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_poll_reads_status() {
    let address = match get_device() {
        Some(a) => a,
        None => {
            println!("SKIP: EQ3_DEVICE not set");
            return;
        }
    };

    println!("Polling thermostat: {}", address);

    let thermostat = timeout(BLE_TIMEOUT, connect_thermostat(&address))
        .await
        .expect("Connect timeout")
        .expect("Connect failed");

    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("Poll timeout")
        .expect("Poll failed");

    let state = thermostat.state().await;
    println!("Status:");
    println!("  Target:  {:?} °C", state.temperature);
    println!("  Manual:  {:?}", state.manual);
    println!("  Boost:   {:?}", state.boost);
    println!("  Locked:  {:?}", state.locked);

    let target = state.temperature.expect("Target should be known after poll");
    // 4.5 is the valve-off setting, 30.5 the valve-on setting; everything
    // else stays within the documented range.
    assert!(
        (4.0..=31.0).contains(&target),
        "Target should be plausible (got {})",
        target
    );
    assert!(state.manual.is_some(), "Manual should be known after poll");
    assert!(state.boost.is_some(), "Boost should be known after poll");
}

#[tokio::test]
#[ignore = "requires BLE hardware"]
async fn test_poll_twice_reports_consistently() {
    let address = match get_device() {
        Some(a) => a,
        None => {
            println!("SKIP: EQ3_DEVICE not set");
            return;
        }
    };

    let thermostat = timeout(BLE_TIMEOUT, connect_thermostat(&address))
        .await
        .expect("Connect timeout")
        .expect("Connect failed");

    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("First poll timeout")
        .expect("First poll failed");
    let first = thermostat.state().await;

    sleep(Duration::from_millis(500)).await;

    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("Second poll timeout")
        .expect("Second poll failed");
    let second = thermostat.state().await;

    println!("First:  {:?}", first);
    println!("Second: {:?}", second);

    // Nobody touched the device in between.
    assert_eq!(first.temperature, second.temperature);
    assert_eq!(first.manual, second.manual);
}

// =============================================================================
// Command Tests
// =============================================================================

#[tokio::test]
#[ignore = "requires BLE hardware - changes the target temperature"]
async fn test_set_temperature_round_trip() {
    let address = match get_device() {
        Some(a) => a,
        None => {
            println!("SKIP: EQ3_DEVICE not set");
            return;
        }
    };

    let thermostat = timeout(BLE_TIMEOUT, connect_thermostat(&address))
        .await
        .expect("Connect timeout")
        .expect("Connect failed");

    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("Poll timeout")
        .expect("Poll failed");
    let original = thermostat.temperature().await;
    println!("Original target: {:?} °C", original);

    thermostat
        .set_temperature(20.0)
        .await
        .expect("Set temperature failed");

    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("Confirm poll timeout")
        .expect("Confirm poll failed");
    assert_eq!(
        thermostat.temperature().await,
        Some(20.0),
        "Device should report the new target"
    );

    // Restore the original target.
    if let Some(original) = original {
        thermostat
            .set_temperature(original)
            .await
            .expect("Restore failed");
        println!("Restored target: {} °C", original);
    }
}

#[tokio::test]
#[ignore = "requires BLE hardware - actuates the valve"]
async fn test_boost_toggle() {
    let address = match get_device() {
        Some(a) => a,
        None => {
            println!("SKIP: EQ3_DEVICE not set");
            return;
        }
    };

    let thermostat = timeout(BLE_TIMEOUT, connect_thermostat(&address))
        .await
        .expect("Connect timeout")
        .expect("Connect failed");

    thermostat.set_boost(true).await.expect("Boost on failed");
    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("Poll timeout")
        .expect("Poll failed");
    assert_eq!(thermostat.boost().await, Some(true));
    println!("Boost engaged");

    thermostat.set_boost(false).await.expect("Boost off failed");
    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("Poll timeout")
        .expect("Poll failed");
    assert_eq!(thermostat.boost().await, Some(false));
    println!("Boost released");
}

#[tokio::test]
#[ignore = "requires BLE hardware - changes the operating mode"]
async fn test_manual_mode_round_trip() {
    let address = match get_device() {
        Some(a) => a,
        None => {
            println!("SKIP: EQ3_DEVICE not set");
            return;
        }
    };

    let thermostat = timeout(BLE_TIMEOUT, connect_thermostat(&address))
        .await
        .expect("Connect timeout")
        .expect("Connect failed");

    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("Poll timeout")
        .expect("Poll failed");
    let original = thermostat.manual().await.expect("Mode should be known");
    println!("Original manual mode: {}", original);

    thermostat
        .set_manual(!original)
        .await
        .expect("Mode change failed");
    timeout(POLL_TIMEOUT, thermostat.poll())
        .await
        .expect("Confirm poll timeout")
        .expect("Confirm poll failed");
    assert_eq!(thermostat.manual().await, Some(!original));

    // Restore the original mode.
    thermostat
        .set_manual(original)
        .await
        .expect("Mode restore failed");
    println!("Restored manual mode: {}", original);
}

// =============================================================================
// Stress Tests
// =============================================================================

#[tokio::test]
#[ignore = "requires BLE hardware - stress test"]
async fn test_repeated_polls() {
    let address = match get_device() {
        Some(a) => a,
        None => {
            println!("SKIP: EQ3_DEVICE not set");
            return;
        }
    };

    let thermostat = timeout(BLE_TIMEOUT, connect_thermostat(&address))
        .await
        .expect("Connect timeout")
        .expect("Connect failed");

    const NUM_POLLS: usize = 5;
    let mut success_count = 0;

    println!("Performing {} repeated polls...", NUM_POLLS);

    for i in 0..NUM_POLLS {
        match timeout(POLL_TIMEOUT, thermostat.poll()).await {
            Ok(Ok(())) => {
                println!(
                    "  Poll {}: target {:?} °C",
                    i + 1,
                    thermostat.temperature().await
                );
                success_count += 1;
            }
            Ok(Err(e)) => {
                println!("  Poll {} failed: {}", i + 1, e);
            }
            Err(_) => {
                println!("  Poll {} timed out", i + 1);
            }
        }

        sleep(Duration::from_millis(500)).await;
    }

    println!("Completed {}/{} polls successfully", success_count, NUM_POLLS);
    assert!(
        success_count >= NUM_POLLS - 1,
        "Should succeed at least {} times",
        NUM_POLLS - 1
    );
}
