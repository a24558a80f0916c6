//! Example: Reading Thermostat Status
//!
//! This example demonstrates how to connect to an eQ-3 radiator thermostat
//! and read its current status: target temperature, operating mode, boost
//! and child-lock state.
//!
//! Run with: `cargo run --example read_status -- <DEVICE_ADDRESS>`

use std::env;
use std::sync::Arc;
use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Manager, Peripheral};
use eq3bt_core::{BleTransport, Thermostat, ThermostatConfig, Value};
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Get the device address from the command line
    let args: Vec<String> = env::args().collect();
    let identifier = if args.len() > 1 {
        &args[1]
    } else {
        eprintln!("Usage: {} <DEVICE_ADDRESS_OR_NAME>", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  {} 00:1A:22:12:34:56", args[0]);
        eprintln!("  {} CC-RT-BLE", args[0]);
        std::process::exit(1);
    };

    println!("Connecting to {}...", identifier);

    // Connection setup is the caller's job; the driver takes over once the
    // peripheral is connected and its services are discovered.
    let peripheral = find_peripheral(identifier).await?;
    peripheral.connect().await?;
    peripheral.discover_services().await?;
    println!("Connected!");
    println!();

    let transport = BleTransport::new(peripheral)?;
    let thermostat = Arc::new(Thermostat::with_config(
        transport,
        ThermostatConfig::default().supports_lock(true),
    ));

    println!("Requesting status...");
    thermostat.poll().await?;

    println!();
    println!("Thermostat Status:");
    if let Some(target) = thermostat.temperature().await {
        println!("  Target:  {:.1} °C", target);
    }
    let mode = match thermostat.manual().await {
        Some(true) => "manual",
        Some(false) => "auto",
        None => "unknown",
    };
    println!("  Mode:    {}", mode);
    println!("  Boost:   {:?}", thermostat.boost().await);
    println!("  Locked:  {:?}", thermostat.locked().await);

    // The same values through the port layer, with declared metadata.
    println!();
    println!("Ports:");
    for port in Thermostat::ports(&thermostat) {
        let spec = port.spec();
        match port.read_value().await {
            Some(Value::Number(value)) => {
                println!("  {:<12} {:.1} {}", spec.id, value, spec.unit.unwrap_or(""));
            }
            Some(Value::Bool(value)) => {
                println!("  {:<12} {}", spec.id, value);
            }
            None => {
                println!("  {:<12} (unknown)", spec.id);
            }
        }
    }

    Ok(())
}

/// Scan for the peripheral with the given address or advertised name.
async fn find_peripheral(identifier: &str) -> Result<Peripheral, Box<dyn std::error::Error>> {
    let manager = Manager::new().await?;
    let adapter = manager
        .adapters()
        .await?
        .into_iter()
        .next()
        .ok_or("no Bluetooth adapter available")?;

    println!("Scanning...");
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
            return Ok(peripheral);
        }
    }

    Err(format!("device {identifier} not found; is the thermostat in range?").into())
}
