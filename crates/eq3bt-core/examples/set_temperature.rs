//! Example: Setting the Target Temperature
//!
//! This example demonstrates how to change the thermostat's target
//! temperature and confirm the new setting with a status poll. Input is
//! validated against the temperature port's declared range before anything
//! is sent, the way a host framework would.
//!
//! Run with: `cargo run --example set_temperature -- <DEVICE_ADDRESS> <TEMPERATURE>`

use std::env;
use std::time::Duration;

use btleplug::api::{Central, Manager as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Manager, Peripheral};
use eq3bt_core::{Attribute, BleTransport, Thermostat};
use tokio::time::sleep;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Get the device address and target from the command line
    let args: Vec<String> = env::args().collect();
    let (identifier, target) = match (args.get(1), args.get(2)) {
        (Some(identifier), Some(target)) => (identifier, target.parse::<f32>()?),
        _ => {
            eprintln!("Usage: {} <DEVICE_ADDRESS> <TEMPERATURE>", args[0]);
            eprintln!();
            eprintln!("Example:");
            eprintln!("  {} 00:1A:22:12:34:56 21.5", args[0]);
            std::process::exit(1);
        }
    };

    // Validate against the port's declared constraints (the driver itself
    // encodes whatever it is told).
    let spec = Attribute::Temperature.spec();
    let (min, max) = (
        spec.min.unwrap_or(eq3bt_types::TEMP_MIN),
        spec.max.unwrap_or(eq3bt_types::TEMP_MAX),
    );
    if !(min..=max).contains(&target) || (target * 2.0).fract() != 0.0 {
        eprintln!(
            "Temperature must be between {} and {} °C in steps of {}",
            min,
            max,
            eq3bt_types::TEMP_STEP
        );
        std::process::exit(1);
    }

    println!("Connecting to {}...", identifier);
    let peripheral = find_peripheral(identifier).await?;
    peripheral.connect().await?;
    peripheral.discover_services().await?;
    println!("Connected!");
    println!();

    let transport = BleTransport::new(peripheral)?;
    let thermostat = Thermostat::new(transport);

    println!("Setting target to {:.1} °C...", target);
    thermostat.set_temperature(target).await?;
    println!("Command accepted.");

    // Confirm with a status poll.
    thermostat.poll().await?;
    match thermostat.temperature().await {
        Some(reported) => println!("Device now reports {:.1} °C", reported),
        None => println!("Device did not report a target"),
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
