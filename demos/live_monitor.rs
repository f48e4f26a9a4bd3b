// SPDX-License-Identifier: MPL-2.0

//! Live monitoring example.
//!
//! Discovers the controller's energy channels, monitors all of them for a
//! while and prints every update as it arrives.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example live_monitor -- <host> [port] [seconds]
//! ```
//!
//! # Example
//!
//! ```bash
//! RUST_LOG=niko_energy=debug cargo run --example live_monitor -- 192.168.3.40 8080 120
//! ```

use std::env;
use std::time::Duration;

use niko_energy::{
    EnergyMonitor, MonitorEvent, SessionConfig, discover_channels, sensors_for,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <host> [port] [seconds]", args[0]);
        eprintln!();
        eprintln!("Example:");
        eprintln!("  cargo run --example live_monitor -- 192.168.3.40 8080 120");
        std::process::exit(1);
    }

    let host = &args[1];
    let port: u16 = args.get(2).map_or(Ok(8080), |p| p.parse())?;
    let seconds: u64 = args.get(3).map_or(Ok(60), |s| s.parse())?;

    println!("=== Niko Energy Monitor ===");
    println!("Controller: {host}:{port}");
    println!();

    let channels = discover_channels(host, port, None).await?;
    if channels.is_empty() {
        println!("No energy channels found.");
        return Ok(());
    }

    println!("Found {} channels:", channels.len());
    for channel in &channels {
        println!("  {:>4}  {} ({})", channel.channel.as_str(), channel.name, channel.kind);
    }
    println!();

    let config = SessionConfig::from_discovery(host.as_str(), port, &channels);
    let sensors = sensors_for(&config);
    let monitor = EnergyMonitor::new(config);

    let mut events = monitor.events();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                MonitorEvent::ChannelUpdated { channel, state, .. } => {
                    println!(
                        "[{channel}] {:>8.1} W  {:>10.4} kWh",
                        state.power_watts, state.energy_kwh
                    );
                }
                MonitorEvent::StateChanged { state, .. } => println!("Session {state}"),
            }
        }
    });

    monitor.start()?;
    monitor.wait_ready().await?;
    println!("Monitoring for {seconds} s...");

    tokio::time::sleep(Duration::from_secs(seconds)).await;

    println!();
    println!("Final values:");
    for sensor in &sensors {
        match sensor.value(&monitor) {
            Some(value) => println!("  {:<30} {value:>10.4} {}", sensor.name, sensor.unit()),
            None => println!("  {:<30} {:>10} {}", sensor.name, "-", sensor.unit()),
        }
    }

    monitor.shutdown(Duration::from_secs(5)).await?;
    drop(monitor);
    printer.await?;

    println!("Done!");
    Ok(())
}
