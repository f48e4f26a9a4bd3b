// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `niko_energy` - Live power and energy monitoring for Niko home-automation
//! controllers.
//!
//! The controller speaks newline-delimited JSON over TCP. This library keeps
//! one connection open per monitored controller, listens for live power
//! readings on a set of channels, integrates them into cumulative energy,
//! and hands up-to-date values to consumers.
//!
//! # Supported Features
//!
//! - **Live power**: Push events plus periodic live queries per channel
//! - **Energy integration**: kWh accumulated from successive power samples
//! - **Change notifications**: Synchronous handlers and an async event stream
//! - **Channel discovery**: Enumerate the controller's energy channels
//! - **Sensor descriptors**: Power and energy sensors for host integrations
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use niko_energy::{EnergyMonitor, SessionConfig};
//!
//! #[tokio::main]
//! async fn main() -> niko_energy::Result<()> {
//!     let config = SessionConfig::builder()
//!         .host("192.168.3.40")
//!         .channel(1, "Oven")
//!         .channel(2, "Heat pump")
//!         .build()?;
//!
//!     let monitor = EnergyMonitor::new(config);
//!     monitor.subscribe(|channel| println!("Channel {channel} changed"));
//!
//!     monitor.start()?;
//!     monitor.wait_ready().await?;
//!
//!     tokio::time::sleep(Duration::from_secs(60)).await;
//!     println!("{:?}", monitor.snapshot());
//!
//!     monitor.shutdown(Duration::from_secs(5)).await
//! }
//! ```
//!
//! # Async Consumers
//!
//! ```no_run
//! use niko_energy::{EnergyMonitor, MonitorEvent};
//!
//! # async fn example(monitor: EnergyMonitor) {
//! let mut events = monitor.events();
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let MonitorEvent::ChannelUpdated { channel, state, .. } = event {
//!             println!("{channel}: {} W, {:.3} kWh", state.power_watts, state.energy_kwh);
//!         }
//!     }
//! });
//! # }
//! ```

pub mod command;
pub mod discovery;
pub mod energy;
pub mod error;
pub mod event;
pub mod manager;
pub mod protocol;
pub mod sensor;
pub mod session;
pub mod state;
pub mod subscription;
pub mod types;

pub use command::Command;
pub use discovery::{DiscoveredChannel, DiscoveryOptions, discover_channels};
pub use error::{
    ConfigError, ConnectionError, Error, HandshakeError, NotificationError, ProtocolError, Result,
    TransportError,
};
pub use event::{EventBus, MonitorEvent, SessionId};
pub use manager::MonitorRegistry;
pub use sensor::{SensorDescriptor, SensorKind, StateClass, sensors_for};
pub use session::{ChannelConfig, EnergyMonitor, SessionConfig, SessionConfigBuilder, SessionState};
pub use state::{ChannelState, ChannelStore, Reading};
pub use subscription::SubscriptionId;
pub use types::{ChannelId, ChannelSample};
