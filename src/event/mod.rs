// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast events for asynchronous consumers.
//!
//! Every monitor owns an [`EventBus`] that publishes a [`MonitorEvent`] for
//! each lifecycle transition and each channel update. Unlike handlers on the
//! [`NotificationBus`](crate::subscription::NotificationBus), subscribers
//! receive events on their own task.
//!
//! # Examples
//!
//! ```no_run
//! use niko_energy::event::MonitorEvent;
//! use niko_energy::{EnergyMonitor, SessionConfig};
//!
//! # async fn example() -> niko_energy::Result<()> {
//! let monitor = EnergyMonitor::new(SessionConfig::builder().host("192.168.3.40").build()?);
//! let mut events = monitor.events();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let MonitorEvent::ChannelUpdated { channel, state, .. } = event {
//!             println!("{channel}: {} W", state.power_watts);
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```

mod event_bus;
mod monitor_event;
mod session_id;

pub use event_bus::EventBus;
pub use monitor_event::MonitorEvent;
pub use session_id::SessionId;
