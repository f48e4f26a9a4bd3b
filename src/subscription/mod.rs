// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Subscription system for channel changes.
//!
//! Handlers registered on a [`NotificationBus`] are called with the id of a
//! channel each time its power and energy values change. A monitor calls
//! them from its dispatcher on the blocking pool, one after another, and
//! each is isolated from the others.
//!
//! # Usage
//!
//! ```no_run
//! use niko_energy::{EnergyMonitor, SessionConfig};
//!
//! # async fn example() -> niko_energy::Result<()> {
//! let config = SessionConfig::builder().host("192.168.3.40").channel(1, "Oven").build()?;
//! let monitor = EnergyMonitor::new(config);
//!
//! let sub_id = monitor.subscribe(|channel| {
//!     println!("Channel {channel} changed");
//! });
//!
//! // Later, unsubscribe
//! monitor.unsubscribe(sub_id);
//! # Ok(())
//! # }
//! ```
//!
//! Consumers that want notifications on their own task should use
//! [`EnergyMonitor::events`](crate::EnergyMonitor::events) instead.

mod callback;

pub use callback::{NotificationBus, SubscriptionId};
