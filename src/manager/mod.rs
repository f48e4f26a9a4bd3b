// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of running monitors.
//!
//! Applications that run several sessions, for example one per configured
//! controller entry, keep them in a [`MonitorRegistry`] owned by their
//! composition root and pass it to whatever needs to look monitors up.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use niko_energy::manager::MonitorRegistry;
//! use niko_energy::{EnergyMonitor, SessionConfig};
//!
//! # async fn example() -> niko_energy::Result<()> {
//! let registry = MonitorRegistry::new();
//!
//! let config = SessionConfig::builder().host("192.168.3.40").channel(1, "Oven").build()?;
//! let monitor = Arc::new(EnergyMonitor::new(config));
//! monitor.start()?;
//! let session_id = registry.insert(Arc::clone(&monitor));
//!
//! // On application shutdown
//! registry.shutdown_all(Duration::from_secs(5)).await;
//! # Ok(())
//! # }
//! ```

mod registry;

pub use registry::MonitorRegistry;
