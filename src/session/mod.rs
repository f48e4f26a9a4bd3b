// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitoring sessions.
//!
//! A session connects to the controller, enables push events, primes every
//! configured channel with a live query, and then listens. The receive
//! timeout doubles as the scheduling tick: every few read cycles the live
//! queries are sent again so channels stay fresh when the controller goes
//! quiet.
//!
//! Subscribed handlers are called from a separate dispatcher task that runs
//! them on the blocking pool, away from the socket.
//!
//! ```text
//! Disconnected -> Connecting -> Handshaking -> Live -> Stopped
//!                      |             |
//!                      +-------------+--------------> Stopped
//! ```
//!
//! - [`EnergyMonitor`] - Owner-facing handle: start, read, subscribe, stop
//! - [`SessionConfig`] - Controller address, channels and timing
//! - [`SessionState`] - Lifecycle states

mod config;
mod dispatch;
mod monitor;
mod state;
mod worker;

pub use config::{ChannelConfig, DEFAULT_PORT, SessionConfig, SessionConfigBuilder};
pub use monitor::EnergyMonitor;
pub use state::SessionState;
