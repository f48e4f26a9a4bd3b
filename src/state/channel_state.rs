// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-channel power and energy state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tracked state of one energy channel.
///
/// `energy_kwh` only grows for the lifetime of a monitoring session as long
/// as the controller reports non-negative power. `last_sample_at` is `None`
/// until the first sample for the channel arrives.
///
/// # Examples
///
/// ```
/// use niko_energy::state::ChannelState;
///
/// let state = ChannelState::default();
/// assert_eq!(state.energy_kwh, 0.0);
/// assert!(state.last_sample_at.is_none());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ChannelState {
    /// Instantaneous power in Watts.
    pub power_watts: f64,
    /// Energy accumulated during this session in kWh.
    pub energy_kwh: f64,
    /// When the latest sample was recorded.
    pub last_sample_at: Option<DateTime<Utc>>,
}

impl ChannelState {
    /// Returns the point-in-time reading for this state.
    #[must_use]
    pub fn reading(&self) -> Reading {
        Reading {
            power_watts: self.power_watts,
            energy_kwh: self.energy_kwh,
        }
    }
}

/// Point-in-time power and energy values handed to consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Instantaneous power in Watts.
    pub power_watts: f64,
    /// Accumulated energy in kWh.
    pub energy_kwh: f64,
}
