// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sensor descriptors for host integrations.
//!
//! Every configured channel is exposed as two sensors: its instantaneous
//! power and its accumulated energy. Descriptors carry the identity and
//! metadata a home-automation host needs to register them, and read their
//! values back from an [`EnergyMonitor`].

use serde::{Deserialize, Serialize};

use crate::session::{EnergyMonitor, SessionConfig};
use crate::state::Reading;
use crate::types::ChannelId;

/// What a sensor measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Instantaneous power in watts.
    Power,
    /// Accumulated energy in kilowatt-hours.
    Energy,
}

/// How a host should aggregate a sensor's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateClass {
    /// A point-in-time value.
    Measurement,
    /// A running total that only resets when the session restarts.
    TotalIncreasing,
}

/// One sensor of one channel.
///
/// # Examples
///
/// ```
/// use niko_energy::SessionConfig;
/// use niko_energy::sensor::{sensors_for, SensorKind};
///
/// let config = SessionConfig::builder()
///     .host("controller")
///     .channel(1, "Oven")
///     .build()
///     .unwrap();
///
/// let sensors = sensors_for(&config);
/// assert_eq!(sensors.len(), 2);
/// assert_eq!(sensors[0].unique_id, "niko_power_1");
/// assert_eq!(sensors[0].name, "Oven Power");
/// assert_eq!(sensors[1].kind, SensorKind::Energy);
/// assert_eq!(sensors[1].unit(), "kWh");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorDescriptor {
    /// Stable identifier, unique per channel and kind.
    pub unique_id: String,
    /// Display name.
    pub name: String,
    /// The channel this sensor reads.
    pub channel: ChannelId,
    /// What the sensor measures.
    pub kind: SensorKind,
}

impl SensorDescriptor {
    /// Creates the power sensor of a channel.
    #[must_use]
    pub fn power(channel: ChannelId, channel_name: &str) -> Self {
        Self {
            unique_id: format!("niko_power_{channel}"),
            name: format!("{channel_name} Power"),
            channel,
            kind: SensorKind::Power,
        }
    }

    /// Creates the energy sensor of a channel.
    #[must_use]
    pub fn energy(channel: ChannelId, channel_name: &str) -> Self {
        Self {
            unique_id: format!("niko_energy_{channel}"),
            name: format!("{channel_name} Energy"),
            channel,
            kind: SensorKind::Energy,
        }
    }

    /// Returns the unit of measurement.
    #[must_use]
    pub fn unit(&self) -> &'static str {
        match self.kind {
            SensorKind::Power => "W",
            SensorKind::Energy => "kWh",
        }
    }

    /// Returns the host device class.
    #[must_use]
    pub fn device_class(&self) -> &'static str {
        match self.kind {
            SensorKind::Power => "power",
            SensorKind::Energy => "energy",
        }
    }

    /// Returns the host state class.
    #[must_use]
    pub fn state_class(&self) -> StateClass {
        match self.kind {
            SensorKind::Power => StateClass::Measurement,
            SensorKind::Energy => StateClass::TotalIncreasing,
        }
    }

    /// Returns `true` if a change notification for `channel` concerns this
    /// sensor.
    #[must_use]
    pub fn is_for(&self, channel: &ChannelId) -> bool {
        &self.channel == channel
    }

    /// Returns the sensor value for a channel reading.
    ///
    /// Power is unknown until the first sample; energy starts at zero.
    #[must_use]
    pub fn value_of(&self, reading: Option<Reading>) -> Option<f64> {
        match self.kind {
            SensorKind::Power => reading.map(|r| r.power_watts),
            SensorKind::Energy => Some(reading.map_or(0.0, |r| r.energy_kwh)),
        }
    }

    /// Reads the current sensor value from a monitor.
    #[must_use]
    pub fn value(&self, monitor: &EnergyMonitor) -> Option<f64> {
        self.value_of(monitor.current(&self.channel))
    }
}

/// Returns the power and energy sensors of every configured channel.
#[must_use]
pub fn sensors_for(config: &SessionConfig) -> Vec<SensorDescriptor> {
    config
        .channel_ids()
        .flat_map(|channel| {
            let name = config.channel_name(channel);
            [
                SensorDescriptor::power(channel.clone(), &name),
                SensorDescriptor::energy(channel.clone(), &name),
            ]
        })
        .collect()
}
