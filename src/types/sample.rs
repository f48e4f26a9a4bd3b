// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instantaneous power samples.

use super::ChannelId;

/// An instantaneous power reading as reported by the controller.
///
/// Samples are consumed by the energy integrator and never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelSample {
    /// The channel the reading belongs to.
    pub channel: ChannelId,
    /// Instantaneous power in Watts.
    pub watts: f64,
}

impl ChannelSample {
    /// Creates a sample.
    #[must_use]
    pub fn new(channel: impl Into<ChannelId>, watts: f64) -> Self {
        Self {
            channel: channel.into(),
            watts,
        }
    }
}
