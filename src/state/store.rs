// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Lock-guarded store of channel states.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::energy;
use crate::types::{ChannelId, ChannelSample};

use super::ChannelState;

/// Mapping from channel to its current power and energy values.
///
/// Every access takes a single `parking_lot::Mutex` for the duration of one
/// call. The lock is never held across I/O or while notifying subscribers,
/// so readers never wait on the network.
///
/// Entries are created lazily on the first sample for a channel.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use niko_energy::state::ChannelStore;
/// use niko_energy::types::{ChannelId, ChannelSample};
///
/// let store = ChannelStore::new();
/// store.record(&ChannelSample::new(1, 120.0), Utc::now());
///
/// let state = store.get(&ChannelId::from(1)).unwrap();
/// assert_eq!(state.power_watts, 120.0);
/// ```
#[derive(Debug, Default)]
pub struct ChannelStore {
    channels: Mutex<HashMap<ChannelId, ChannelState>>,
}

impl ChannelStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the state of a channel, if it has produced a sample.
    #[must_use]
    pub fn get(&self, channel: &ChannelId) -> Option<ChannelState> {
        self.channels.lock().get(channel).copied()
    }

    /// Replaces the state of a channel.
    pub fn update(&self, channel: ChannelId, state: ChannelState) {
        self.channels.lock().insert(channel, state);
    }

    /// Integrates a sample into the channel's state and returns the new state.
    ///
    /// The read of the prior state and the write of the new one happen under
    /// one lock acquisition, so concurrent readers never see a half-applied
    /// sample.
    pub fn record(&self, sample: &ChannelSample, now: DateTime<Utc>) -> ChannelState {
        let mut channels = self.channels.lock();
        let prior = channels.get(&sample.channel);
        let next = energy::integrate(prior, sample, now);
        channels.insert(sample.channel.clone(), next);
        next
    }

    /// Returns a copy of every channel's state.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<ChannelId, ChannelState> {
        self.channels.lock().clone()
    }

    /// Returns the number of channels that have produced a sample.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.lock().len()
    }

    /// Returns `true` if no channel has produced a sample yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.lock().is_empty()
    }
}
