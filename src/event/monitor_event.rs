// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Monitor event types.

use crate::session::SessionState;
use crate::state::ChannelState;
use crate::types::ChannelId;

use super::SessionId;

/// Events published by a monitoring session.
///
/// Every event carries the id of the session that produced it, so several
/// monitors can share one consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// The session moved to a new lifecycle state.
    StateChanged {
        /// The session that changed.
        session_id: SessionId,
        /// The state it entered.
        state: SessionState,
    },

    /// A channel's power and energy values changed.
    ChannelUpdated {
        /// The session that received the sample.
        session_id: SessionId,
        /// The channel that changed.
        channel: ChannelId,
        /// The channel's state after the update.
        state: ChannelState,
    },
}

impl MonitorEvent {
    /// Returns the session ID associated with this event.
    #[must_use]
    pub fn session_id(&self) -> SessionId {
        match self {
            Self::StateChanged { session_id, .. } | Self::ChannelUpdated { session_id, .. } => {
                *session_id
            }
        }
    }

    /// Returns the channel for channel updates.
    #[must_use]
    pub fn channel(&self) -> Option<&ChannelId> {
        match self {
            Self::ChannelUpdated { channel, .. } => Some(channel),
            Self::StateChanged { .. } => None,
        }
    }

    /// Returns `true` if this is a lifecycle event.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let session_id = SessionId::new();
        let update = MonitorEvent::ChannelUpdated {
            session_id,
            channel: ChannelId::from(4),
            state: ChannelState::default(),
        };
        let lifecycle = MonitorEvent::StateChanged {
            session_id,
            state: SessionState::Live,
        };

        assert_eq!(update.session_id(), session_id);
        assert_eq!(update.channel(), Some(&ChannelId::from(4)));
        assert!(!update.is_state_change());
        assert!(lifecycle.is_state_change());
        assert_eq!(lifecycle.channel(), None);
    }
}
