// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session lifecycle states.

use std::fmt;

/// Lifecycle state of a monitoring session.
///
/// Sessions only move forward:
/// `Disconnected -> Connecting -> Handshaking -> Live -> Stopped`.
/// Any failure before `Live` goes straight to `Stopped`; there are no
/// internal retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionState {
    /// Created but not started.
    #[default]
    Disconnected,
    /// Opening the TCP connection.
    Connecting,
    /// Exchanging the initial commands and priming live queries.
    Handshaking,
    /// Receiving push events and refreshing live queries.
    Live,
    /// Finished, by request or failure.
    Stopped,
}

impl SessionState {
    /// Returns `true` while the session task is working.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, Self::Connecting | Self::Handshaking | Self::Live)
    }

    /// Returns `true` once the session can no longer change state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Stopped)
    }

    /// Returns the lowercase state name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Handshaking => "handshaking",
            Self::Live => "live",
            Self::Stopped => "stopped",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
