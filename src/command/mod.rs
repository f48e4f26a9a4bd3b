// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Controller command definitions.
//!
//! Commands are JSON objects with a `cmd` field, sent one per line and
//! terminated by `\r\n`. They carry no correlation id: during the handshake
//! the next response on the socket is taken as the reply, afterwards replies
//! arrive as ordinary push events.
//!
//! | Command | Wire form |
//! |---------|-----------|
//! | [`Command::StartEvents`] | `{"cmd":"startevents"}` |
//! | [`Command::SystemInfo`] | `{"cmd":"systeminfo"}` |
//! | [`Command::ListEnergy`] | `{"cmd":"listenergy"}` |
//! | [`Command::GetLive`] | `{"cmd":"getlive","channel":3}` |
//!
//! # Examples
//!
//! ```
//! use niko_energy::command::Command;
//! use niko_energy::types::ChannelId;
//!
//! let bytes = Command::get_live(ChannelId::from(3)).encode().unwrap();
//! assert_eq!(bytes, b"{\"cmd\":\"getlive\",\"channel\":3}\r\n");
//! ```

use serde::{Serialize, Serializer};

use crate::error::ProtocolError;
use crate::types::ChannelId;

/// Line terminator expected by the controller.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// An outbound request to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum Command {
    /// Enables unsolicited push events on this connection.
    StartEvents,
    /// Requests general system information.
    SystemInfo,
    /// Lists the energy channels known to the controller.
    ListEnergy,
    /// Requests the current wattage of one channel.
    GetLive {
        /// The channel to query.
        #[serde(serialize_with = "serialize_channel")]
        channel: ChannelId,
    },
}

impl Command {
    /// Creates a live query for `channel`.
    #[must_use]
    pub fn get_live(channel: impl Into<ChannelId>) -> Self {
        Self::GetLive {
            channel: channel.into(),
        }
    }

    /// Returns the command name as it appears in the `cmd` field.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::StartEvents => "startevents",
            Self::SystemInfo => "systeminfo",
            Self::ListEnergy => "listenergy",
            Self::GetLive { .. } => "getlive",
        }
    }

    /// Serializes the command as a UTF-8 JSON line ending in `\r\n`.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Json` if serialization fails.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = serde_json::to_vec(self)?;
        bytes.extend_from_slice(LINE_TERMINATOR);
        Ok(bytes)
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetLive { channel } => write!(f, "getlive({channel})"),
            other => f.write_str(other.name()),
        }
    }
}

/// Channels are sent as integers when they are numeric.
fn serialize_channel<S: Serializer>(channel: &ChannelId, serializer: S) -> Result<S::Ok, S::Error> {
    channel.wire_value().serialize(serializer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_startevents() {
        assert_eq!(
            Command::StartEvents.encode().unwrap(),
            b"{\"cmd\":\"startevents\"}\r\n"
        );
    }

    #[test]
    fn encode_systeminfo() {
        assert_eq!(
            Command::SystemInfo.encode().unwrap(),
            b"{\"cmd\":\"systeminfo\"}\r\n"
        );
    }

    #[test]
    fn encode_listenergy() {
        assert_eq!(
            Command::ListEnergy.encode().unwrap(),
            b"{\"cmd\":\"listenergy\"}\r\n"
        );
    }

    #[test]
    fn getlive_sends_numeric_channel() {
        let json: serde_json::Value =
            serde_json::from_slice(&Command::get_live("12").encode().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({"cmd": "getlive", "channel": 12}));
    }

    #[test]
    fn getlive_keeps_non_numeric_channel_as_string() {
        let json: serde_json::Value =
            serde_json::from_slice(&Command::get_live("aux").encode().unwrap()).unwrap();
        assert_eq!(json["channel"], serde_json::json!("aux"));
    }

    #[test]
    fn display() {
        assert_eq!(Command::get_live(5).to_string(), "getlive(5)");
        assert_eq!(Command::SystemInfo.to_string(), "systeminfo");
    }
}
