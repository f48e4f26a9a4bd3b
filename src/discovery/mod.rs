// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! One-shot channel discovery.
//!
//! Before a session is configured, the controller can be asked which energy
//! channels it meters. Discovery opens its own short-lived connection,
//! performs the same `startevents` / `systeminfo` exchange as a session, then
//! sends `listenergy` and waits for the reply carrying the channel list:
//!
//! ```text
//! {"cmd":"listenergy"}
//! {"data":[{"channel":1,"name":"Oven","type":"..."}, ...]}
//! ```
//!
//! # Examples
//!
//! ```no_run
//! use niko_energy::discovery::{discover_channels, DiscoveryOptions};
//! use niko_energy::{EnergyMonitor, SessionConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> niko_energy::Result<()> {
//! let options = DiscoveryOptions::new().with_timeout(Duration::from_secs(10));
//! let channels = discover_channels("192.168.3.40", 8080, Some(options)).await?;
//!
//! for channel in &channels {
//!     println!("{}: {}", channel.channel, channel.name);
//! }
//!
//! let monitor = EnergyMonitor::new(SessionConfig::from_discovery("192.168.3.40", 8080, &channels));
//! monitor.start()?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::Instant;

use crate::command::Command;
use crate::error::{Error, HandshakeError};
use crate::protocol::{Connection, LineCodec, Received, millis};
use crate::types::ChannelId;

/// Default bound on the connect and on each response.
const DEFAULT_DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Options for channel discovery.
///
/// # Examples
///
/// ```
/// use niko_energy::discovery::DiscoveryOptions;
/// use std::time::Duration;
///
/// let options = DiscoveryOptions::new()
///     .with_connect_timeout(Duration::from_secs(2))
///     .with_timeout(Duration::from_secs(10));
/// assert_eq!(options.timeout(), Duration::from_secs(10));
/// ```
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    /// Bound on each response.
    timeout: Option<Duration>,
    /// Bound on the TCP connect.
    connect_timeout: Option<Duration>,
}

impl DiscoveryOptions {
    /// Creates options with the default 5 second timeouts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long to wait for each response.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets how long to wait for the TCP connect.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Returns the response timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_DISCOVERY_TIMEOUT)
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout.unwrap_or(DEFAULT_DISCOVERY_TIMEOUT)
    }
}

/// A channel reported by the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredChannel {
    /// Channel identifier, always in its string form.
    pub channel: ChannelId,
    /// Name assigned on the controller.
    #[serde(default)]
    pub name: String,
    /// Channel type as reported by the controller.
    #[serde(default, rename = "type")]
    pub kind: String,
}

/// Asks the controller for its energy channels.
///
/// # Errors
///
/// Returns `Error::Connection` if the controller cannot be reached and
/// `Error::Handshake` if any of the three exchanges times out, fails or the
/// connection closes before the channel list arrives.
pub async fn discover_channels(
    host: &str,
    port: u16,
    options: Option<DiscoveryOptions>,
) -> Result<Vec<DiscoveredChannel>, Error> {
    let options = options.unwrap_or_default();
    tracing::info!(%host, port, "Starting channel discovery");

    let mut connection = Connection::open(host, port, options.connect_timeout()).await?;
    let result = list_channels(&mut connection, options.timeout()).await;
    connection.close();

    let channels = result?;
    tracing::info!(count = channels.len(), "Channel discovery completed");
    Ok(channels)
}

async fn list_channels(
    connection: &mut Connection,
    timeout: Duration,
) -> Result<Vec<DiscoveredChannel>, HandshakeError> {
    for command in [Command::StartEvents, Command::SystemInfo] {
        send(connection, &command).await?;
        if receive(connection, &command, timeout).await?.is_none() {
            return Err(HandshakeError::Timeout {
                command: command.to_string(),
                timeout_ms: millis(timeout),
            });
        }
    }

    let command = Command::ListEnergy;
    send(connection, &command).await?;

    // Push events may arrive ahead of the list; keep reading until it shows
    // up or the response window closes.
    let deadline = Instant::now() + timeout;
    let mut codec = LineCodec::new();
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let Some(bytes) = receive(connection, &command, remaining).await? else {
            return Err(HandshakeError::Timeout {
                command: command.to_string(),
                timeout_ms: millis(timeout),
            });
        };

        for message in codec.feed(&bytes) {
            if let Some(channels) = parse_channel_list(&message) {
                return Ok(channels);
            }
            tracing::trace!("Skipping message while waiting for channel list");
        }
    }
}

async fn send(connection: &mut Connection, command: &Command) -> Result<(), HandshakeError> {
    connection
        .send(command)
        .await
        .map_err(|source| HandshakeError::Io {
            command: command.to_string(),
            source,
        })
}

/// Reads once; `None` means the timeout elapsed.
async fn receive(
    connection: &mut Connection,
    command: &Command,
    timeout: Duration,
) -> Result<Option<Vec<u8>>, HandshakeError> {
    match connection.receive(timeout).await {
        Ok(Received::Data(bytes)) => Ok(Some(bytes)),
        Ok(Received::TimedOut) => Ok(None),
        Ok(Received::Closed) => Err(HandshakeError::Closed {
            command: command.to_string(),
        }),
        Err(source) => Err(HandshakeError::Io {
            command: command.to_string(),
            source,
        }),
    }
}

/// Extracts the channel list from a `listenergy` reply.
///
/// Returns `None` for messages without a `data` array. Entries lacking a
/// usable `channel` are skipped.
#[must_use]
pub fn parse_channel_list(message: &Value) -> Option<Vec<DiscoveredChannel>> {
    let entries = message.get("data")?.as_array()?;

    let channels = entries
        .iter()
        .filter_map(|entry| match DiscoveredChannel::deserialize(entry) {
            Ok(channel) => Some(channel),
            Err(e) => {
                tracing::warn!(error = %e, %entry, "Skipping unusable channel entry");
                None
            }
        })
        .collect();
    Some(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn options_defaults() {
        let options = DiscoveryOptions::new();
        assert_eq!(options.timeout(), Duration::from_secs(5));
        assert_eq!(options.connect_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn parse_list_normalizes_channel_ids() {
        let message = json!({
            "data": [
                {"channel": 1, "name": "Oven", "type": "consumption"},
                {"channel": "2", "name": "Solar", "type": "production"}
            ]
        });

        let channels = parse_channel_list(&message).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].channel.as_str(), "1");
        assert_eq!(channels[0].name, "Oven");
        assert_eq!(channels[0].kind, "consumption");
        assert_eq!(channels[1].channel, ChannelId::from(2));
    }

    #[test]
    fn parse_list_skips_bad_entries() {
        let message = json!({
            "data": [
                {"name": "No channel"},
                {"channel": 5}
            ]
        });

        let channels = parse_channel_list(&message).unwrap();
        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].channel, ChannelId::from(5));
        assert!(channels[0].name.is_empty());
    }

    #[test]
    fn other_messages_are_not_lists() {
        assert!(parse_channel_list(&json!({"event": "getlive", "data": {"channel": 1}})).is_none());
        assert!(parse_channel_list(&json!({"systeminfo": {}})).is_none());
    }

    #[test]
    fn discovered_channel_serializes_type_field() {
        let channel = DiscoveredChannel {
            channel: ChannelId::from(3),
            name: "Dryer".to_string(),
            kind: "consumption".to_string(),
        };
        let json = serde_json::to_value(&channel).unwrap();
        assert_eq!(json, json!({"channel": "3", "name": "Dryer", "type": "consumption"}));
    }
}
