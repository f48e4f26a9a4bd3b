// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveredChannel;
use crate::error::ConfigError;
use crate::protocol::millis;
use crate::types::ChannelId;

/// Default controller TCP port.
pub const DEFAULT_PORT: u16 = 8080;

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_RESPONSE_TIMEOUT_MS: u64 = 100_000;
const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;
const DEFAULT_REFRESH_EVERY: u32 = 5;

/// Settings of one configured channel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Display name of the channel.
    #[serde(default)]
    pub name: String,
}

impl ChannelConfig {
    /// Creates a channel configuration with a display name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Configuration of one monitoring session.
///
/// Deserializes from the persisted shape used by host integrations, where
/// the connection fields are prefixed:
///
/// ```
/// use niko_energy::SessionConfig;
///
/// let config: SessionConfig = serde_json::from_str(r#"{
///     "niko_host": "192.168.3.40",
///     "niko_port": 8000,
///     "channels": {"1": {"name": "Oven"}, "2": {"name": "Heat pump"}}
/// }"#).unwrap();
///
/// assert_eq!(config.port, 8000);
/// assert_eq!(config.channels.len(), 2);
/// ```
///
/// Timeouts are stored in milliseconds and exposed as [`Duration`]s.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Controller host name or IP address.
    #[serde(alias = "niko_host")]
    pub host: String,
    /// Controller TCP port.
    #[serde(alias = "niko_port", default = "default_port")]
    pub port: u16,
    /// Channels to poll, keyed by channel id.
    #[serde(default)]
    pub channels: BTreeMap<ChannelId, ChannelConfig>,
    /// Bound on the TCP connect.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Bound on each handshake and priming response.
    #[serde(default = "default_response_timeout_ms")]
    pub response_timeout_ms: u64,
    /// Receive timeout of the live loop; one tick per read cycle.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Number of read cycles between live-query refreshes.
    #[serde(default = "default_refresh_every")]
    pub refresh_every: u32,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_connect_timeout_ms() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_MS
}

fn default_response_timeout_ms() -> u64 {
    DEFAULT_RESPONSE_TIMEOUT_MS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

fn default_refresh_every() -> u32 {
    DEFAULT_REFRESH_EVERY
}

impl SessionConfig {
    /// Creates a configuration for `host` with default settings and no
    /// channels.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            channels: BTreeMap::new(),
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            refresh_every: DEFAULT_REFRESH_EVERY,
        }
    }

    /// Creates a builder.
    #[must_use]
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Creates a configuration polling every discovered channel under its
    /// discovered name.
    #[must_use]
    pub fn from_discovery(
        host: impl Into<String>,
        port: u16,
        discovered: &[DiscoveredChannel],
    ) -> Self {
        let mut config = Self::new(host);
        config.port = port;
        config.channels = discovered
            .iter()
            .map(|d| (d.channel.clone(), ChannelConfig::named(d.name.clone())))
            .collect();
        config
    }

    /// Returns the connect timeout.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the handshake and priming response timeout.
    #[must_use]
    pub fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.response_timeout_ms)
    }

    /// Returns the live-loop receive timeout.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Returns the configured channel ids in order.
    pub fn channel_ids(&self) -> impl Iterator<Item = &ChannelId> {
        self.channels.keys()
    }

    /// Returns the display name of a channel.
    ///
    /// Falls back to `"Channel <id>"` when the channel is unnamed or not
    /// configured.
    #[must_use]
    pub fn channel_name(&self, channel: &ChannelId) -> String {
        match self.channels.get(channel) {
            Some(c) if !c.name.trim().is_empty() => c.name.clone(),
            _ => format!("Channel {channel}"),
        }
    }

    /// Checks that the configuration can drive a session.
    ///
    /// # Errors
    ///
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::EmptyHost);
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("connect timeout"));
        }
        if self.response_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("response timeout"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroDuration("poll interval"));
        }
        if self.refresh_every == 0 {
            return Err(ConfigError::InvalidRefreshCadence);
        }
        Ok(())
    }
}

/// Builder for [`SessionConfig`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use niko_energy::SessionConfig;
///
/// let config = SessionConfig::builder()
///     .host("192.168.3.40")
///     .channel(1, "Oven")
///     .channel(2, "Dryer")
///     .poll_interval(Duration::from_secs(2))
///     .build()
///     .unwrap();
///
/// assert_eq!(config.port, 8080);
/// assert_eq!(config.channel_ids().count(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfigBuilder {
    config: SessionConfig,
}

impl Default for SessionConfigBuilder {
    fn default() -> Self {
        Self {
            config: SessionConfig::new(String::new()),
        }
    }
}

impl SessionConfigBuilder {
    /// Sets the controller host.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    /// Sets the controller port.
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Adds a named channel.
    #[must_use]
    pub fn channel(mut self, channel: impl Into<ChannelId>, name: impl Into<String>) -> Self {
        self.config
            .channels
            .insert(channel.into(), ChannelConfig::named(name));
        self
    }

    /// Adds unnamed channels.
    #[must_use]
    pub fn channels<I, C>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ChannelId>,
    {
        for channel in channels {
            self.config
                .channels
                .entry(channel.into())
                .or_default();
        }
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = millis(timeout);
        self
    }

    /// Sets the handshake and priming response timeout.
    #[must_use]
    pub fn response_timeout(mut self, timeout: Duration) -> Self {
        self.config.response_timeout_ms = millis(timeout);
        self
    }

    /// Sets the live-loop receive timeout.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval_ms = millis(interval);
        self
    }

    /// Sets how many read cycles pass between live-query refreshes.
    #[must_use]
    pub fn refresh_every(mut self, cycles: u32) -> Self {
        self.config.refresh_every = cycles;
        self
    }

    /// Validates and returns the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn build(self) -> Result<SessionConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
