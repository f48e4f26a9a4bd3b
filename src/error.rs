// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the energy monitor.
//!
//! Errors fall in two groups. Connection, handshake and transport errors end
//! a monitoring session and are reported once to its owner. Protocol and
//! notification errors are absorbed where they happen: the offending line or
//! handler is logged and skipped, and the session keeps running.

use std::io;

use thiserror::Error;

use crate::subscription::SubscriptionId;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Opening the TCP connection to the controller failed.
    #[error("connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// The initial command/response exchange failed.
    #[error("handshake error: {0}")]
    Handshake(#[from] HandshakeError),

    /// The socket failed or was closed while the session was live.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// A message from the controller could not be understood.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The session configuration is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// `start` was called on a monitor that was already started.
    #[error("session already started")]
    AlreadyStarted,

    /// The session stopped before the initial live-query round completed.
    #[error("session stopped before becoming ready")]
    StoppedBeforeReady,

    /// The session task did not finish within the allotted time.
    #[error("session did not stop within {0} ms")]
    JoinTimeout(u64),

    /// No monitor is registered under the requested session id.
    #[error("session not found")]
    SessionNotFound,

    /// The session task panicked or was cancelled.
    #[error("session worker failed: {0}")]
    Worker(String),
}

/// Errors raised while opening the connection to the controller.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The TCP connect call failed.
    #[error("failed to connect to {address}: {source}")]
    Io {
        /// The `host:port` that was dialed.
        address: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The TCP connect call did not complete in time.
    #[error("connecting to {address} timed out after {timeout_ms} ms")]
    Timeout {
        /// The `host:port` that was dialed.
        address: String,
        /// The connect timeout in milliseconds.
        timeout_ms: u64,
    },
}

/// Errors raised during the `startevents` / `systeminfo` / priming exchange.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// No response arrived for a command within the response timeout.
    #[error("no response to {command} within {timeout_ms} ms")]
    Timeout {
        /// The command that went unanswered.
        command: String,
        /// The response timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The controller closed the connection mid-handshake.
    #[error("connection closed while waiting for {command}")]
    Closed {
        /// The command that was awaiting a response.
        command: String,
    },

    /// Reading or writing the socket failed.
    #[error("I/O error during {command}: {source}")]
    Io {
        /// The command being exchanged.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// Errors that end a live session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The controller closed the connection.
    #[error("connection closed by peer")]
    Closed,

    /// Reading or writing the socket failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors related to decoding controller messages.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A line was not valid JSON.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line was not valid UTF-8.
    #[error("line is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// A line grew past the buffer limit without a terminating newline.
    #[error("line exceeds {limit} bytes")]
    LineTooLong {
        /// The limit in bytes.
        limit: usize,
    },

    /// An expected field is missing from the message.
    #[error("missing field in message: {0}")]
    MissingField(String),

    /// A field is present but holds an unusable value.
    #[error("invalid value for {field}: {message}")]
    InvalidValue {
        /// The field that failed to parse.
        field: String,
        /// Description of the failure.
        message: String,
    },
}

/// Errors raised by a notification handler.
///
/// These never leave the notification bus; they exist so the failure can be
/// logged with context.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The handler panicked while being invoked.
    #[error("handler {subscription} panicked: {message}")]
    HandlerPanicked {
        /// The subscription whose handler failed.
        subscription: SubscriptionId,
        /// The panic payload, when it was a string.
        message: String,
    },
}

/// Errors related to session configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The controller host is empty.
    #[error("controller host must not be empty")]
    EmptyHost,

    /// The controller port is zero.
    #[error("controller port must not be 0")]
    InvalidPort,

    /// A timeout or interval is zero.
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// The refresh cadence is zero.
    #[error("refresh cadence must be at least one read cycle")]
    InvalidRefreshCadence,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_error_display() {
        let err = ProtocolError::MissingField("data.v".to_string());
        assert_eq!(err.to_string(), "missing field in message: data.v");
    }

    #[test]
    fn handshake_timeout_display() {
        let err = HandshakeError::Timeout {
            command: "startevents".to_string(),
            timeout_ms: 250,
        };
        assert_eq!(err.to_string(), "no response to startevents within 250 ms");
    }

    #[test]
    fn error_from_transport_error() {
        let err: Error = TransportError::Closed.into();
        assert!(matches!(err, Error::Transport(TransportError::Closed)));
        assert_eq!(err.to_string(), "transport error: connection closed by peer");
    }

    #[test]
    fn config_error_display() {
        let err = ConfigError::ZeroDuration("poll interval");
        assert_eq!(err.to_string(), "poll interval must be greater than zero");
    }

    #[test]
    fn notification_error_display() {
        let err = NotificationError::HandlerPanicked {
            subscription: SubscriptionId::new(7),
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "handler Sub(7) panicked: boom");
    }
}
