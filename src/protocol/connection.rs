// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! TCP connection to the controller.

use std::io;
use std::net::Shutdown;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::command::Command;
use crate::error::ConnectionError;

/// Size of the receive buffer for one read.
const READ_BUFFER_SIZE: usize = 4096;

/// Outcome of one bounded receive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// Bytes arrived.
    Data(Vec<u8>),
    /// Nothing arrived within the timeout.
    TimedOut,
    /// The peer closed the connection (zero-length read).
    Closed,
}

/// An open connection to the controller.
///
/// Thin wrapper over a `tokio::net::TcpStream` that speaks in commands and
/// bounded receives. It has exactly one owner; the session task never shares
/// it.
#[derive(Debug)]
pub struct Connection {
    stream: TcpStream,
    address: String,
}

impl Connection {
    /// Opens a connection with a bounded connect timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::Timeout` if the connect does not complete in
    /// time, or `ConnectionError::Io` if it fails.
    pub async fn open(host: &str, port: u16, timeout: Duration) -> Result<Self, ConnectionError> {
        let address = format!("{host}:{port}");
        tracing::debug!(%address, "Connecting to controller");

        let stream = tokio::time::timeout(timeout, TcpStream::connect(address.as_str()))
            .await
            .map_err(|_| ConnectionError::Timeout {
                address: address.clone(),
                timeout_ms: millis(timeout),
            })?
            .map_err(|source| ConnectionError::Io {
                address: address.clone(),
                source,
            })?;

        // Commands are tiny and latency matters more than batching.
        if let Err(e) = stream.set_nodelay(true) {
            tracing::debug!(%address, error = %e, "Could not disable Nagle");
        }

        tracing::debug!(%address, "Connected to controller");
        Ok(Self { stream, address })
    }

    /// Returns the `host:port` this connection was opened to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Writes one command line.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the write fails.
    pub async fn send(&mut self, command: &Command) -> io::Result<()> {
        let bytes = command
            .encode()
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        tracing::trace!(address = %self.address, %command, "Sending command");
        self.stream.write_all(&bytes).await
    }

    /// Reads whatever arrives within `timeout`.
    ///
    /// A timeout is a normal outcome, not an error.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the read fails.
    pub async fn receive(&mut self, timeout: Duration) -> io::Result<Received> {
        let mut buf = vec![0_u8; READ_BUFFER_SIZE];
        match tokio::time::timeout(timeout, self.stream.read(&mut buf)).await {
            Err(_) => Ok(Received::TimedOut),
            Ok(Ok(0)) => Ok(Received::Closed),
            Ok(Ok(n)) => {
                buf.truncate(n);
                Ok(Received::Data(buf))
            }
            Ok(Err(e)) => Err(e),
        }
    }

    /// Shuts down both directions of the socket and closes it.
    ///
    /// Errors are ignored; the socket may already be dead.
    pub fn close(self) {
        let address = self.address;
        match self.stream.into_std() {
            Ok(stream) => {
                if let Err(e) = stream.shutdown(Shutdown::Both) {
                    tracing::trace!(%address, error = %e, "Socket shutdown failed");
                }
            }
            Err(e) => tracing::trace!(%address, error = %e, "Socket already closed"),
        }
        tracing::debug!(%address, "Connection closed");
    }
}

/// Converts a duration to whole milliseconds for error reporting.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncBufReadExt;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn send_and_receive() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let (reader, mut writer) = stream.into_split();
            let mut lines = tokio::io::BufReader::new(reader).lines();
            let line = lines.next_line().await.unwrap().unwrap();
            writer.write_all(b"{\"ok\":true}\n").await.unwrap();
            line
        });

        let mut conn = Connection::open("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(conn.address(), format!("127.0.0.1:{port}"));

        conn.send(&Command::SystemInfo).await.unwrap();
        let received = conn.receive(Duration::from_secs(1)).await.unwrap();

        assert_eq!(received, Received::Data(b"{\"ok\":true}\n".to_vec()));
        assert_eq!(server.await.unwrap(), "{\"cmd\":\"systeminfo\"}");
        conn.close();
    }

    #[tokio::test]
    async fn receive_times_out_quietly() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(stream);
        });

        let mut conn = Connection::open("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap();
        let received = conn.receive(Duration::from_millis(50)).await.unwrap();
        assert_eq!(received, Received::TimedOut);
    }

    #[tokio::test]
    async fn receive_reports_peer_close() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            drop(stream);
        });

        let mut conn = Connection::open("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap();
        server.await.unwrap();

        let received = conn.receive(Duration::from_secs(1)).await.unwrap();
        assert_eq!(received, Received::Closed);
    }

    #[tokio::test]
    async fn open_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = Connection::open("127.0.0.1", port, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ConnectionError::Io { .. }));
    }

    #[test]
    fn millis_saturates() {
        assert_eq!(millis(Duration::from_millis(1500)), 1500);
        assert_eq!(millis(Duration::MAX), u64::MAX);
    }
}
