// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The session task.
//!
//! One task per session owns the connection for its whole life. It walks
//! the lifecycle, feeds received bytes through the codec and integrator,
//! and is the only writer of the channel store. Changed channel ids are
//! queued for the dispatcher; handlers never run here.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};

use crate::command::Command;
use crate::error::{Error, HandshakeError, TransportError};
use crate::event::{EventBus, MonitorEvent, SessionId};
use crate::protocol::{Connection, InboundEvent, LineCodec, Received, millis};
use crate::state::ChannelStore;
use crate::subscription::NotificationBus;
use crate::types::{ChannelId, ChannelSample};

use super::{SessionConfig, SessionState};

/// State shared between a monitor and its session task.
#[derive(Debug)]
pub(crate) struct Shared {
    pub id: SessionId,
    pub config: SessionConfig,
    pub store: ChannelStore,
    pub notifications: NotificationBus,
    pub events: EventBus,
    pub state: watch::Sender<SessionState>,
    /// Set once the priming round completes; never cleared.
    pub was_ready: AtomicBool,
}

impl Shared {
    pub fn new(config: SessionConfig) -> Self {
        let (state, _) = watch::channel(SessionState::Disconnected);
        Self {
            id: SessionId::new(),
            config,
            store: ChannelStore::new(),
            notifications: NotificationBus::new(),
            events: EventBus::new(),
            state,
            was_ready: AtomicBool::new(false),
        }
    }

    /// Moves to `state`, publishing the change if it is one.
    pub fn set_state(&self, state: SessionState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
        if !changed {
            return;
        }

        if state == SessionState::Live {
            self.was_ready.store(true, Ordering::Release);
        }
        tracing::debug!(session_id = %self.id, %state, "Session state changed");
        self.events.publish(MonitorEvent::StateChanged {
            session_id: self.id,
            state,
        });
    }
}

/// Resolves once a stop is requested or the monitor is gone.
pub(super) async fn stop_requested(stop: &mut watch::Receiver<bool>) {
    while !*stop.borrow_and_update() {
        if stop.changed().await.is_err() {
            return;
        }
    }
}

/// Runs `fut` unless a stop is requested first.
pub(super) async fn or_stop<F: Future>(stop: &mut watch::Receiver<bool>, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        () = stop_requested(stop) => None,
        output = fut => Some(output),
    }
}

/// Runs one session to completion and returns its outcome.
///
/// The store, the state channel and the buses outlive the task; everything
/// else, including the socket, is released before this returns.
pub(crate) async fn run(
    shared: Arc<Shared>,
    stop: watch::Receiver<bool>,
    changes: mpsc::Sender<ChannelId>,
) -> Result<(), Error> {
    let mut worker = Worker {
        shared: Arc::clone(&shared),
        stop,
        codec: LineCodec::new(),
        changes,
    };

    let outcome = worker.drive().await;
    match &outcome {
        Ok(()) => tracing::info!(session_id = %shared.id, "Session stopped"),
        Err(e) => tracing::error!(session_id = %shared.id, error = %e, "Session failed"),
    }
    shared.set_state(SessionState::Stopped);
    outcome
}

struct Worker {
    shared: Arc<Shared>,
    stop: watch::Receiver<bool>,
    codec: LineCodec,
    changes: mpsc::Sender<ChannelId>,
}

impl Worker {
    fn is_stopping(&self) -> bool {
        *self.stop.borrow()
    }

    async fn drive(&mut self) -> Result<(), Error> {
        if self.is_stopping() {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let config = &shared.config;
        shared.set_state(SessionState::Connecting);

        let open = Connection::open(&config.host, config.port, config.connect_timeout());
        let Some(connection) = or_stop(&mut self.stop, open).await else {
            return Ok(());
        };
        let mut connection = connection?;
        tracing::info!(session_id = %shared.id, address = connection.address(), "Connected");

        let outcome = self.session(&mut connection).await;
        connection.close();
        outcome
    }

    async fn session(&mut self, connection: &mut Connection) -> Result<(), Error> {
        self.shared.set_state(SessionState::Handshaking);

        for command in [Command::StartEvents, Command::SystemInfo] {
            if self.exchange(connection, &command).await?.is_none() {
                return Ok(());
            }
        }

        // Priming replies are drained here; values arrive as push events.
        for channel in self.channel_ids() {
            let command = Command::get_live(channel);
            if self.exchange(connection, &command).await?.is_none() {
                return Ok(());
            }
        }

        self.shared.set_state(SessionState::Live);
        tracing::info!(
            session_id = %self.shared.id,
            channels = self.shared.config.channels.len(),
            "Session live"
        );

        self.live(connection).await
    }

    /// Sends a command and discards one response.
    ///
    /// Returns `None` if a stop was requested meanwhile.
    async fn exchange(
        &mut self,
        connection: &mut Connection,
        command: &Command,
    ) -> Result<Option<()>, HandshakeError> {
        let io_error = |source| HandshakeError::Io {
            command: command.to_string(),
            source,
        };

        match or_stop(&mut self.stop, connection.send(command)).await {
            None => return Ok(None),
            Some(sent) => sent.map_err(io_error)?,
        }

        let timeout = self.shared.config.response_timeout();
        let Some(received) = or_stop(&mut self.stop, connection.receive(timeout)).await else {
            return Ok(None);
        };

        match received.map_err(io_error)? {
            Received::Data(bytes) => {
                tracing::trace!(%command, len = bytes.len(), "Discarded handshake response");
                Ok(Some(()))
            }
            Received::TimedOut => Err(HandshakeError::Timeout {
                command: command.to_string(),
                timeout_ms: millis(timeout),
            }),
            Received::Closed => Err(HandshakeError::Closed {
                command: command.to_string(),
            }),
        }
    }

    /// The steady-state loop.
    ///
    /// Each receive is one read cycle whether or not data arrived. Every
    /// `refresh_every` cycles the live queries are re-sent; their replies
    /// come back through the same loop as push events.
    async fn live(&mut self, connection: &mut Connection) -> Result<(), Error> {
        let poll_interval = self.shared.config.poll_interval();
        let refresh_every = self.shared.config.refresh_every.max(1);
        let mut cycles: u32 = 0;

        loop {
            let Some(received) = or_stop(&mut self.stop, connection.receive(poll_interval)).await
            else {
                return Ok(());
            };

            match received.map_err(TransportError::Io)? {
                Received::Data(bytes) => self.process(&bytes),
                Received::TimedOut => tracing::trace!(session_id = %self.shared.id, "Poll tick"),
                Received::Closed => return Err(TransportError::Closed.into()),
            }

            cycles += 1;
            if cycles >= refresh_every {
                cycles = 0;
                if !self.refresh(connection).await? {
                    return Ok(());
                }
            }
        }
    }

    /// Re-sends a live query for every configured channel.
    ///
    /// Returns `false` if a stop was requested meanwhile.
    async fn refresh(&mut self, connection: &mut Connection) -> Result<bool, TransportError> {
        tracing::trace!(session_id = %self.shared.id, "Refreshing live queries");
        for channel in self.channel_ids() {
            let command = Command::get_live(channel);
            match or_stop(&mut self.stop, connection.send(&command)).await {
                None => return Ok(false),
                Some(sent) => sent?,
            }
        }
        Ok(true)
    }

    /// Decodes received bytes and applies every live sample in them.
    fn process(&mut self, bytes: &[u8]) {
        for message in self.codec.feed(bytes) {
            if self.is_stopping() {
                return;
            }
            match InboundEvent::parse(&message) {
                Ok(InboundEvent::Live(sample)) => self.apply(&sample),
                Ok(InboundEvent::Other) => {}
                Err(e) => tracing::warn!(
                    session_id = %self.shared.id,
                    error = %e,
                    "Dropping malformed event"
                ),
            }
        }
    }

    /// Integrates one sample, then notifies outside the store lock.
    ///
    /// Handler delivery is queued, never awaited. When the queue is full the
    /// notification is dropped; handlers read the latest values on the next one.
    fn apply(&self, sample: &ChannelSample) {
        let state = self.shared.store.record(sample, Utc::now());
        tracing::debug!(
            session_id = %self.shared.id,
            channel = %sample.channel,
            watts = sample.watts,
            energy_kwh = state.energy_kwh,
            "Channel updated"
        );

        match self.changes.try_send(sample.channel.clone()) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(channel)) => tracing::warn!(
                session_id = %self.shared.id,
                %channel,
                "Notification queue full, dropping notification"
            ),
        }
        self.shared.events.publish(MonitorEvent::ChannelUpdated {
            session_id: self.shared.id,
            channel: sample.channel.clone(),
            state,
        });
    }

    fn channel_ids(&self) -> Vec<ChannelId> {
        self.shared.config.channel_ids().cloned().collect()
    }
}
