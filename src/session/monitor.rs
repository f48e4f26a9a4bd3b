// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The public handle of a monitoring session.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::event::{MonitorEvent, SessionId};
use crate::protocol::millis;
use crate::state::{ChannelState, Reading};
use crate::subscription::SubscriptionId;
use crate::types::ChannelId;

use super::dispatch;
use super::worker::{self, Shared};
use super::{SessionConfig, SessionState};

/// Monitors live power on a controller's channels and integrates energy.
///
/// A monitor owns one session: one TCP connection driven by one background
/// task. Consumers read values with [`current`](Self::current) and
/// [`snapshot`](Self::snapshot), or are told about changes through
/// [`subscribe`](Self::subscribe) and [`events`](Self::events). None of
/// them ever touch the socket.
///
/// Sessions do not reconnect. When one ends, create a new monitor.
///
/// Dropping the monitor stops its session.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use niko_energy::{EnergyMonitor, SessionConfig};
/// use niko_energy::types::ChannelId;
///
/// # async fn example() -> niko_energy::Result<()> {
/// let config = SessionConfig::builder()
///     .host("192.168.3.40")
///     .channel(1, "Oven")
///     .build()?;
///
/// let monitor = EnergyMonitor::new(config);
/// monitor.start()?;
/// monitor.wait_ready().await?;
///
/// if let Some(reading) = monitor.current(&ChannelId::from(1)) {
///     println!("{} W, {} kWh", reading.power_watts, reading.energy_kwh);
/// }
///
/// monitor.stop();
/// monitor.join(Duration::from_secs(5)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct EnergyMonitor {
    shared: Arc<Shared>,
    stop: watch::Sender<bool>,
    handle: Mutex<Option<JoinHandle<Result<()>>>>,
    started: AtomicBool,
}

impl EnergyMonitor {
    /// Creates a monitor. Nothing connects until [`start`](Self::start).
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared::new(config)),
            stop,
            handle: Mutex::new(None),
            started: AtomicBool::new(false),
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.shared.id
    }

    /// Returns the session configuration.
    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.shared.config
    }

    /// Starts the session on the current tokio runtime and returns at once.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid,
    /// `Error::AlreadyStarted` on a second call, and `Error::Worker` when
    /// called outside a tokio runtime.
    pub fn start(&self) -> Result<()> {
        self.shared.config.validate()?;

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::Worker(e.to_string()))?;

        if self.started.swap(true, Ordering::AcqRel) {
            return Err(Error::AlreadyStarted);
        }

        tracing::info!(
            session_id = %self.shared.id,
            host = %self.shared.config.host,
            port = self.shared.config.port,
            "Starting session"
        );

        let (changes, queued) = mpsc::channel(dispatch::QUEUE_CAPACITY);
        let dispatcher = runtime.spawn(dispatch::run(
            Arc::clone(&self.shared),
            self.stop.subscribe(),
            queued,
        ));

        let session = worker::run(Arc::clone(&self.shared), self.stop.subscribe(), changes);
        let session_id = self.shared.id;
        let task = async move {
            let outcome = session.await;
            if let Err(e) = dispatcher.await {
                tracing::error!(%session_id, error = %e, "Notification dispatcher failed");
            }
            outcome
        };
        *self.handle.lock() = Some(runtime.spawn(task));
        Ok(())
    }

    /// Waits until the priming round has completed.
    ///
    /// Resolves immediately if the session already went live, even if it
    /// has stopped since. Does not resolve before [`start`](Self::start) or
    /// [`stop`](Self::stop) is called.
    ///
    /// # Errors
    ///
    /// Returns `Error::StoppedBeforeReady` if the session stopped first.
    /// The cause is reported by [`join`](Self::join).
    pub async fn wait_ready(&self) -> Result<()> {
        let mut state = self.shared.state.subscribe();
        let reached = state
            .wait_for(|s| matches!(s, SessionState::Live | SessionState::Stopped))
            .await
            .map(|s| *s)
            .map_err(|_| Error::StoppedBeforeReady)?;

        if reached == SessionState::Live || self.shared.was_ready.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::StoppedBeforeReady)
        }
    }

    /// Returns `true` once the priming round has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.shared.was_ready.load(Ordering::Acquire)
    }

    /// Returns the current power and energy of a channel.
    ///
    /// `None` until the channel produces its first sample.
    #[must_use]
    pub fn current(&self, channel: &ChannelId) -> Option<Reading> {
        self.shared.store.get(channel).map(|s| s.reading())
    }

    /// Returns the full state of a channel, including its last sample time.
    #[must_use]
    pub fn channel_state(&self, channel: &ChannelId) -> Option<ChannelState> {
        self.shared.store.get(channel)
    }

    /// Returns a copy of every channel's state.
    #[must_use]
    pub fn snapshot(&self) -> HashMap<ChannelId, ChannelState> {
        self.shared.store.snapshot()
    }

    /// Registers a handler called with the id of every changed channel.
    ///
    /// Handlers run in order on tokio's blocking pool, never on the session
    /// task, so a slow handler delays later notifications but not the
    /// session. Read the new values back with [`current`](Self::current).
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ChannelId) + Send + Sync + 'static,
    {
        self.shared.notifications.subscribe(handler)
    }

    /// Removes a handler. Returns `true` if it was registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.shared.notifications.unsubscribe(id)
    }

    /// Returns a receiver of lifecycle and channel events.
    ///
    /// Only events published after this call are received.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<MonitorEvent> {
        self.shared.events.subscribe()
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.shared.state.borrow()
    }

    /// Returns a receiver that observes lifecycle changes.
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Returns `true` while the session task is working.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    /// Requests the session to stop.
    ///
    /// Returns immediately. A pending receive is abandoned and the socket is
    /// shut down by the session task. Safe to call any number of times,
    /// from any thread, including after the session failed on its own.
    pub fn stop(&self) {
        if self.stop.send_replace(true) {
            return;
        }
        tracing::debug!(session_id = %self.shared.id, "Stop requested");

        if !self.started.load(Ordering::Acquire) {
            self.shared.set_state(SessionState::Stopped);
        }
    }

    /// Waits up to `timeout` for the session task to finish.
    ///
    /// The first successful call returns the session's outcome; later calls,
    /// and calls on a monitor that never started, return `Ok(())`. Once this
    /// returns without `JoinTimeout`, the store is no longer written and no
    /// handler starts again. A handler already running when
    /// [`stop`](Self::stop) was called may still be finishing.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the session, `Error::JoinTimeout` if the
    /// task is still running (a later call may retry), or `Error::Worker` if
    /// the task panicked.
    pub async fn join(&self, timeout: Duration) -> Result<()> {
        let Some(mut handle) = self.handle.lock().take() else {
            return Ok(());
        };

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => Err(Error::Worker(e.to_string())),
            Err(_) => {
                *self.handle.lock() = Some(handle);
                Err(Error::JoinTimeout(millis(timeout)))
            }
        }
    }

    /// Stops the session and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Same as [`join`](Self::join).
    pub async fn shutdown(&self, timeout: Duration) -> Result<()> {
        self.stop();
        self.join(timeout).await
    }
}
