// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session-keyed map of monitors.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::event::SessionId;
use crate::session::EnergyMonitor;

/// Map from session id to monitor.
///
/// The lock guards only the map; stopping and joining happen after a
/// monitor has been taken out, so lookups never wait on a session.
#[derive(Debug, Default)]
pub struct MonitorRegistry {
    monitors: RwLock<HashMap<SessionId, Arc<EnergyMonitor>>>,
}

impl MonitorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a monitor under its own session id and returns the id.
    ///
    /// A monitor already registered under the same id is replaced.
    pub fn insert(&self, monitor: Arc<EnergyMonitor>) -> SessionId {
        let session_id = monitor.id();
        if self.monitors.write().insert(session_id, monitor).is_some() {
            tracing::debug!(%session_id, "Replaced registered monitor");
        }
        session_id
    }

    /// Returns the monitor of a session.
    #[must_use]
    pub fn get(&self, session_id: SessionId) -> Option<Arc<EnergyMonitor>> {
        self.monitors.read().get(&session_id).cloned()
    }

    /// Returns `true` if a session is registered.
    #[must_use]
    pub fn contains(&self, session_id: SessionId) -> bool {
        self.monitors.read().contains_key(&session_id)
    }

    /// Returns every registered session id.
    #[must_use]
    pub fn session_ids(&self) -> Vec<SessionId> {
        self.monitors.read().keys().copied().collect()
    }

    /// Returns the number of registered monitors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.monitors.read().len()
    }

    /// Returns `true` if no monitor is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.monitors.read().is_empty()
    }

    /// Unregisters a session, stops it and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns `Error::SessionNotFound` for an unknown id, otherwise the
    /// outcome of [`EnergyMonitor::shutdown`].
    pub async fn remove(&self, session_id: SessionId, timeout: Duration) -> Result<()> {
        let monitor = self
            .monitors
            .write()
            .remove(&session_id)
            .ok_or(Error::SessionNotFound)?;

        tracing::debug!(%session_id, "Removing monitor");
        monitor.shutdown(timeout).await
    }

    /// Stops every registered session and empties the registry.
    ///
    /// All sessions are asked to stop before any is waited on. Failures are
    /// logged and do not prevent the remaining sessions from being joined.
    ///
    /// Returns the number of sessions that ended cleanly.
    pub async fn shutdown_all(&self, timeout: Duration) -> usize {
        let monitors: Vec<_> = self.monitors.write().drain().collect();
        tracing::info!(count = monitors.len(), "Shutting down monitors");

        for (_, monitor) in &monitors {
            monitor.stop();
        }

        let mut clean = 0;
        for (session_id, monitor) in monitors {
            match monitor.join(timeout).await {
                Ok(()) => clean += 1,
                Err(e) => tracing::warn!(%session_id, error = %e, "Session ended with error"),
            }
        }
        clean
    }
}
