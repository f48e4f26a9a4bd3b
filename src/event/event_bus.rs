// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Event bus for broadcasting monitor events.

use tokio::sync::broadcast;

use super::MonitorEvent;

/// Default channel capacity for the event bus.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Event bus for broadcasting monitor events to multiple subscribers.
///
/// The `EventBus` uses tokio's broadcast channel so each subscriber gets its
/// own copy of each event and consumes it on its own task. Publishing never
/// blocks the session task.
///
/// # Capacity
///
/// The event bus has a fixed capacity (default 256). A subscriber that falls
/// further behind loses the oldest events and receives
/// `RecvError::Lagged`; it can recover by reading current values from the
/// monitor.
///
/// # Examples
///
/// ```
/// use niko_energy::event::{EventBus, MonitorEvent, SessionId};
/// use niko_energy::session::SessionState;
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(MonitorEvent::StateChanged {
///     session_id: SessionId::new(),
///     state: SessionState::Connecting,
/// });
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<MonitorEvent>,
}

impl EventBus {
    /// Creates a new event bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a new event bus with the specified capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to monitor events.
    ///
    /// Returns a receiver for all events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event to all subscribers.
    ///
    /// If there are no subscribers, the event is silently discarded.
    pub fn publish(&self, event: MonitorEvent) {
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
