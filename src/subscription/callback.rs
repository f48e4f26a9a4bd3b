// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Callback management for channel change notifications.
//!
//! This module provides the core types for managing notification handlers:
//!
//! - [`SubscriptionId`] - Unique identifier for unsubscribing
//! - [`NotificationBus`] - Registry that stores handlers and dispatches changes

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::error::NotificationError;
use crate::types::ChannelId;

/// Unique identifier for a subscription.
///
/// This ID is returned when registering a handler and can be used to
/// unsubscribe later. IDs are unique within a bus's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Creates a new subscription ID with the given value.
    #[must_use]
    pub(crate) fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw ID value.
    #[must_use]
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Sub({})", self.0)
    }
}

/// Type alias for channel change handlers.
type ChannelHandler = Arc<dyn Fn(&ChannelId) + Send + Sync>;

/// Registry of handlers notified whenever a channel's values change.
///
/// Handlers receive only the channel id; they read the new values back from
/// the monitor. Delivery is fire-and-forget: a handler that panics is logged
/// and skipped, the remaining handlers still run, and the panic never
/// reaches the session task.
///
/// Handlers run in registration order. The handler list is cloned out of the
/// lock before dispatch, so a handler may subscribe or unsubscribe without
/// deadlocking.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use niko_energy::subscription::NotificationBus;
/// use niko_energy::types::ChannelId;
///
/// let bus = NotificationBus::new();
/// let count = Arc::new(AtomicU32::new(0));
/// let seen = Arc::clone(&count);
///
/// bus.subscribe(move |_channel| {
///     seen.fetch_add(1, Ordering::SeqCst);
/// });
///
/// bus.notify(&ChannelId::from(1));
/// assert_eq!(count.load(Ordering::SeqCst), 1);
/// ```
pub struct NotificationBus {
    /// Counter for generating unique subscription IDs.
    next_id: AtomicU64,
    /// Registered handlers, ordered by subscription.
    handlers: RwLock<BTreeMap<SubscriptionId, ChannelHandler>>,
}

impl NotificationBus {
    /// Creates a new empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handlers: RwLock::new(BTreeMap::new()),
        }
    }

    /// Generates a new unique subscription ID.
    fn next_id(&self) -> SubscriptionId {
        SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a handler invoked with the id of every changed channel.
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(&ChannelId) + Send + Sync + 'static,
    {
        let id = self.next_id();
        self.handlers.write().insert(id, Arc::new(handler));
        id
    }

    /// Removes a handler.
    ///
    /// Returns `true` if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.handlers.write().remove(&id).is_some()
    }

    /// Removes every handler.
    pub fn clear(&self) {
        self.handlers.write().clear();
    }

    /// Invokes every handler for `channel`.
    ///
    /// Returns the number of handlers that completed without panicking.
    pub fn notify(&self, channel: &ChannelId) -> usize {
        let handlers: Vec<(SubscriptionId, ChannelHandler)> = self
            .handlers
            .read()
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect();

        let mut delivered = 0;
        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(channel))) {
                Ok(()) => delivered += 1,
                Err(payload) => {
                    let err = NotificationError::HandlerPanicked {
                        subscription: id,
                        message: panic_message(payload.as_ref()),
                    };
                    tracing::error!(%channel, error = %err, "Notification handler failed");
                }
            }
        }
        delivered
    }

    /// Returns the number of registered handlers.
    #[must_use]
    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Returns `true` if there are no registered handlers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handler_count() == 0
    }
}

/// Extracts a printable message from a panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for NotificationBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationBus")
            .field("handler_count", &self.handler_count())
            .finish()
    }
}
