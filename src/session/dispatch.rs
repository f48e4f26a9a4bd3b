// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notification delivery.
//!
//! The session task queues the id of every changed channel. This task takes
//! them in order and runs the registered handlers for each on the blocking
//! pool, so a slow handler holds up neither the socket nor the runtime.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use crate::types::ChannelId;

use super::worker::{Shared, or_stop};

/// Capacity of the queue between the session task and the dispatcher.
pub(crate) const QUEUE_CAPACITY: usize = 1024;

/// Delivers queued changes until the session ends or a stop is requested.
///
/// Queued changes are delivered after the session ends on its own, but not
/// after a stop. A handler still running when the stop arrives is left to
/// finish on the blocking pool; no handler starts after that.
pub(crate) async fn run(
    shared: Arc<Shared>,
    mut stop: watch::Receiver<bool>,
    mut changes: mpsc::Receiver<ChannelId>,
) {
    while let Some(Some(channel)) = or_stop(&mut stop, changes.recv()).await {
        let delivery = {
            let shared = Arc::clone(&shared);
            let stop = stop.clone();
            tokio::task::spawn_blocking(move || {
                if *stop.borrow() {
                    return 0;
                }
                shared.notifications.notify(&channel)
            })
        };

        match or_stop(&mut stop, delivery).await {
            None => {
                tracing::debug!(session_id = %shared.id, "Stop requested during delivery");
                break;
            }
            Some(Ok(delivered)) => {
                tracing::trace!(session_id = %shared.id, delivered, "Notification delivered");
            }
            Some(Err(e)) => {
                tracing::error!(session_id = %shared.id, error = %e, "Notification delivery failed");
            }
        }
    }
}
