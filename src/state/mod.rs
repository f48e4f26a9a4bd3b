// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel state tracking.
//!
//! - [`ChannelState`] - Power, accumulated energy and last sample time of one channel
//! - [`Reading`] - The power/energy pair handed to consumers
//! - [`ChannelStore`] - Thread-safe map of channel states
//!
//! The session task is the only writer of a [`ChannelStore`]; any number of
//! consumers may read it concurrently.

mod channel_state;
mod store;

pub use channel_state::{ChannelState, Reading};
pub use store::ChannelStore;
