// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types shared across the crate.
//!
//! - [`ChannelId`] - Identifier of one metered circuit
//! - [`ChannelSample`] - An instantaneous power reading for a channel

mod channel_id;
mod sample;

pub use channel_id::ChannelId;
pub use sample::ChannelSample;
