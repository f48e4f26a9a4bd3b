// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Line-delimited JSON protocol spoken by the controller.
//!
//! Every message in either direction is one JSON object on its own line.
//! Outbound commands end in `\r\n`; inbound lines may end in either `\n` or
//! `\r\n` and may arrive split across reads or several to a read.
//!
//! - [`LineCodec`] - Reassembles inbound bytes into decoded JSON objects
//! - [`InboundEvent`] - Classifies a decoded object
//! - [`Connection`] - The TCP socket, with bounded connect and receive

mod codec;
mod connection;
mod message;

pub use codec::{LineCodec, MAX_LINE_BYTES};
pub use connection::{Connection, Received};
pub use message::InboundEvent;

pub(crate) use connection::millis;
